//! 属性变更通知模型
//!
//! 一次长轮询返回一个 [`UpdateBatch`]：
//! batch → filters → objects → changes。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::inventory::ObjectRef;

/// 长轮询游标
///
/// 不透明的续传标记，由每次轮询返回，原样传回下一次轮询。
/// 初始值为空字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateVersion(String);

impl UpdateVersion {
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_initial(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UpdateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UpdateVersion {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UpdateVersion {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 对象更新类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// 对象进入过滤结果集
    Enter,
    /// 对象属性被修改
    Modify,
    /// 对象离开过滤结果集
    Leave,
}

impl FromStr for UpdateKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(UpdateKind::Enter),
            "modify" => Ok(UpdateKind::Modify),
            "leave" => Ok(UpdateKind::Leave),
            other => Err(ModelError::UnknownUpdateKind(other.to_string())),
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::Enter => write!(f, "enter"),
            UpdateKind::Modify => write!(f, "modify"),
            UpdateKind::Leave => write!(f, "leave"),
        }
    }
}

/// 属性变更操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeOp {
    Add,
    Remove,
    Assign,
    IndirectRemove,
}

impl FromStr for ChangeOp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ChangeOp::Add),
            "remove" => Ok(ChangeOp::Remove),
            "assign" => Ok(ChangeOp::Assign),
            "indirectRemove" => Ok(ChangeOp::IndirectRemove),
            other => Err(ModelError::UnknownChangeOp(other.to_string())),
        }
    }
}

/// 属性新值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// 字符串或枚举值 (例如 `poweredOff`)
    Text(String),
    Bool(bool),
    Int(i64),
    /// 其他复杂数据对象，保持原始 JSON
    Opaque(serde_json::Value),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// 单个属性变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// 属性路径 (例如 `runtime.powerState`)
    pub name: String,
    pub op: ChangeOp,
    pub value: Option<PropertyValue>,
}

impl PropertyChange {
    pub fn assign(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            op: ChangeOp::Assign,
            value: Some(value),
        }
    }

    /// 新值的文本形式 (非文本值返回 None)
    pub fn text_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(PropertyValue::as_text)
    }
}

/// 单个对象的更新
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectUpdate {
    pub kind: UpdateKind,
    /// 被更新的对象；服务端异常时可能缺失
    pub obj: Option<ObjectRef>,
    pub changes: Vec<PropertyChange>,
}

/// 单个过滤器匹配到的对象更新
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterUpdate {
    /// 产生此更新的过滤器
    pub filter: Option<ObjectRef>,
    pub objects: Vec<ObjectUpdate>,
}

/// 一次长轮询的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch {
    /// 下一次轮询使用的游标
    pub version: UpdateVersion,
    pub filters: Vec<FilterUpdate>,
}

impl UpdateBatch {
    /// 遍历所有过滤器下的对象更新
    pub fn objects(&self) -> impl Iterator<Item = &ObjectUpdate> {
        self.filters.iter().flat_map(|f| f.objects.iter())
    }
}
