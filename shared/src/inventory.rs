//! 清单遍历模型
//!
//! 描述"从哪个根对象出发、沿哪些属性递归、关注哪些属性"，
//! 与具体管理平台的类型无关。平台相关的翻译只在集成边界完成。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// 受管对象引用 (例如 `VirtualMachine:vm-42`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// 对象类型 (VirtualMachine, Folder, Datacenter ...)
    pub kind: String,
    /// 服务端分配的对象 ID
    pub id: String,
}

impl ObjectRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// 是否为指定类型的对象
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ObjectRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(ModelError::MalformedObjectRef(s.to_string())),
        }
    }
}

/// 子节点选择器
///
/// 从 `from_kind` 类型的对象出发，沿 `path` 属性走到子对象，
/// 然后继续应用 `then` 中按名称引用的选择器 (可以引用自身形成递归)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSelector {
    pub name: String,
    pub from_kind: String,
    pub path: String,
    /// 是否跳过中间对象本身 (只报告其子对象)
    pub skip: bool,
    pub then: Vec<String>,
}

impl ChildSelector {
    pub fn new(
        name: impl Into<String>,
        from_kind: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_kind: from_kind.into(),
            path: path.into(),
            skip: false,
            then: Vec::new(),
        }
    }

    /// Continue traversal with the named selector
    pub fn then(mut self, selector: impl Into<String>) -> Self {
        self.then.push(selector.into());
        self
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }
}

/// 清单遍历配置：根节点 + 递归子选择器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTraversal {
    pub root: ObjectRef,
    pub selectors: Vec<ChildSelector>,
}

impl InventoryTraversal {
    pub fn new(root: ObjectRef) -> Self {
        Self {
            root,
            selectors: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: ChildSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    /// 按名称查找选择器
    pub fn selector(&self, name: &str) -> Option<&ChildSelector> {
        self.selectors.iter().find(|s| s.name == name)
    }

    /// 返回 `then` 中引用但未定义的选择器名称
    pub fn unresolved(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .selectors
            .iter()
            .flat_map(|s| s.then.iter())
            .map(String::as_str)
            .filter(|name| self.selector(name).is_none())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

/// 关注的属性集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInterest {
    pub object_kind: String,
    pub paths: Vec<String>,
}

impl PropertyInterest {
    pub fn new(object_kind: impl Into<String>) -> Self {
        Self {
            object_kind: object_kind.into(),
            paths: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }
}

/// 服务端过滤器描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchFilter {
    pub traversal: InventoryTraversal,
    pub interests: Vec<PropertyInterest>,
}
