//! 虚拟硬件设备与卷路径

use serde::{Deserialize, Serialize};
use std::fmt;

/// 虚拟设备描述 (只保留卷识别需要的字段)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDevice {
    /// 设备在虚拟机内唯一的 key
    pub key: i32,
    /// 设备类型名 (VirtualDisk, VirtualE1000 ...)
    pub type_name: String,
    pub label: Option<String>,
    /// 文件后端路径 (例如 `[datastore1] dockvols/vol1.vmdk`)
    pub backing_file: Option<String>,
}

impl VirtualDevice {
    pub fn is_disk(&self) -> bool {
        self.type_name == "VirtualDisk"
    }
}

/// 虚拟机配置摘要
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfigSummary {
    pub name: String,
    /// 设备列表；缺失时为空
    pub devices: Vec<VirtualDevice>,
}

/// 受管卷的标识路径 (VMDK 路径)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumePath(String);

impl VolumePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
