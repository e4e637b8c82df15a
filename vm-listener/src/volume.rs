//! 卷识别与卷状态存储接口
//!
//! 卷的挂载记录和状态存储属于外部卷管理模块，这里只定义调用约定。

use async_trait::async_trait;
use shared::{VirtualDevice, VolumePath};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Volume not found: {0}")]
    NotFound(String),

    #[error("Status store unavailable: {0}")]
    Unavailable(String),
}

/// 设备分类：判断硬件设备是否对应受管卷
pub trait DeviceClassifier: Send + Sync {
    /// 返回受管卷路径；非受管设备返回 `None`
    fn find_volume(&self, device: &VirtualDevice) -> Option<VolumePath>;
}

/// 卷状态存储
#[async_trait]
pub trait VolumeStatusStore: Send + Sync {
    /// 将卷标记为已分离
    async fn set_detached(&self, path: &VolumePath) -> Result<(), StatusError>;
}

/// 按后端文件所在目录识别受管卷
///
/// 受管卷是后端文件位于 `<datastore>/<volume_dir>/` 下的虚拟磁盘，
/// 例如 `[datastore1] dockvols/vol1.vmdk`。
#[derive(Debug, Clone)]
pub struct VolumeDirClassifier {
    volume_dir: String,
}

impl VolumeDirClassifier {
    pub fn new(volume_dir: impl Into<String>) -> Self {
        Self {
            volume_dir: volume_dir.into(),
        }
    }
}

impl DeviceClassifier for VolumeDirClassifier {
    fn find_volume(&self, device: &VirtualDevice) -> Option<VolumePath> {
        if !device.is_disk() {
            return None;
        }
        let file = device.backing_file.as_deref()?;
        // "[datastore] dir/sub/file.vmdk" -> "dir/sub/file.vmdk"
        let relative = match file.split_once("] ") {
            Some((_, rest)) => rest,
            None => file,
        };
        let managed = relative
            .split('/')
            .rev()
            .skip(1)
            .any(|segment| segment == self.volume_dir);
        managed.then(|| VolumePath::new(file))
    }
}
