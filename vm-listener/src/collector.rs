//! 属性收集器与虚拟机清单接口
//!
//! 监听器只依赖这两个 trait；具体平台的实现见 [`crate::vsphere`]。

use async_trait::async_trait;
use shared::{ModelError, ObjectRef, UpdateBatch, UpdateVersion, VmConfigSummary, WatchFilter};
use thiserror::Error;

/// 与传输无关的协作方错误
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 会话不可用 (未登录、过期或连接失败)
    #[error("Session unavailable: {0}")]
    Unavailable(String),

    /// 请求被服务端拒绝
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 对象不存在
    #[error("Object not found: {0}")]
    NotFound(String),

    /// 服务端返回了无法解析的数据
    #[error("Malformed update: {0}")]
    Malformed(String),

    /// 其他服务端故障
    #[error("Server fault: {0}")]
    Fault(String),
}

impl From<ModelError> for CollectorError {
    fn from(err: ModelError) -> Self {
        CollectorError::Malformed(err.to_string())
    }
}

/// 通知订阅服务
#[async_trait]
pub trait PropertyCollector: Send + Sync {
    /// 注册服务端过滤器，返回过滤器句柄
    async fn create_filter(
        &self,
        filter: &WatchFilter,
        partial_updates: bool,
    ) -> Result<ObjectRef, CollectorError>;

    /// 释放过滤器
    async fn destroy_filter(&self, filter: &ObjectRef) -> Result<(), CollectorError>;

    /// 阻塞等待自 `version` 以来的变更
    ///
    /// 服务端等待超时且无变更时返回 `None`。
    async fn wait_for_updates(
        &self,
        version: &UpdateVersion,
    ) -> Result<Option<UpdateBatch>, CollectorError>;
}

/// 虚拟机清单查询
#[async_trait]
pub trait VmInventory: Send + Sync {
    /// 读取虚拟机名称和挂载的硬件设备
    async fn vm_config(&self, vm: &ObjectRef) -> Result<VmConfigSummary, CollectorError>;
}
