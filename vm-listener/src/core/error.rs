use shared::{ObjectRef, VolumePath};
use std::time::Duration;
use thiserror::Error;

use crate::collector::CollectorError;
use crate::volume::StatusError;

#[derive(Error, Debug)]
pub enum ListenerError {
    /// 订阅服务拒绝了过滤器，监听循环不会启动
    #[error("Problem creating PropertyCollector filter: {0}")]
    FilterRegistration(#[source] CollectorError),

    #[error("Traversal references undefined selectors: {0:?}")]
    InvalidTraversal(Vec<String>),

    #[error("Failed to release PropertyCollector filter: {0}")]
    FilterRelease(#[source] CollectorError),

    #[error("Poll failed: {0}")]
    Poll(#[source] CollectorError),

    #[error("Failed to read configuration of {vm}: {source}")]
    Inventory {
        vm: ObjectRef,
        #[source]
        source: CollectorError,
    },

    #[error("Failed to set detach status for {path}: {source}")]
    StatusUpdate {
        path: VolumePath,
        #[source]
        source: StatusError,
    },

    #[error("Background tasks did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, ListenerError>;
