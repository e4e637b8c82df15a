//! Error types for the shared crate

use thiserror::Error;

/// 模型解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// 未知的电源状态
    #[error("Unknown power state: {0}")]
    UnknownPowerState(String),

    /// 对象引用格式错误 (期望 `Kind:id`)
    #[error("Malformed object reference: {0}")]
    MalformedObjectRef(String),

    /// 未知的更新类型
    #[error("Unknown update kind: {0}")]
    UnknownUpdateKind(String),

    /// 未知的属性变更操作
    #[error("Unknown change op: {0}")]
    UnknownChangeOp(String),
}

/// Result type for model conversions
pub type ModelResult<T> = Result<T, ModelError>;
