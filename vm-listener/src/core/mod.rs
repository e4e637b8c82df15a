//! 核心模块 - 配置、错误定义和后台任务
//!
//! # 模块结构
//!
//! - [`Config`] - 监听器配置
//! - [`ListenerError`] - 监听器错误
//! - [`BackgroundTasks`] - 后台任务管理

pub mod config;
pub mod error;
pub mod tasks;

pub use config::Config;
pub use error::{ListenerError, Result};
pub use tasks::BackgroundTasks;
