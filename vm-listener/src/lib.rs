//! VM Listener - 虚拟机电源状态监听器
//!
//! # 架构概述
//!
//! 在管理平台上注册只关注 `runtime.powerState` 的属性过滤器，
//! 由后台任务长轮询变更通知；当虚拟机关机时，把其挂载的受管卷
//! 标记为已分离 (detached)。
//!
//! # 模块结构
//!
//! ```text
//! vm-listener/src/
//! ├── core/          # 配置、错误、后台任务
//! ├── collector.rs   # 属性收集器 / 清单 trait
//! ├── volume.rs      # 卷识别与状态存储 trait
//! ├── filter.rs      # 电源状态过滤器构造
//! ├── listener/      # 监听器、过滤器守卫、轮询循环
//! ├── vsphere/       # 平台 JSON API 适配 (集成边界)
//! └── utils/         # 日志
//! ```

pub mod collector;
pub mod core;
pub mod filter;
pub mod listener;
pub mod utils;
pub mod volume;
pub mod vsphere;

// Re-export 公共类型
pub use collector::{CollectorError, PropertyCollector, VmInventory};
pub use crate::core::{BackgroundTasks, Config, ListenerError, Result};
pub use listener::{FilterGuard, ListenerHandle, VmChangeListener, WatchLoop};
pub use volume::{DeviceClassifier, StatusError, VolumeDirClassifier, VolumeStatusStore};
pub use vsphere::VsphereSession;

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境：加载 `.env` 并初始化日志
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(config.log_level.as_str()), config.log_dir.as_deref());
    config
}
