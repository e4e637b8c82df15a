//! 虚拟机电源状态监听器
//!
//! [`VmChangeListener::start`] 注册过滤器并启动后台轮询任务，
//! 返回的 [`ListenerHandle`] 负责关闭任务并释放过滤器。

mod guard;
mod watch;

pub use guard::FilterGuard;
pub use watch::WatchLoop;

use shared::ObjectRef;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::DropGuard;

use crate::collector::{PropertyCollector, VmInventory};
use crate::core::{BackgroundTasks, Config, ListenerError, Result};
use crate::filter::power_state_filter;
use crate::volume::{DeviceClassifier, VolumeStatusStore};

const TASK_NAME: &str = "vm_change_listener";

pub struct VmChangeListener {
    collector: Arc<dyn PropertyCollector>,
    inventory: Arc<dyn VmInventory>,
    classifier: Arc<dyn DeviceClassifier>,
    store: Arc<dyn VolumeStatusStore>,
    config: Config,
}

impl VmChangeListener {
    pub fn new(
        collector: Arc<dyn PropertyCollector>,
        inventory: Arc<dyn VmInventory>,
        classifier: Arc<dyn DeviceClassifier>,
        store: Arc<dyn VolumeStatusStore>,
    ) -> Self {
        Self {
            collector,
            inventory,
            classifier,
            store,
            config: Config::default(),
        }
    }

    /// 使用同一个会话同时作为属性收集器和清单
    pub fn for_session<S>(
        session: Arc<S>,
        classifier: Arc<dyn DeviceClassifier>,
        store: Arc<dyn VolumeStatusStore>,
    ) -> Self
    where
        S: PropertyCollector + VmInventory + 'static,
    {
        Self::new(session.clone(), session, classifier, store)
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// 注册电源状态过滤器并启动后台轮询任务
    ///
    /// 注册失败时返回错误，轮询任务不会启动。调用方不会被轮询阻塞。
    pub async fn start(self, root: ObjectRef) -> Result<ListenerHandle> {
        let filter = power_state_filter(root);

        let unresolved = filter.traversal.unresolved();
        if !unresolved.is_empty() {
            return Err(ListenerError::InvalidTraversal(
                unresolved.into_iter().map(str::to_string).collect(),
            ));
        }

        let filter_ref = match self.collector.create_filter(&filter, true).await {
            Ok(filter_ref) => filter_ref,
            Err(e) => {
                let err = ListenerError::FilterRegistration(e);
                tracing::error!("{err}");
                return Err(err);
            }
        };
        tracing::info!(filter = %filter_ref, root = %filter.traversal.root, "Registered VM power state filter");

        let guard = FilterGuard::new(self.collector.clone(), filter_ref);

        let watch = WatchLoop::new(self.collector, self.inventory, self.classifier, self.store)
            .with_poll_error_backoff(self.config.poll_error_backoff());

        let mut tasks = BackgroundTasks::new();
        let shutdown = tasks.shutdown_token();
        tasks.spawn(TASK_NAME, async move {
            watch.run(shutdown).await;
        });

        Ok(ListenerHandle {
            stop_on_drop: tasks.shutdown_token().drop_guard(),
            tasks,
            guard,
            shutdown_timeout: self.config.shutdown_timeout(),
        })
    }
}

/// 运行中的监听器
///
/// drop 而不调用 [`ListenerHandle::shutdown`] 时，轮询任务被取消，
/// 过滤器在当前 runtime 上尽力释放；两者总是一起结束。
pub struct ListenerHandle {
    // 先于 guard drop：任务先停，再释放过滤器
    stop_on_drop: DropGuard,
    tasks: BackgroundTasks,
    guard: FilterGuard,
    shutdown_timeout: Duration,
}

impl ListenerHandle {
    /// 已注册的服务端过滤器
    pub fn filter(&self) -> Option<&ObjectRef> {
        self.guard.filter()
    }

    /// 后台轮询任务是否仍在运行
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.finished_count() == 0
    }

    /// 停止轮询任务并释放过滤器
    ///
    /// 即使任务未能在超时内停止，过滤器也会被释放。
    pub async fn shutdown(self) -> Result<()> {
        let ListenerHandle {
            stop_on_drop: _stop_on_drop,
            tasks,
            mut guard,
            shutdown_timeout,
        } = self;

        let stopped = tasks.shutdown(shutdown_timeout).await;
        let released = guard.release().await;
        stopped.and(released)
    }

    /// 等待 Ctrl-C 后关闭
    pub async fn shutdown_on_ctrl_c(self) -> Result<()> {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
        self.shutdown().await
    }
}
