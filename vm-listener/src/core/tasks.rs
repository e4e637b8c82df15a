//! 监听任务的生命周期
//!
//! 所有任务共享一个取消令牌；panic 被捕获并记录，不会带走 runtime。

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{ListenerError, Result};

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// 一组共享取消令牌的后台任务
///
/// # 使用示例
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// let token = tasks.shutdown_token();
///
/// tasks.spawn("vm_change_listener", async move {
///     watch.run(token).await;
/// });
///
/// // Graceful shutdown
/// tasks.shutdown(Duration::from_secs(5)).await?;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 任务内部用来感知关闭的令牌
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 启动任务；panic 和意外退出都会记录日志
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let wrapped_future = async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if shutdown.is_cancelled() => {
                    tracing::debug!(task = %name, "Background task stopped");
                }
                Ok(()) => {
                    tracing::warn!(task = %name, "Background task completed unexpectedly");
                }
                Err(payload) => {
                    tracing::error!(task = %name, panic = %panic_message(payload.as_ref()), "Background task panicked");
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, "Registered background task");
        self.tasks.push(RegisteredTask { name, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 返回已经结束的任务数量 (正常运行时应为 0)
    pub fn finished_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.handle.is_finished()).count()
    }

    /// Graceful shutdown - 取消所有任务并在超时内等待完成
    ///
    /// 超时未结束的任务会被 abort。
    pub async fn shutdown(self, timeout: Duration) -> Result<()> {
        tracing::info!(count = self.tasks.len(), "Stopping background tasks");

        self.shutdown.cancel();

        let deadline = tokio::time::Instant::now() + timeout;
        let mut timed_out = false;

        for task in self.tasks {
            let abort = task.handle.abort_handle();
            match tokio::time::timeout_at(deadline, task.handle).await {
                Ok(Ok(())) => {
                    tracing::debug!(task = %task.name, "Task joined");
                }
                Ok(Err(e)) if e.is_cancelled() => {
                    tracing::debug!(task = %task.name, "Task aborted");
                }
                Ok(Err(e)) => {
                    tracing::error!(task = %task.name, error = ?e, "Task join failed");
                }
                Err(_) => {
                    tracing::error!(task = %task.name, "Task did not stop in time, aborting");
                    abort.abort();
                    timed_out = true;
                }
            }
        }

        if timed_out {
            return Err(ListenerError::ShutdownTimeout(timeout));
        }

        tracing::info!("Background tasks stopped");
        Ok(())
    }
}

/// panic 负载中的文本
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Unknown panic")
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
