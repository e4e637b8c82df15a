//! 服务端过滤器的作用域持有
//!
//! 过滤器在注册成功后由 [`FilterGuard`] 持有，只释放一次：
//! 显式调用 [`FilterGuard::release`]，或在 drop 时尽力在当前 runtime 上释放。

use shared::ObjectRef;
use std::sync::Arc;

use crate::collector::PropertyCollector;
use crate::core::{ListenerError, Result};

pub struct FilterGuard {
    collector: Arc<dyn PropertyCollector>,
    filter: Option<ObjectRef>,
}

impl FilterGuard {
    pub fn new(collector: Arc<dyn PropertyCollector>, filter: ObjectRef) -> Self {
        Self {
            collector,
            filter: Some(filter),
        }
    }

    /// 尚未释放的过滤器
    pub fn filter(&self) -> Option<&ObjectRef> {
        self.filter.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.filter.is_none()
    }

    /// 释放过滤器；重复调用是空操作
    pub async fn release(&mut self) -> Result<()> {
        let Some(filter) = self.filter.take() else {
            return Ok(());
        };
        self.collector
            .destroy_filter(&filter)
            .await
            .map_err(ListenerError::FilterRelease)?;
        tracing::info!(filter = %filter, "PropertyCollector filter released");
        Ok(())
    }
}

impl Drop for FilterGuard {
    fn drop(&mut self) {
        let Some(filter) = self.filter.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let collector = self.collector.clone();
                handle.spawn(async move {
                    if let Err(e) = collector.destroy_filter(&filter).await {
                        tracing::warn!(filter = %filter, "Failed to release PropertyCollector filter: {e}");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(filter = %filter, "No runtime available, PropertyCollector filter left registered");
            }
        }
    }
}
