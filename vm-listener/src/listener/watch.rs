//! 长轮询循环
//!
//! 游标只由本循环持有；每次轮询结果处理完 (无论成功与否) 都用结果中的
//! version 推进游标。

use shared::{ObjectUpdate, UpdateBatch, UpdateKind, UpdateVersion, VirtualDevice};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::collector::{PropertyCollector, VmInventory};
use crate::core::{ListenerError, Result};
use crate::filter::is_power_off;
use crate::volume::{DeviceClassifier, VolumeStatusStore};

pub struct WatchLoop {
    collector: Arc<dyn PropertyCollector>,
    inventory: Arc<dyn VmInventory>,
    classifier: Arc<dyn DeviceClassifier>,
    store: Arc<dyn VolumeStatusStore>,
    poll_error_backoff: Duration,
}

impl WatchLoop {
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
            poll_error_backoff: Duration::ZERO,
        }
    }

    /// 轮询调用失败后的等待时间
    pub fn with_poll_error_backoff(mut self, backoff: Duration) -> Self {
        self.poll_error_backoff = backoff;
        self
    }

    /// 运行直到 `shutdown` 被取消，返回最后的游标
    pub async fn run(self, shutdown: CancellationToken) -> UpdateVersion {
        tracing::info!("VMChangeListener task started");
        let mut version = UpdateVersion::initial();

        loop {
            let polled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                polled = self.collector.wait_for_updates(&version) => polled,
            };

            match polled {
                Ok(Some(batch)) => {
                    if let Err(e) = self.process_batch(&batch).await {
                        tracing::error!(version = %batch.version, "VMChangeListener: error {e}");
                    }
                    version = batch.version;
                }
                Ok(None) => {
                    tracing::trace!(version = %version, "No updates within wait window");
                }
                Err(e) => {
                    let err = ListenerError::Poll(e);
                    tracing::error!(version = %version, "VMChangeListener: {err}");
                    if !self.poll_error_backoff.is_zero() {
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(self.poll_error_backoff) => {}
                        }
                    }
                }
            }
        }

        tracing::info!("VMChangeListener task exiting");
        version
    }

    /// 处理一次轮询结果，返回被标记为 detached 的卷数量
    ///
    /// 第一个错误会中止本批次剩余的处理。
    pub async fn process_batch(&self, batch: &UpdateBatch) -> Result<usize> {
        let mut detached = 0;
        for object in batch.objects() {
            detached += self.process_object(object).await?;
        }
        Ok(detached)
    }

    async fn process_object(&self, object: &ObjectUpdate) -> Result<usize> {
        if object.kind != UpdateKind::Modify {
            return Ok(0);
        }

        let mut detached = 0;
        for change in &object.changes {
            if !is_power_off(&change.name, change.text_value()) {
                continue;
            }

            let Some(vm) = &object.obj else {
                tracing::error!("Could not retrieve the managed object");
                return Ok(detached);
            };

            let config = self
                .inventory
                .vm_config(vm)
                .await
                .map_err(|source| ListenerError::Inventory {
                    vm: vm.clone(),
                    source,
                })?;

            tracing::info!(vm = %vm, "VM poweroff change found for {}", config.name);
            detached += self.set_devices_detached(&config.devices).await?;
        }
        Ok(detached)
    }

    async fn set_devices_detached(&self, devices: &[VirtualDevice]) -> Result<usize> {
        let mut detached = 0;
        for device in devices {
            let Some(path) = self.classifier.find_volume(device) else {
                continue;
            };
            tracing::info!(path = %path, "Setting detach status for {path}");
            self.store
                .set_detached(&path)
                .await
                .map_err(|source| ListenerError::StatusUpdate {
                    path: path.clone(),
                    source,
                })?;
            detached += 1;
        }
        Ok(detached)
    }
}
