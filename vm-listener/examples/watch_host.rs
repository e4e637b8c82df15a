//! Watch a host for VM power-off and log the volumes that would be detached
//!
//! Run: VIM_URL=https://esx01.lab VIM_USERNAME=root VIM_PASSWORD=... \
//!      VIM_INSECURE=true cargo run --example watch_host

use async_trait::async_trait;
use shared::VolumePath;
use std::sync::Arc;
use vim_client::VimConfig;
use vm_listener::{
    StatusError, VmChangeListener, VolumeDirClassifier, VolumeStatusStore, VsphereSession,
};

/// 只打印日志的状态存储
struct LoggingStore;

#[async_trait]
impl VolumeStatusStore for LoggingStore {
    async fn set_detached(&self, path: &VolumePath) -> Result<(), StatusError> {
        tracing::info!(path = %path, "Volume marked detached");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = vm_listener::setup_environment();

    let session = VsphereSession::connect(&VimConfig::from_env())
        .await?
        .with_wait_max_seconds(config.wait_max_seconds);
    let root = session.root_folder();
    let session = Arc::new(session);

    let handle = VmChangeListener::for_session(
        session.clone(),
        Arc::new(VolumeDirClassifier::new(config.volume_dir.clone())),
        Arc::new(LoggingStore),
    )
    .with_config(config)
    .start(root)
    .await?;

    tracing::info!("Watching for VM power-off, press Ctrl-C to stop");
    let stopped = handle.shutdown_on_ctrl_c().await;
    session.logout().await?;
    stopped?;
    Ok(())
}
