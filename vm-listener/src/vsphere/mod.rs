//! 平台 JSON API 适配 (集成边界)
//!
//! [`VsphereSession`] 用 `vim-client` 实现 [`PropertyCollector`] 和
//! [`VmInventory`]，中立模型与 wire 类型的转换只发生在这里。

pub mod convert;

use async_trait::async_trait;
use shared::{ObjectRef, UpdateBatch, UpdateVersion, VmConfigSummary, WatchFilter};
use vim_client::{VimClient, VimConfig, VimError};

use crate::collector::{CollectorError, PropertyCollector, VmInventory};

impl From<VimError> for CollectorError {
    fn from(err: VimError) -> Self {
        match err {
            VimError::Http(e) => CollectorError::Unavailable(e.to_string()),
            VimError::Unauthorized => {
                CollectorError::Unavailable("Authentication required".to_string())
            }
            VimError::NotFound(msg) => CollectorError::NotFound(msg),
            VimError::Fault { type_name, message } => match type_name.as_str() {
                "ManagedObjectNotFound" => CollectorError::NotFound(message),
                "InvalidArgument" | "InvalidProperty" | "InvalidType" => {
                    CollectorError::InvalidRequest(format!("{type_name}: {message}"))
                }
                _ => CollectorError::Fault(format!("{type_name}: {message}")),
            },
            VimError::Config(msg) => CollectorError::InvalidRequest(msg),
            VimError::InvalidResponse(msg) => CollectorError::Malformed(msg),
            VimError::Serialization(e) => CollectorError::Malformed(e.to_string()),
        }
    }
}

/// 已登录的平台会话
pub struct VsphereSession {
    client: VimClient,
    wait_max_seconds: Option<i32>,
}

impl VsphereSession {
    pub fn new(client: VimClient) -> Self {
        Self {
            client,
            wait_max_seconds: None,
        }
    }

    /// 连接并登录
    pub async fn connect(config: &VimConfig) -> Result<Self, CollectorError> {
        if config.username.is_none() || config.password.is_none() {
            return Err(VimError::Config("Missing VIM_USERNAME or VIM_PASSWORD".to_string()).into());
        }
        let client = VimClient::connect(config).await?;
        Ok(Self::new(client))
    }

    /// 服务端长轮询上限，`None` 表示无限等待
    pub fn with_wait_max_seconds(mut self, seconds: Option<i32>) -> Self {
        self.wait_max_seconds = seconds;
        self
    }

    /// 清单根文件夹
    pub fn root_folder(&self) -> ObjectRef {
        convert::from_moref(self.client.content().root_folder.clone())
    }

    pub fn client(&self) -> &VimClient {
        &self.client
    }

    /// 结束平台会话；应在监听器关闭之后调用
    pub async fn logout(&self) -> Result<(), CollectorError> {
        self.client.logout().await?;
        tracing::info!("Management session logged out");
        Ok(())
    }
}

#[async_trait]
impl PropertyCollector for VsphereSession {
    async fn create_filter(
        &self,
        filter: &WatchFilter,
        partial_updates: bool,
    ) -> Result<ObjectRef, CollectorError> {
        let spec = convert::filter_spec(filter);
        let filter_ref = self.client.create_filter(&spec, partial_updates).await?;
        Ok(convert::from_moref(filter_ref))
    }

    async fn destroy_filter(&self, filter: &ObjectRef) -> Result<(), CollectorError> {
        self.client
            .destroy_property_filter(&convert::to_moref(filter))
            .await?;
        Ok(())
    }

    async fn wait_for_updates(
        &self,
        version: &UpdateVersion,
    ) -> Result<Option<UpdateBatch>, CollectorError> {
        let update = self
            .client
            .wait_for_updates_ex(version.as_str(), self.wait_max_seconds)
            .await?;
        Ok(update.map(convert::update_batch))
    }
}

#[async_trait]
impl VmInventory for VsphereSession {
    async fn vm_config(&self, vm: &ObjectRef) -> Result<VmConfigSummary, CollectorError> {
        let config = self.client.vm_config(&convert::to_moref(vm)).await?;
        Ok(convert::vm_config_summary(config))
    }
}
