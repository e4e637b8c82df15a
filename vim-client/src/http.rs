//! HTTP client for the JSON management API

use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::types::{
    CreateFilterRequest, LoginRequest, ManagedObjectReference, MethodFault, PropertyFilterSpec,
    ServiceContent, UpdateSet, VirtualMachineConfigInfo, WaitForUpdatesExRequest, WaitOptions,
};
use crate::{VimConfig, VimError, VimResult};

/// Session header issued by `SessionManager.Login`
pub const SESSION_HEADER: &str = "vmware-api-session-id";

/// Authenticated client for one management endpoint
///
/// Clones share the same session.
#[derive(Debug, Clone)]
pub struct VimClient {
    client: Client,
    api_root: String,
    session: Arc<RwLock<Option<String>>>,
    content: ServiceContent,
}

impl VimClient {
    /// Connect to the endpoint: fetch service content, then log in
    /// when credentials are configured.
    pub async fn connect(config: &VimConfig) -> VimResult<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.insecure);
        if config.timeout > 0 {
            builder = builder.timeout(std::time::Duration::from_secs(config.timeout));
        }
        let client = builder.build()?;
        let api_root = config.api_root();

        let content: ServiceContent = Self::expect_body(
            Self::send(client.get(format!("{api_root}/ServiceInstance/ServiceInstance/content")))
                .await?,
        )
        .await?;

        if let Some(about) = &content.about {
            tracing::info!(endpoint = %config.base_url, product = %about.full_name, "Connected to management endpoint");
        }

        let vim = Self {
            client,
            api_root,
            session: Arc::new(RwLock::new(None)),
            content,
        };

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let session = vim.login(username, password).await?;
            *vim.session.write() = Some(session);
        }

        Ok(vim)
    }

    /// Root service content
    pub fn content(&self) -> &ServiceContent {
        &self.content
    }

    /// Get the current session id
    pub fn session(&self) -> Option<String> {
        self.session.read().clone()
    }

    fn session_manager(&self) -> VimResult<&ManagedObjectReference> {
        self.content
            .session_manager
            .as_ref()
            .ok_or_else(|| VimError::InvalidResponse("Missing session manager".to_string()))
    }

    fn method_url(&self, moref: &ManagedObjectReference, method: &str) -> String {
        format!("{}/{}/{}/{}", self.api_root, moref.type_, moref.value, method)
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.read().as_deref() {
            Some(session) => request.header(SESSION_HEADER, session),
            None => request,
        }
    }

    async fn login(&self, username: &str, password: &str) -> VimResult<String> {
        let url = self.method_url(self.session_manager()?, "Login");
        let request = self.client.post(url).json(&LoginRequest {
            user_name: username,
            password,
        });

        let response = Self::send(request).await?;
        let session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| VimError::InvalidResponse("Missing session header".to_string()))?;

        tracing::debug!(user = %username, "Management session established");
        Ok(session)
    }

    /// Terminate the session
    ///
    /// The session id is dropped locally even when the server call fails;
    /// later calls are no-ops.
    pub async fn logout(&self) -> VimResult<()> {
        let url = self.method_url(self.session_manager()?, "Logout");
        let Some(session) = self.session.write().take() else {
            return Ok(());
        };
        Self::send(self.client.post(url).header(SESSION_HEADER, session)).await?;
        tracing::debug!("Management session closed");
        Ok(())
    }

    /// Invoke a method with a JSON body
    async fn invoke<T: DeserializeOwned, B: Serialize>(
        &self,
        moref: &ManagedObjectReference,
        method: &str,
        body: &B,
    ) -> VimResult<Option<T>> {
        let url = self.method_url(moref, method);
        let response = Self::send(self.with_session(self.client.post(url).json(body))).await?;
        Self::optional_body(response).await
    }

    /// Read a property of a managed object
    async fn property<T: DeserializeOwned>(
        &self,
        moref: &ManagedObjectReference,
        property: &str,
    ) -> VimResult<T> {
        let url = self.method_url(moref, property);
        let response = Self::send(self.with_session(self.client.get(url))).await?;
        Self::expect_body(response).await
    }

    // ========== Property collector ==========

    /// Register a property filter on the session's collector
    pub async fn create_filter(
        &self,
        spec: &PropertyFilterSpec,
        partial_updates: bool,
    ) -> VimResult<ManagedObjectReference> {
        let body = CreateFilterRequest {
            spec,
            partial_updates,
        };
        self.invoke(&self.content.property_collector, "CreateFilter", &body)
            .await?
            .ok_or_else(|| VimError::InvalidResponse("Missing filter reference".to_string()))
    }

    /// Long-poll for changes since `version`.
    ///
    /// Returns `None` when `max_wait_seconds` elapses without changes.
    pub async fn wait_for_updates_ex(
        &self,
        version: &str,
        max_wait_seconds: Option<i32>,
    ) -> VimResult<Option<UpdateSet>> {
        let body = WaitForUpdatesExRequest {
            version: (!version.is_empty()).then_some(version),
            options: WaitOptions { max_wait_seconds },
        };
        self.invoke(&self.content.property_collector, "WaitForUpdatesEx", &body)
            .await
    }

    /// Destroy a previously created property filter
    pub async fn destroy_property_filter(&self, filter: &ManagedObjectReference) -> VimResult<()> {
        let url = self.method_url(filter, "DestroyPropertyFilter");
        Self::send(self.with_session(self.client.post(url))).await?;
        Ok(())
    }

    // ========== Virtual machines ==========

    /// Read `config` of a virtual machine
    pub async fn vm_config(
        &self,
        vm: &ManagedObjectReference,
    ) -> VimResult<VirtualMachineConfigInfo> {
        self.property(vm, "config").await
    }

    // ========== Response handling ==========

    async fn send(request: RequestBuilder) -> VimResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(fault_from_response(status, &text));
        }

        Ok(response)
    }

    async fn optional_body<T: DeserializeOwned>(response: Response) -> VimResult<Option<T>> {
        let text = response.text().await?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    async fn expect_body<T: DeserializeOwned>(response: Response) -> VimResult<T> {
        Self::optional_body(response)
            .await?
            .ok_or_else(|| VimError::InvalidResponse("Empty response body".to_string()))
    }
}

/// Map a non-2xx response to an error
pub(crate) fn fault_from_response(status: StatusCode, text: &str) -> VimError {
    if status == StatusCode::UNAUTHORIZED {
        return VimError::Unauthorized;
    }

    match serde_json::from_str::<MethodFault>(text) {
        Ok(fault) if fault.type_name == "NotAuthenticated" => VimError::Unauthorized,
        Ok(fault) => VimError::Fault {
            message: fault.message(),
            type_name: fault.type_name,
        },
        Err(_) if status == StatusCode::NOT_FOUND => VimError::NotFound(text.to_string()),
        Err(_) => VimError::InvalidResponse(format!("{status}: {text}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status() {
        let err = fault_from_response(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, VimError::Unauthorized));
    }

    #[test]
    fn test_not_authenticated_fault() {
        let body = r#"{"_typeName":"NotAuthenticated","faultMessage":[]}"#;
        let err = fault_from_response(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(err, VimError::Unauthorized));
    }

    #[test]
    fn test_method_fault() {
        let body = r#"{"_typeName":"InvalidArgument","faultMessage":[{"key":"msg.invalid","message":"A specified parameter was not correct: spec"}]}"#;
        let err = fault_from_response(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert_eq!(err.fault_type(), Some("InvalidArgument"));
        assert_eq!(
            err.to_string(),
            "InvalidArgument: A specified parameter was not correct: spec"
        );
    }

    #[test]
    fn test_plain_not_found() {
        let err = fault_from_response(StatusCode::NOT_FOUND, "no such path");
        assert!(matches!(err, VimError::NotFound(ref s) if s == "no such path"));
    }

    fn unreachable_client(session: Option<&str>) -> VimClient {
        let content: ServiceContent = serde_json::from_value(serde_json::json!({
            "rootFolder": {"type": "Folder", "value": "group-d1"},
            "propertyCollector": {"type": "PropertyCollector", "value": "propertyCollector"},
            "sessionManager": {"type": "SessionManager", "value": "SessionManager"}
        }))
        .unwrap();
        VimClient {
            client: Client::new(),
            api_root: VimConfig::new("http://127.0.0.1:9").api_root(),
            session: Arc::new(RwLock::new(session.map(str::to_string))),
            content,
        }
    }

    #[tokio::test]
    async fn test_logout_clears_shared_session_once() {
        let client = unreachable_client(Some("52b1-session"));
        let clone = client.clone();
        assert_eq!(clone.session().as_deref(), Some("52b1-session"));

        // the endpoint is unreachable, the session is still gone locally
        let err = clone.logout().await.unwrap_err();
        assert!(matches!(err, VimError::Http(_)));
        assert!(client.session().is_none());

        client.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_fails_for_unreachable_endpoint() {
        let config = VimConfig::new("http://127.0.0.1:9").with_timeout(2);
        let err = VimClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, VimError::Http(_)));
    }
}
