//! Client configuration

/// Default API release used in the URL path
pub const DEFAULT_API_RELEASE: &str = "8.0.2.0";

/// Client configuration for connecting to a management endpoint
///
/// # Environment
///
/// | Variable | Default |
/// |----------|---------|
/// | VIM_URL | https://localhost |
/// | VIM_USERNAME | - |
/// | VIM_PASSWORD | - |
/// | VIM_API_RELEASE | 8.0.2.0 |
/// | VIM_TIMEOUT_SECS | 0 (no timeout) |
/// | VIM_INSECURE | false |
#[derive(Debug, Clone)]
pub struct VimConfig {
    /// Server base URL (e.g., "https://esx01.lab")
    pub base_url: String,

    pub username: Option<String>,

    pub password: Option<String>,

    /// API release segment of the URL
    pub api_release: String,

    /// Request timeout in seconds, 0 disables it.
    /// Long-polls block until a change arrives, so the default is 0.
    pub timeout: u64,

    /// Accept self-signed server certificates
    pub insecure: bool,
}

impl VimConfig {
    /// Create a new configuration for the given endpoint
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            api_release: DEFAULT_API_RELEASE.to_string(),
            timeout: 0,
            insecure: false,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VIM_URL").unwrap_or_else(|_| "https://localhost".into()),
            username: std::env::var("VIM_USERNAME").ok(),
            password: std::env::var("VIM_PASSWORD").ok(),
            api_release: std::env::var("VIM_API_RELEASE")
                .unwrap_or_else(|_| DEFAULT_API_RELEASE.into()),
            timeout: std::env::var("VIM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            insecure: std::env::var("VIM_INSECURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Set login credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the API release
    pub fn with_api_release(mut self, release: impl Into<String>) -> Self {
        self.api_release = release.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Accept invalid server certificates
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Root of all API paths: `{base}/sdk/vim25/{release}`
    pub fn api_root(&self) -> String {
        format!(
            "{}/sdk/vim25/{}",
            self.base_url.trim_end_matches('/'),
            self.api_release
        )
    }
}

/// Local endpoint with built-in defaults, environment is not read
impl Default for VimConfig {
    fn default() -> Self {
        Self::new("https://localhost")
    }
}
