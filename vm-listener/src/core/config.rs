use std::time::Duration;

/// 监听器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | POLL_ERROR_BACKOFF_MS | 1000 | 轮询调用失败后的等待时间(毫秒) |
/// | WAIT_MAX_SECONDS | 未设置 | 服务端长轮询上限(秒)，未设置表示无限等待 |
/// | SHUTDOWN_TIMEOUT_MS | 5000 | 关闭时等待后台任务的超时(毫秒) |
/// | VOLUME_DIR | dockvols | 受管卷所在目录名 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | 未设置 | 日志文件目录 (按天滚动) |
///
/// # 示例
///
/// ```ignore
/// VIM_URL=https://esx01.lab VOLUME_DIR=dockvols LOG_LEVEL=debug ./host-agent
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 轮询调用本身失败后的等待时间 (毫秒)，0 表示立即重试
    pub poll_error_backoff_ms: u64,
    /// 服务端长轮询上限 (秒)
    pub wait_max_seconds: Option<i32>,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    /// 受管卷目录名
    pub volume_dir: String,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            poll_error_backoff_ms: lookup("POLL_ERROR_BACKOFF_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            wait_max_seconds: lookup("WAIT_MAX_SECONDS").and_then(|v| v.parse().ok()),
            shutdown_timeout_ms: lookup("SHUTDOWN_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            volume_dir: lookup("VOLUME_DIR").unwrap_or_else(|| "dockvols".into()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: lookup("LOG_DIR"),
        }
    }

    pub fn with_poll_error_backoff(mut self, backoff: Duration) -> Self {
        self.poll_error_backoff_ms = backoff.as_millis() as u64;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_wait_max_seconds(mut self, seconds: Option<i32>) -> Self {
        self.wait_max_seconds = seconds;
        self
    }

    pub fn poll_error_backoff(&self) -> Duration {
        Duration::from_millis(self.poll_error_backoff_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// 内置默认值，不读取环境变量
impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
