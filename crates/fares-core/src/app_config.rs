use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Where accepted offers are delivered.
#[derive(Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// One JSON object per line on standard output.
    Stdout,
    /// One JSON object per line appended to a file.
    File(PathBuf),
    /// Each offer `POST`ed as JSON to a collector endpoint.
    Http(String),
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkConfig::Stdout => write!(f, "Stdout"),
            SinkConfig::File(path) => f.debug_tuple("File").field(path).finish(),
            // Collector URLs may embed credentials.
            SinkConfig::Http(_) => f.debug_tuple("Http").field(&"[redacted]").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub routes_path: PathBuf,
    pub days_to_scrape: u32,
    pub log_level: String,
    pub log_format: LogFormat,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub max_in_flight: usize,
    pub session_max_in_flight: usize,
    pub sink: SinkConfig,
}
