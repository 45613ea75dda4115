use crate::app_config::{AppConfig, LogFormat, SinkConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid, or a sink-specific
/// variable is missing.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid, or a sink-specific
/// variable is missing.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_pool_size = |var: &str, default: &str| -> Result<usize, ConfigError> {
        match or_default(var, default).parse::<usize>() {
            Ok(0) => Err(invalid(var, "must be at least 1".to_string())),
            Ok(n) => Ok(n),
            Err(e) => Err(invalid(var, e.to_string())),
        }
    };

    let routes_path = PathBuf::from(or_default("FARES_ROUTES_PATH", "./config/routes.yaml"));
    let days_to_scrape = parse_u32("FARES_DAYS_TO_SCRAPE", "180")?;
    let log_level = or_default("FARES_LOG_LEVEL", "info");
    let log_format = parse_log_format(&or_default("FARES_LOG_FORMAT", "text"))?;

    let request_timeout_secs = parse_u64("FARES_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FARES_USER_AGENT", "fares/0.1 (fare-monitoring)");
    let max_retries = parse_u32("FARES_MAX_RETRIES", "0")?;
    let retry_backoff_base_secs = parse_u64("FARES_RETRY_BACKOFF_BASE_SECS", "5")?;
    let max_in_flight = parse_pool_size("FARES_MAX_IN_FLIGHT", "16")?;
    let session_max_in_flight = parse_pool_size("FARES_SESSION_MAX_IN_FLIGHT", "2")?;

    let sink = match or_default("FARES_SINK", "stdout").as_str() {
        "stdout" => SinkConfig::Stdout,
        "file" => SinkConfig::File(PathBuf::from(require("FARES_SINK_PATH")?)),
        "http" => SinkConfig::Http(require("FARES_SINK_URL")?),
        other => {
            return Err(invalid(
                "FARES_SINK",
                format!("unknown sink '{other}'; expected stdout, file, or http"),
            ))
        }
    };

    Ok(AppConfig {
        routes_path,
        days_to_scrape,
        log_level,
        log_format,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        max_in_flight,
        session_max_in_flight,
        sink,
    })
}

/// Parse a string into a `LogFormat` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than `text` or `json`.
fn parse_log_format(s: &str) -> Result<LogFormat, ConfigError> {
    match s {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FARES_LOG_FORMAT".to_string(),
            reason: format!("unknown format '{other}'; expected text or json"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
