use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Logging settings read from the environment
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub environment: String,
    pub level: LogLevel,
    pub directory: PathBuf,
}

impl LogSettings {
    /// Production logs at info, everything else at debug, unless LOG_LEVEL says otherwise.
    pub fn new(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let level = if environment == "production" {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };
        Self {
            environment,
            level,
            directory: PathBuf::from("logs"),
        }
    }

    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let mut settings = Self::new(environment);
        if let Some(level) = std::env::var("LOG_LEVEL").ok().and_then(|l| l.parse().ok()) {
            settings.level = level;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            settings.directory = PathBuf::from(dir);
        }
        settings
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Default filter when RUST_LOG is unset
    pub fn filter_directive(&self) -> String {
        format!(
            "portfolio_cms={},tower_http=debug,axum=debug",
            self.level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_follows_environment() {
        assert_eq!(LogSettings::new("production").level, LogLevel::Info);
        assert_eq!(LogSettings::new("development").level, LogLevel::Debug);
    }

    #[test]
    fn test_filter_directive() {
        let mut settings = LogSettings::new("production");
        settings.level = "WARNING".parse().unwrap();
        assert_eq!(
            settings.filter_directive(),
            "portfolio_cms=warn,tower_http=debug,axum=debug"
        );
    }
}
