// Logging and tracing setup

use crate::error::{SearchboxError, SearchboxResult};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra `EnvFilter` directives, e.g. `reqwest=warn`
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// Filter built from the level and directives
    pub fn env_filter(&self) -> SearchboxResult<EnvFilter> {
        let mut filter = EnvFilter::new(self.level.as_str());
        for directive in &self.directives {
            let directive = directive
                .parse()
                .map_err(|e| SearchboxError::config(format!("Invalid log directive {:?}: {}", directive, e)))?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.config.directives.push(directive.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Install a global subscriber.
///
/// Fails if a subscriber is already installed or a directive is invalid.
pub fn init_logging(config: LogConfig) -> SearchboxResult<()> {
    let filter = config.env_filter()?;

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Plain => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init(),
    };
    installed.map_err(|e| SearchboxError::config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {:?}", config.level);
    Ok(())
}

pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
