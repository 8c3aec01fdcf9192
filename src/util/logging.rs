//! Logging configuration and initialization.

use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Builds a subscriber for this config. `RUST_LOG` wins over the configured level.
    pub fn subscriber(&self) -> Box<dyn Subscriber + Send + Sync> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => Box::new(fmt().json().with_env_filter(filter).finish()),
            _ => Box::new(fmt().with_env_filter(filter).finish()),
        }
    }

    /// Installs the global subscriber.
    pub fn init(&self) {
        if let Err(error) = tracing::subscriber::set_global_default(self.subscriber()) {
            tracing::debug!("subscriber already installed: {error}");
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn scoped_subscriber_sees_events() {
        for format in ["pretty", "json"] {
            let config = LoggingConfig {
                level: "info".into(),
                format: format.into(),
            };
            let enabled = tracing::subscriber::with_default(config.subscriber(), || {
                tracing::enabled!(Level::ERROR)
            });
            assert!(enabled, "{format} subscriber dropped an error event");
        }
    }
}
