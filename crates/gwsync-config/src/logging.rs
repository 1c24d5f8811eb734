use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info",
    /// "gwsync_core=debug").
    pub level: String,

    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

impl LogSettings {
    fn filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_from_default_env().or_else(|_| self.level_filter())
    }

    fn level_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.level).map_err(|e| ConfigError::Validation {
            field: "log.level".into(),
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `settings.level`.
///
/// Fails if a subscriber is already installed.
pub fn init(settings: &LogSettings) -> Result<(), ConfigError> {
    let filter = settings.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if settings.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    installed.map_err(|e| ConfigError::Validation {
        field: "log".into(),
        reason: e.to_string(),
    })
}
