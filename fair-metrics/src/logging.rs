//! Tracing subscriber setup
//!
//! The subscriber is installed before settings are resolved so that config
//! loading diagnostics are not dropped. Its filter starts from `RUST_LOG`
//! (or "info") and is swapped for the configured level once settings exist,
//! unless `RUST_LOG` was given.

use fair_common::Settings;
use tracing::warn;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Handle on the installed filter
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Apply `settings.logging.level` when `RUST_LOG` did not set the filter
    pub fn apply_settings(&self, settings: &Settings) {
        let Some(filter) = configured_filter(self.from_env, &settings.logging.level) else {
            return;
        };
        if let Err(e) = self.handle.reload(filter) {
            warn!("Could not apply log level {}: {}", settings.logging.level, e);
        }
    }
}

/// Install the global subscriber
pub fn init() -> LogFilter {
    let from_env = EnvFilter::try_from_default_env().ok();
    let installed_from_env = from_env.is_some();
    let initial = from_env.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let (filter, handle) = reload::Layer::new(initial);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    LogFilter {
        handle,
        from_env: installed_from_env,
    }
}

/// Filter to switch to after settings resolution, `None` keeps the current one
fn configured_filter(from_env: bool, level: &str) -> Option<EnvFilter> {
    if from_env {
        return None;
    }
    match EnvFilter::try_new(level) {
        Ok(filter) => Some(filter),
        Err(e) => {
            warn!("Ignoring invalid log level {}: {}", level, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_keeps_precedence() {
        assert!(configured_filter(true, "debug").is_none());
    }

    #[test]
    fn test_configured_level_applies() {
        assert!(configured_filter(false, "fair_metrics=debug,warn").is_some());
    }

    #[test]
    fn test_invalid_level_is_ignored() {
        assert!(configured_filter(false, "fair_metrics=verbose").is_none());
    }
}
