//! Tracing setup with a runtime-adjustable level.

use std::sync::Arc;

use tfsgate_gateway::LevelSetter;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt, reload};

const DEFAULT_FILTER: &str = "info,tfsgate=debug";

/// Installs the global subscriber and returns a setter that replaces the
/// active filter with a single global level.
pub fn init() -> anyhow::Result<LevelSetter> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()?;

    Ok(Arc::new(move |level| {
        handle
            .reload(level_filter(level))
            .map_err(|e| e.to_string())
    }))
}

fn level_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn level_filter_sets_max_level() {
        assert_eq!(
            level_filter(Level::WARN).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            level_filter(Level::TRACE).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
