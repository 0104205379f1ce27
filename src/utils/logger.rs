use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of the pipeline's log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One short human-readable line per event.
    Compact,
    /// JSON lines, for log collectors.
    Json,
}

impl LogFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Filter used when `RUST_LOG` is not set.
fn filter_directive(verbose: bool) -> &'static str {
    if verbose {
        "contact_etl=debug,info"
    } else {
        "contact_etl=info"
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose)));
    let layer = tracing_subscriber::fmt::layer().with_target(false);

    let installed = match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json().with_current_span(false))
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Logger already installed, keeping the existing one");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_crate_debug() {
        assert_eq!(filter_directive(true), "contact_etl=debug,info");
        assert_eq!(filter_directive(false), "contact_etl=info");
    }

    #[test]
    fn test_format_follows_json_flag() {
        assert_eq!(LogFormat::from_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_flag(false), LogFormat::Compact);
    }

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_logger(LogFormat::Compact, false);
        init_logger(LogFormat::Json, true);
    }
}
