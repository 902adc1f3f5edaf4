//! Logging setup for xrobject
//!
//! The library only emits `tracing` events. Binaries call one of the init
//! functions once at startup to install a subscriber.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::Level;

/// Whether a subscriber has been installed
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Default filter directive (e.g., "info", "warn,xrobject_export=debug")
    pub default_level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
    /// Show thread IDs in log output
    pub show_thread_ids: bool,
    /// Show source file in log output
    pub show_file: bool,
    /// Show line number in log output
    pub show_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: "warn,xrobject_export=info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TracingConfig {
    /// Config for a CLI `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace
    pub fn for_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        Self {
            default_level: level.to_string().to_lowercase(),
            show_file: verbosity >= 3,
            show_line_number: verbosity >= 3,
            ..Default::default()
        }
    }
}

/// Install the default subscriber. Later calls are ignored.
pub fn init_default() {
    init_with_config(TracingConfig::default());
}

/// Install a subscriber for `config`. Later calls are ignored.
///
/// `RUST_LOG` overrides `config.default_level` when set.
pub fn init_with_config(config: TracingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        return;
    }

    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    // A host may already own the global subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init();
}

/// Run `f` inside an `export` span and log its duration
pub fn instrument_export<T, F>(root: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let span = tracing::info_span!("export", root = %root);
    let _guard = span.enter();

    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();

    tracing::debug!(duration_ms = %duration.as_millis(), "Export operation complete");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(TracingConfig::for_verbosity(0).default_level, "warn");
        assert_eq!(TracingConfig::for_verbosity(1).default_level, "info");
        assert_eq!(TracingConfig::for_verbosity(2).default_level, "debug");

        let trace = TracingConfig::for_verbosity(5);
        assert_eq!(trace.default_level, "trace");
        assert!(trace.show_file && trace.show_line_number);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_default();
        init_with_config(TracingConfig::for_verbosity(2));
        assert!(TRACING_INITIALIZED.load(Ordering::SeqCst));
    }

    #[test]
    fn test_instrument_returns_value() {
        assert_eq!(instrument_export("root", || 42), 42);
    }
}
