//! # Logging
//!
//! One `tracing` subscriber for the whole process, writing to stderr so
//! `version` output on stdout stays clean.
//!
//! The filter comes from `RUST_LOG` when it is set and parses, otherwise
//! from [`DEFAULT_FILTER`]: `info` for the server binary, the construction
//! library and the `tower_http` request traces, and nothing from other
//! crates (`reqwest`, `hyper`). For example, to trace every node call and
//! mempool decision:
//!
//! ```text
//! RUST_LOG=zil_rosetta_server=info,zil_construction=debug,tower_http=info
//! ```

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Targets and levels used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "zil_rosetta_server=info,zil_construction=info,tower_http=info";

/// Log output format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines with the event target.
    #[default]
    Pretty,
    /// One flattened JSON object per event, for log shippers.
    Json,
}

/// Builds the filter from `RUST_LOG`-style directives.
///
/// Returns the parse error alongside the fallback filter so it can be
/// reported once the subscriber is up.
fn build_filter(directives: Option<&str>) -> (EnvFilter, Option<String>) {
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        None => (EnvFilter::new(DEFAULT_FILTER), None),
        Some(d) => match EnvFilter::try_new(d) {
            Ok(filter) => (filter, None),
            Err(e) => (
                EnvFilter::new(DEFAULT_FILTER),
                Some(format!("ignoring RUST_LOG={:?}: {}", d, e)),
            ),
        },
    }
}

/// Installs the global subscriber. Call once, before the first event.
pub fn init_logging(format: LogFormat) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, rejected) = build_filter(rust_log.as_deref());
    let active = filter.to_string();

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    if let Some(reason) = rejected {
        tracing::warn!("{}", reason);
    }
    tracing::debug!(?format, filter = %active, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn unset_or_blank_uses_default_targets() {
        for directives in [None, Some(""), Some("   ")] {
            let (filter, rejected) = build_filter(directives);
            assert!(rejected.is_none());
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        }
    }

    #[test]
    fn valid_directives_replace_the_default() {
        let (filter, rejected) = build_filter(Some("zil_construction=debug"));
        assert!(rejected.is_none());
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn invalid_directives_fall_back_and_say_why() {
        let (filter, rejected) = build_filter(Some("zil_construction=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        assert!(rejected.unwrap().contains("zil_construction=loud"));
    }
}
