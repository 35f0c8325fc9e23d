//! Logging setup for Gatekeep.
//!
//! Library code only emits `tracing` events. Installing a subscriber is left to
//! the application; [`init`] is a convenience that installs one driven by
//! environment variables when the `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `GATEKEEP_DEBUG=true|1|yes` - Enable debug logging
//! - `GATEKEEP_LOG_LEVEL=trace|debug|info|warn|error` - Set an explicit level
//! - `GATEKEEP_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use gatekeep_query::logging;
//!
//! logging::init();
//! ```
//!
//! Events emitted by the validation layer:
//!
//! ```rust,ignore
//! info!(provider, fingerprint, plugins, "validator factory created");
//! debug!(key = %key, "building shape");
//! debug!(model, operation = %op, issues, "input rejected");
//! debug!(model, operation = %op, "executing");
//! ```
//!
//! Per-lookup events such as cache hits go through [`gatekeep_trace!`](crate::gatekeep_trace) and
//! [`gatekeep_debug!`](crate::gatekeep_debug), which stay silent unless `GATEKEEP_DEBUG` is on.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "GATEKEEP_DEBUG";
const LEVEL_VAR: &str = "GATEKEEP_LOG_LEVEL";
const FORMAT_VAR: &str = "GATEKEEP_LOG_FORMAT";

/// Whether `GATEKEEP_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The level requested through `GATEKEEP_LOG_LEVEL`.
///
/// Unknown or missing values fall back to "debug" when `GATEKEEP_DEBUG` is on
/// and "warn" otherwise.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The format requested through `GATEKEEP_LOG_FORMAT`. Defaults to "json".
pub fn get_log_format() -> &'static str {
    env::var(FORMAT_VAR)
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Directive string handed to the subscriber's env filter.
pub fn filter_directives(level: &str) -> String {
    format!("gatekeep={level},gatekeep_query={level},gatekeep_schema={level}")
}

/// Install the global subscriber once.
///
/// Does nothing unless `GATEKEEP_DEBUG` or `GATEKEEP_LOG_LEVEL` is set, or when
/// the crate was built without the `tracing-subscriber` feature.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directives(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match get_log_format() {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "Gatekeep logging initialized"
                );
            }
        }
    });
}

/// Set `GATEKEEP_LOG_LEVEL` and call [`init`].
///
/// # Safety
///
/// Mutates the process environment. Call at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as a startup-only call.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Debug event emitted only while `GATEKEEP_DEBUG` is on.
#[macro_export]
macro_rules! gatekeep_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace event emitted only while `GATEKEEP_DEBUG` is on.
#[macro_export]
macro_rules! gatekeep_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
