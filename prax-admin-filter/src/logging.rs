//! Logging for filter compilation.
//!
//! The compiler logs through `tracing`: a `trace!` event for every column
//! that drops out and a `debug!` event for every group folded into a scope.
//! Nothing is printed unless a subscriber is installed, either by the host
//! application or by [`init`].
//!
//! # Environment Variables
//!
//! - `PRAX_ADMIN_DEBUG=true|1|yes` - Enable debug logging
//! - `PRAX_ADMIN_LOG_LEVEL=trace|debug|info|warn|error` - Set the level
//! - `PRAX_ADMIN_LOG_FORMAT=json|pretty|compact` - Set the output format (default: json)
//!
//! ```rust,no_run
//! use prax_admin_filter::logging;
//!
//! // Call once at startup.
//! logging::init();
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "PRAX_ADMIN_DEBUG";
const LEVEL_VAR: &str = "PRAX_ADMIN_LOG_LEVEL";
const FORMAT_VAR: &str = "PRAX_ADMIN_LOG_FORMAT";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

impl LogFormat {
    /// Get the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Check if `PRAX_ADMIN_DEBUG` enables debug logging.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The level from `PRAX_ADMIN_LOG_LEVEL`.
///
/// Unset or unrecognized levels fall back to `DEBUG` when debug logging is
/// enabled and `WARN` otherwise.
pub fn get_log_level() -> Level {
    env::var(LEVEL_VAR)
        .ok()
        .and_then(|level| Level::from_str(&level).ok())
        .unwrap_or(if is_debug_enabled() {
            Level::DEBUG
        } else {
            Level::WARN
        })
}

/// The format from `PRAX_ADMIN_LOG_FORMAT`.
pub fn get_log_format() -> LogFormat {
    match env::var(FORMAT_VAR).map(|f| f.to_lowercase()).as_deref() {
        Ok("pretty") => LogFormat::Pretty,
        Ok("compact") => LogFormat::Compact,
        _ => LogFormat::Json,
    }
}

/// Install a global subscriber for the filter crates.
///
/// Does nothing unless `PRAX_ADMIN_DEBUG` or `PRAX_ADMIN_LOG_LEVEL` is set,
/// or when the `tracing-subscriber` feature is off. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level().as_str().to_lowercase();
            let filter = EnvFilter::try_new(format!("prax_admin={level},prax_admin_filter={level}"))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            // `try_init` leaves a subscriber the host already installed alone.
            let installed = match get_log_format() {
                LogFormat::Json => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                LogFormat::Compact => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                LogFormat::Pretty => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = %level,
                    format = get_log_format().as_str(),
                    "filter logging initialized"
                );
            }
        }
    });
}

/// Set `PRAX_ADMIN_LOG_LEVEL` and call [`init`].
///
/// # Safety
///
/// This modifies the process environment. Call it at startup before any
/// threads are spawned.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Set `PRAX_ADMIN_DEBUG=true` and call [`init`].
///
/// # Safety
///
/// Same constraints as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}
