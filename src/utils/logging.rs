//! Scoped logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! A module opts in by defining both constants before using the macros:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_SCOPE: &str = "poller";
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("fetched {} notifications", 3); // -> "[poller] fetched 3 notifications"
//! ```
//! Flipping `ENABLE_LOGS` to `false` silences the module without touching
//! the global `RUST_LOG` filter.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!("[{}] {}", LOG_SCOPE, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!("[{}] {}", LOG_SCOPE, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!("[{}] {}", LOG_SCOPE, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!("[{}] {}", LOG_SCOPE, format_args!($($arg)*));
        }
    };
}
