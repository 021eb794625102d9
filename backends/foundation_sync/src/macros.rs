//! Crate-local logging macros.
//!
//! Every call forwards to `tracing` only when the matching cargo feature is
//! enabled, so the lock and queue hot paths compile down to nothing in
//! builds without `log_debug`.

macro_rules! debug {
    ($($t:tt)*) => {
        if cfg!(feature = "log_debug") {
            tracing::debug!($($t)*);
        }
    };
}

macro_rules! warn {
    ($($t:tt)*) => {
        if cfg!(feature = "log_warnings") {
            tracing::warn!($($t)*);
        }
    };
}
