//! Logging macros.
//!
//! With the `tracing` feature enabled these forward to the `tracing` crate; without it they
//! expand to nothing.
//!
//! ```bash
//! RUST_LOG=concurrent_bst=trace cargo test --features tracing concurrent
//! ```

#![allow(unused_macros)]

/// Trace-level event.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level event.
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}
