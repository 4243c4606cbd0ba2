//! Structured logging helpers.
//!
//! Protocol lines keep their historical text as the log message so that
//! operators can grep for `MONGERING`, `FOUND-BLOCK` and friends; the macros
//! below add a `subsystem` field for filtering.

/// Log with a `subsystem` field.
#[macro_export]
macro_rules! log_event {
    (info, $subsystem:expr, $($arg:tt)+) => {
        tracing::info!(subsystem = $subsystem, $($arg)+)
    };
    (warn, $subsystem:expr, $($arg:tt)+) => {
        tracing::warn!(subsystem = $subsystem, $($arg)+)
    };
    (error, $subsystem:expr, $($arg:tt)+) => {
        tracing::error!(subsystem = $subsystem, $($arg)+)
    };
    (debug, $subsystem:expr, $($arg:tt)+) => {
        tracing::debug!(subsystem = $subsystem, $($arg)+)
    };
}

/// Log a peer-related event with a `peer` field.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $subsystem:expr, $peer:expr, $($arg:tt)+) => {
        tracing::$level!(
            subsystem = $subsystem,
            peer = %$peer,
            $($arg)+
        )
    };
}
