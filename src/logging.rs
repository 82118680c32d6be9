//! Internal logging helpers for structured predicate events.

/// Single logging target for the predicate engine.
pub(crate) const LOG_TARGET: &str = "tonbo_predicate";

macro_rules! predicate_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use predicate_log;
