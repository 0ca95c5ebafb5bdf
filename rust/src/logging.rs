//! Verbosity-gated logging macros for the optimization engine.
//!
//! Nothing is formatted when verbosity is 0, so the macros cost nothing in
//! production calls. Levels:
//! - 0: SILENT (errors surface as return values only)
//! - 1: SUMMARY (one line per optimization run with its totals)
//! - 2: DECISIONS (each suggestion emitted or skipped, with the reason)
//! - 3: TRACE (graph passes: topological order, per-task timings)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_SUMMARY: u8 = 1;
pub const VERBOSITY_DECISIONS: u8 = 2;
pub const VERBOSITY_TRACE: u8 = 3;

/// Log at SUMMARY level (verbosity >= 1).
#[macro_export]
macro_rules! log_summary {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_SUMMARY {
            eprintln!("[sitesched] {}", format_args!($($arg)*));
        }
    };
}

/// Log at DECISIONS level (verbosity >= 2).
///
/// Used for: emitted suggestions, threshold misses, ignored parameters.
#[macro_export]
macro_rules! log_decisions {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DECISIONS {
            eprintln!("[sitesched]   {}", format_args!($($arg)*));
        }
    };
}

/// Log at TRACE level (verbosity >= 3).
#[macro_export]
macro_rules! log_trace {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_TRACE {
            eprintln!("[sitesched]     {}", format_args!($($arg)*));
        }
    };
}
