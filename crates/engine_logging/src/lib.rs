#![deny(missing_docs)]
//! Shared logging utilities for the poster workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a thread-local "current post" marker so pipeline stages can attribute their
//! log lines, and a minimal test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Identity of the post currently moving through the pipeline on this thread.
    static CURRENT_POST: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets the post identity for the current thread.
/// The runner calls this before handing a post to the pipeline.
pub fn set_current_post(post_id: Option<&str>) {
    CURRENT_POST.with(|v| *v.borrow_mut() = post_id.map(str::to_owned));
}

/// Retrieves the post identity for the current thread, or `"-"` when unset.
pub fn current_post() -> String {
    CURRENT_POST.with(|v| v.borrow().clone().unwrap_or_else(|| "-".to_string()))
}

/// Guard that marks a post as current and clears the marker when dropped.
pub struct PostScope {
    _private: (),
}

impl PostScope {
    /// Marks `post_id` as the current post until the guard is dropped.
    pub fn enter(post_id: &str) -> Self {
        set_current_post(Some(post_id));
        Self { _private: () }
    }
}

impl Drop for PostScope {
    fn drop(&mut self) {
        set_current_post(None);
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message prefixed with the current post identity.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[{}] {}", $crate::current_post(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message prefixed with the current post identity.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[{}] {}", $crate::current_post(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
