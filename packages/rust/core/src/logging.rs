//! Log-level handle applied during configuration resolution.
//!
//! The process-wide subscriber is owned by the binary; the resolver only
//! sees it through [`LevelSink`], which must be installed before the first
//! crawl log line is emitted.

use collectonce_shared::LogLevel;

/// Receives the effective log level once configuration has been resolved.
pub trait LevelSink: Send + Sync {
    fn apply(&self, level: LogLevel);
}

/// `EnvFilter` directive for a level.
pub fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Silent => "off",
        LogLevel::Result => "collectonce=info",
        LogLevel::Verbose => "collectonce=debug",
    }
}
