//! Injected environment dependencies.
//!
//! External capabilities are abstracted behind traits and injected into the
//! runtime, so tests can substitute deterministic implementations.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Production uses [`SystemClock`]; tests use a fixed or stepping clock from
/// the testing crate.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
