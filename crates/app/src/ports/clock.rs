//! Clock port — injected time source.
//!
//! Scans and transitions never read the wall clock directly; they ask the
//! clock so tests can supply a fixed "now" and run deterministically.

use billhub_domain::time::Timestamp;

/// Supplies the current time.
pub trait Clock {
    /// The current UTC time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        billhub_domain::time::now()
    }
}

impl<T: Clock + Send + Sync> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
