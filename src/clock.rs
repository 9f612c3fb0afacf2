//! Wall-clock time for deadlines and ordering.
//!
//! Every timer in this crate (optimistic-update expiry, failure linger,
//! search debounce, cache TTL) is a stored deadline swept against an
//! injected `now`, never a sleeping thread. Components take their clock as
//! a `TimeSource` so tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
///
/// Copy is fine here - it's a measurement, not an identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallClock(pub u64);

impl WallClock {
    /// Read the system clock.
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    /// This instant plus `ms` milliseconds.
    pub fn plus(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

/// Source of wall-clock readings.
pub trait TimeSource {
    fn now(&self) -> WallClock;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> WallClock {
        WallClock::now()
    }
}

/// Hand-driven clock for tests.
///
/// Clones share the underlying instant, so a test can hold one handle while
/// the component under test holds another.
#[derive(Clone, Debug)]
pub struct ManualTimeSource {
    now: Arc<AtomicU64>,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> WallClock {
        WallClock(self.now.load(Ordering::SeqCst))
    }
}
