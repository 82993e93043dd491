//! Time source abstraction for the Pixelsim engines.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// The central interface for time interaction.
///
/// This trait abstracts the clock so the simulation engine and the tutorial
/// controller can run against either the real wall clock or a manually
/// advanced virtual clock.
///
/// # Implementations
///
/// - **Production**: [`SystemClock`] - wraps `std::time`
/// - **Simulation**: `VirtualClock` in `pixelsim_sim` - manual advance
pub trait Clock: Send + Sync + 'static {
    /// Returns the monotonic time elapsed since clock creation.
    ///
    /// Used for tutorial auto-advance deadlines and duration measurements.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns wall-clock milliseconds since the Unix epoch.
    ///
    /// Used for the `time` parameter of simulated request URLs.
    /// In simulation, this is derived from virtual time + a fixed epoch.
    fn epoch_ms(&self) -> u64;
}

/// Production clock backed by `std::time`.
pub struct SystemClock {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl SystemClock {
    /// Creates a new SystemClock.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped clock for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}
