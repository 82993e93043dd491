//! Virtual clock implementing `Clock` for deterministic testing.

use pixelsim_env::Clock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Virtual wall-clock epoch: 2024-01-01 00:00:00 UTC, so request URLs
/// carry stable timestamps across runs.
const VIRTUAL_EPOCH_SECS: u64 = 1_704_067_200;

/// Clock whose time advances only when the harness says so.
pub struct VirtualClock {
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,
}

impl VirtualClock {
    /// Creates a clock at virtual time zero.
    pub fn new() -> Self {
        Self {
            virtual_time_ns: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an Arc-wrapped clock for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advances virtual time by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self.virtual_time_ns.lock().unwrap();
        *time += duration.as_nanos() as u64;
    }

    /// Sets the virtual time to a specific value.
    pub fn set(&self, time: Duration) {
        let mut t = self.virtual_time_ns.lock().unwrap();
        *t = time.as_nanos() as u64;
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(*self.virtual_time_ns.lock().unwrap())
    }

    fn epoch_ms(&self) -> u64 {
        VIRTUAL_EPOCH_SECS * 1000 + self.now().as_millis() as u64
    }
}
