//! Pixelsim Core - Educational Tracking-Pixel Simulator
//!
//! This library implements the two cooperating components of the simulator:
//! 1. **Tracker Simulation Engine**: a fixed-duration timed challenge in which
//!    three simulated trackers must be neutralized before time expires
//! 2. **Guided Tutorial Controller**: a step-sequenced overlay state machine
//!    that walks the user through how tracking works, gating some steps on
//!    real simulation events
//!
//! Everything is single-threaded and tick-driven: the engine mutates state
//! only inside `tick()` and the user-triggered actions, so the whole session
//! can be replayed deterministically from a seed.

pub mod engine;
pub mod events;
pub mod pixel_log;
pub mod placement;
pub mod session;
pub mod storage;
pub mod tracker;
pub mod tutorial;

#[cfg(feature = "dashboard")]
pub mod dashboard;

// Re-export key types for convenience
pub use engine::{EngineConfig, RequestRecord, TrackerEngine};
pub use events::{LogSink, MemorySink, RequestAction, TerminalEvent};
#[cfg(feature = "dashboard")]
pub use events::ChannelSink;
pub use pixel_log::{PixelLog, PixelLogEntry, PixelLogError};
pub use placement::{compute_placement, Placement, PreferredSide, Rect, Viewport};
pub use session::{GameOutcome, RunPhase, SessionState, Severity, StatsSnapshot};
pub use storage::SledFlagStore;
pub use tracker::{Tracker, TrackerId};
pub use tutorial::{EngineControl, GateAction, TutorialController, TutorialPhase};
