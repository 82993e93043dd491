//! Pixelsim Environment Abstraction Layer
//!
//! This crate provides the seam allowing the Pixelsim engines to run in both
//! **Production** (wall clock, sled-backed storage) and **Simulation**
//! (virtual clock, in-memory storage) environments.
//!
//! Two sources of environment interaction are intercepted:
//! - Time (`Clock::now()`, `Clock::epoch_ms()`)
//! - Durable flags (`FlagStore::get/set/clear`)
//!
//! The simulation harness advances time manually, which makes every timed
//! behavior (countdown, leak accrual, tutorial auto-advance delays)
//! fast-forwardable and deterministic.
//!
//! # Example
//!
//! ```ignore
//! use pixelsim_env::{Clock, SystemClock};
//!
//! let clock = SystemClock::shared();
//! let started_at = clock.now();
//! ```

mod clock;
mod error;
mod storage;

pub use clock::{Clock, SystemClock};
pub use error::EnvError;
pub use storage::{FlagStore, MemoryFlagStore};
