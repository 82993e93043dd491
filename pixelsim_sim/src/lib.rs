//! Pixelsim Deterministic Simulation Testing (DST) Harness
//!
//! Runs complete simulator sessions under a controlled environment where
//! every source of non-determinism is intercepted:
//! - **Time**: a virtual clock that advances only when the harness ticks it
//! - **Randomness**: all entropy derived from a single 64-bit seed
//! - **Storage**: in-memory flag store, nothing touches disk
//!
//! A scenario drives a [`SimWorld`] (engine + tutorial under virtual time)
//! through a scripted session and asserts the invariants that must hold:
//! the timer never goes negative, neutralization counts never exceed the
//! roster, the outcome freezes at game over, the tutorial's durable flag
//! behaves.
//!
//! # Usage
//!
//! ```ignore
//! use pixelsim_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42);
//! let result = runner.run(ScenarioId::SpeedRun);
//! assert!(result.passed);
//! ```

mod context;
mod runner;
mod world;
pub mod scenarios;

pub use context::VirtualClock;
pub use runner::{ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld};
