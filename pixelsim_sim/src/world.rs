//! The simulated session: engine, tutorial, and virtual time in one box.

use crate::context::VirtualClock;

use pixelsim_core::engine::{EngineConfig, TrackerEngine};
use pixelsim_core::events::MemorySink;
use pixelsim_core::tracker::TrackerId;
use pixelsim_core::tutorial::{GateAction, TutorialController};
use pixelsim_env::MemoryFlagStore;

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for a simulated session.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Challenge duration in seconds
    pub time_limit_secs: u32,

    /// Whether the session opens with the tutorial active
    pub run_tutorial: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_limit_secs: 45,
            run_tutorial: false,
        }
    }
}

/// A complete simulated session under virtual time.
///
/// Every tick advances the clock by exactly one second, polls the tutorial
/// for due deferred actions, and steps the engine, so a whole session
/// replays identically from its seed.
pub struct SimWorld {
    config: SimConfig,
    clock: Arc<VirtualClock>,
    engine: TrackerEngine,
    tutorial: TutorialController<MemoryFlagStore>,
    events: MemorySink,
    tick_count: u64,
}

impl SimWorld {
    /// Builds a fresh world from the configuration.
    pub fn new(config: SimConfig) -> Self {
        let clock = VirtualClock::shared();
        let events = MemorySink::new();
        let engine_config = EngineConfig {
            seed: config.seed,
            time_limit_secs: config.time_limit_secs,
            ..EngineConfig::default()
        };
        let mut engine = TrackerEngine::new(
            engine_config,
            clock.clone(),
            Box::new(events.clone()),
        );
        let mut tutorial = TutorialController::with_default_steps(MemoryFlagStore::new());
        if config.run_tutorial {
            tutorial.start(&mut engine, Duration::ZERO);
        }
        Self {
            config,
            clock,
            engine,
            tutorial,
            events,
            tick_count: 0,
        }
    }

    /// Starts the timed run directly, bypassing the tutorial.
    pub fn start_run(&mut self) {
        self.engine.start();
    }

    /// Advances the world by one virtual second.
    pub fn tick(&mut self) {
        self.clock.advance(Duration::from_secs(1));
        let now = self.clock_now();
        self.tutorial.poll(&mut self.engine, now);
        self.engine.tick();
        self.tick_count += 1;
        debug!(tick = self.tick_count, phase = ?self.engine.phase(), "world tick");
    }

    /// Advances without stepping the clock, for sub-second deferred-action
    /// polling.
    pub fn poll_deferred(&mut self, dt: Duration) {
        self.clock.advance(dt);
        let now = self.clock_now();
        self.tutorial.poll(&mut self.engine, now);
    }

    /// User blocks a tracker's requests; the tutorial hears about a
    /// successful block.
    pub fn block(&mut self, id: TrackerId) -> bool {
        let changed = self.engine.block_request(id);
        if changed {
            self.tutorial.notify(GateAction::NetworkBlock, self.clock_now());
        }
        changed
    }

    /// User deletes a tracker's code line.
    pub fn delete(&mut self, id: TrackerId) -> bool {
        let changed = self.engine.delete_code(id);
        if changed {
            self.tutorial.notify(GateAction::CodeDelete, self.clock_now());
        }
        changed
    }

    /// User opens a product detail page.
    pub fn view_product(&mut self, product: &str) {
        self.engine.view_product(product);
        self.tutorial.notify(GateAction::ProductClick, self.clock_now());
    }

    /// Current virtual time.
    pub fn clock_now(&self) -> Duration {
        use pixelsim_env::Clock;
        self.clock.now()
    }

    /// Ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The session configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The engine under test.
    pub fn engine(&self) -> &TrackerEngine {
        &self.engine
    }

    /// Mutable engine access for scenario-specific prodding.
    pub fn engine_mut(&mut self) -> &mut TrackerEngine {
        &mut self.engine
    }

    /// The tutorial state machine.
    pub fn tutorial(&self) -> &TutorialController<MemoryFlagStore> {
        &self.tutorial
    }

    /// Mutable tutorial access.
    pub fn tutorial_mut(
        &mut self,
    ) -> (&mut TutorialController<MemoryFlagStore>, &mut TrackerEngine) {
        (&mut self.tutorial, &mut self.engine)
    }

    /// Reading handle on the captured terminal events.
    pub fn events(&self) -> &MemorySink {
        &self.events
    }
}
