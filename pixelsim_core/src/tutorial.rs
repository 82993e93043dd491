//! The Guided Tutorial Controller.
//!
//! An ordered sequence of explanatory steps, each optionally anchored to a
//! page region for the spotlight effect and optionally gated on a real
//! simulation event (a product click, a code deletion, a network block).
//! Completing the terminal step hands control to the simulation engine by
//! scheduling its `start()`.
//!
//! All delays (auto-advance after a gated event, the auto-start after
//! completion) are deferred one-shot actions fired by [`TutorialController::poll`]
//! against the injected clock, never blocking sleeps.

use crate::placement::{compute_placement, Placement, PreferredSide, Rect, Viewport};
use crate::tracker::TrackerId;

use pixelsim_env::FlagStore;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Durable flag key marking the tutorial as completed.
pub const COMPLETED_FLAG: &str = "tutorial_completed";

/// Delay between a satisfied gate and the automatic advance, giving the
/// user visual confirmation before the view changes.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(500);

/// Delay between tutorial completion and the engine auto-start.
pub const AUTO_START_DELAY: Duration = Duration::from_millis(500);

/// Delay before the block-gated step injects its sample request.
pub const SAMPLE_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// The external event a gated step waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// The user opened a product detail page
    ProductClick,
    /// The user deleted a tracking-code line
    CodeDelete,
    /// The user clicked a block affordance on a request line
    NetworkBlock,
}

/// The narrow capability interface the tutorial holds on the engine.
///
/// The tutorial only reads tracker state and invokes these operations; it
/// never mutates engine fields directly.
pub trait EngineControl {
    /// Starts the timed run.
    fn start_run(&mut self);

    /// Resets the run to idle.
    fn reset_run(&mut self);

    /// Allows (or stops allowing) neutralization actions while no run is
    /// active, so gated steps work before the timed challenge starts.
    fn set_override_active(&mut self, active: bool);

    /// Whether the given tracker is currently blocked.
    fn tracker_blocked(&self, id: TrackerId) -> bool;

    /// Injects one sample tutorial request for the given tracker.
    fn emit_sample_request(&mut self, id: TrackerId);
}

/// One step of the guided tour.
#[derive(Debug, Clone)]
pub struct TutorialStep {
    pub title: &'static str,
    pub body: &'static str,
    pub icon: &'static str,

    /// Selector of the page region to spotlight, if any
    pub anchor: Option<&'static str>,

    /// Preferred panel position relative to the anchor
    pub placement: PreferredSide,

    /// External event required before this step advances
    pub gate: Option<GateAction>,

    /// Label for the next button (`None` uses the default)
    pub next_label: Option<&'static str>,

    /// Completing this step finishes the tutorial and auto-starts the run
    pub terminal: bool,
}

impl TutorialStep {
    fn new(title: &'static str, body: &'static str, icon: &'static str) -> Self {
        Self {
            title,
            body,
            icon,
            anchor: None,
            placement: PreferredSide::Center,
            gate: None,
            next_label: None,
            terminal: false,
        }
    }

    fn anchored(mut self, selector: &'static str, placement: PreferredSide) -> Self {
        self.anchor = Some(selector);
        self.placement = placement;
        self
    }

    fn gated(mut self, gate: GateAction) -> Self {
        self.gate = Some(gate);
        self
    }

    fn labeled(mut self, label: &'static str) -> Self {
        self.next_label = Some(label);
        self
    }

    fn terminal_step(mut self) -> Self {
        self.terminal = true;
        self
    }
}

/// The canonical tutorial script.
pub fn default_steps() -> Vec<TutorialStep> {
    vec![
        TutorialStep::new(
            "Welcome to Pixel Tracking Simulator!",
            "This interactive tutorial will teach you how websites track you \
             online and how to protect yourself. You'll learn step-by-step how \
             tracking works, going through each section one by one.",
            "🎓",
        )
        .labeled("Let's Start!"),
        TutorialStep::new(
            "Game Instructions",
            "First, let's understand your mission. You'll have 45 seconds to \
             stop tracking by either deleting tracking code or blocking network \
             requests. Let's explore how tracking works step by step.",
            "🎯",
        )
        .anchored(".instructions", PreferredSide::BottomForced)
        .labeled("Next Section"),
        TutorialStep::new(
            "The Shopping Website",
            "This is what you see as a regular user - a normal shopping \
             website. Click 'View Details' on any product to see more info. \
             Behind the scenes, invisible tracking is happening with every \
             interaction!",
            "🛍️",
        )
        .anchored(".left-panel", PreferredSide::Right)
        .gated(GateAction::ProductClick),
        TutorialStep::new(
            "The Hidden HTML Code",
            "Look at this HTML code section! These highlighted lines are \
             TRACKING PIXELS - invisible 1x1 pixel images and scripts that \
             collect your data. There are 3 different trackers here from \
             different companies.",
            "💻",
        )
        .anchored(".code-section", PreferredSide::Left)
        .labeled("Next Section"),
        TutorialStep::new(
            "Understanding the Trackers",
            "Each tracking line sends data to a different company: Analytics \
             Tracker (measures your behavior), Ad Network (targets ads to \
             you), and Data Broker (sells your info). They all run silently \
             in the background.",
            "🔍",
        )
        .anchored(".tracking-line", PreferredSide::Left)
        .labeled("Next Section"),
        TutorialStep::new(
            "Network Requests",
            "This terminal shows NETWORK REQUESTS - when the tracking pixels \
             'call home' to send your data. Every line shows a request being \
             sent to a tracking company with your information.",
            "🌐",
        )
        .anchored(".terminal-section", PreferredSide::Left)
        .labeled("Next Section"),
        TutorialStep::new(
            "Your Private Data",
            "This shows exactly what data is being collected: your IP \
             address, browser type, location, and browsing behavior. All of \
             this is sent to third parties without your explicit consent!",
            "📱",
        )
        .anchored(".data-section", PreferredSide::Left)
        .labeled("How Do I Stop This?"),
        TutorialStep::new(
            "Delete the Tracking Code",
            "The first defense: remove the tracker at the source. Click the \
             delete button on any highlighted tracking line to rip it out of \
             the page. Try it now!",
            "🗑️",
        )
        .anchored(".code-section", PreferredSide::Left)
        .gated(GateAction::CodeDelete),
        TutorialStep::new(
            "Block Network Requests",
            "The second defense: let the code run but block its calls home. \
             A sample request is about to appear in the terminal - click its \
             [ BLOCK ] link to stop it!",
            "🚫",
        )
        .anchored(".terminal-section", PreferredSide::Left)
        .gated(GateAction::NetworkBlock),
        TutorialStep::new(
            "Your Mission",
            "You now know both ways to neutralize a tracker. When the game \
             starts you'll have 45 seconds to stop all 3 trackers before they \
             leak your data. Good luck!",
            "🏁",
        )
        .anchored(".game-stats", PreferredSide::Bottom)
        .labeled("Start the Game!")
        .terminal_step(),
    ]
}

/// Tutorial lifecycle: `NotStarted -> Active(step) -> Completed`, with
/// `Completed` durable across instantiations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialPhase {
    NotStarted,
    Active,
    Completed,
}

/// Display payload for the current step.
#[derive(Debug, Clone)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    pub icon: &'static str,
    pub title: &'static str,
    pub body: &'static str,

    /// Previous button shown
    pub prev_visible: bool,

    /// Next button label; `None` when the step is gated (advancement comes
    /// from the gated event, not a click)
    pub next_label: Option<&'static str>,

    pub anchor: Option<&'static str>,
    pub placement: PreferredSide,
}

/// A scheduled one-shot action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Advance past the current (gated) step
    Advance,
    /// Start the timed run after completion
    StartRun,
    /// Inject the sample request for the block-gated step
    SampleRequest,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: Duration,
    action: Deferred,
}

/// The tutorial state machine.
pub struct TutorialController<F: FlagStore> {
    steps: Vec<TutorialStep>,
    index: usize,
    phase: TutorialPhase,
    flags: F,
    pending: Vec<Pending>,

    /// The current step's gate has not fired yet
    gate_armed: bool,
}

impl<F: FlagStore> TutorialController<F> {
    /// Creates a controller; a durable completed flag puts it straight into
    /// `Completed`.
    pub fn new(steps: Vec<TutorialStep>, flags: F) -> Self {
        let completed = flags.get(COMPLETED_FLAG).unwrap_or_else(|e| {
            warn!("failed to read tutorial flag: {e}");
            false
        });
        Self {
            steps,
            index: 0,
            phase: if completed {
                TutorialPhase::Completed
            } else {
                TutorialPhase::NotStarted
            },
            flags,
            pending: Vec::new(),
            gate_armed: false,
        }
    }

    /// Controller over the canonical step script.
    pub fn with_default_steps(flags: F) -> Self {
        Self::new(default_steps(), flags)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Activates the tutorial at step 0. No-op if already completed.
    pub fn start(&mut self, engine: &mut dyn EngineControl, now: Duration) {
        if self.phase == TutorialPhase::Completed {
            debug!("tutorial start ignored: already completed");
            return;
        }
        self.phase = TutorialPhase::Active;
        engine.set_override_active(true);
        self.show_step(0, engine, now);
        info!(steps = self.steps.len(), "tutorial started");
    }

    /// Advances to the next step, completes on the last one, and on the
    /// terminal step completes with auto-start. Ignored while the current
    /// step's gate is still armed.
    pub fn next_step(&mut self, engine: &mut dyn EngineControl, now: Duration) {
        if self.phase != TutorialPhase::Active {
            return;
        }
        if self.gate_armed {
            debug!(step = self.index, "next ignored: step is gated");
            return;
        }
        self.advance(engine, now);
    }

    /// Steps back. No-op at step 0.
    pub fn previous_step(&mut self, engine: &mut dyn EngineControl, now: Duration) {
        if self.phase != TutorialPhase::Active || self.index == 0 {
            return;
        }
        self.show_step(self.index - 1, engine, now);
    }

    /// Skips the tutorial. The caller is responsible for having confirmed
    /// with the user; an unconfirmed call is ignored.
    ///
    /// Skipping never auto-starts the timed run, even from the terminal
    /// step: skip is an explicit opt-out of the walkthrough.
    pub fn skip(&mut self, engine: &mut dyn EngineControl, confirmed: bool) {
        if self.phase != TutorialPhase::Active || !confirmed {
            return;
        }
        info!(step = self.index, "tutorial skipped");
        self.complete(engine);
    }

    /// Clears the durable completed flag and reopens the tutorial at step 0.
    pub fn reset(&mut self, engine: &mut dyn EngineControl, now: Duration) {
        if let Err(e) = self.flags.clear(COMPLETED_FLAG) {
            warn!("failed to clear tutorial flag: {e}");
        }
        self.pending.clear();
        self.phase = TutorialPhase::Active;
        engine.set_override_active(true);
        self.show_step(0, engine, now);
        info!("tutorial reset to step 0");
    }

    /// Reports a gate-relevant event. If the current step is waiting for
    /// it, the gate disarms and an auto-advance is scheduled.
    pub fn notify(&mut self, action: GateAction, now: Duration) {
        if self.phase != TutorialPhase::Active || !self.gate_armed {
            return;
        }
        if self.steps[self.index].gate != Some(action) {
            return;
        }
        self.gate_armed = false;
        self.pending.push(Pending {
            due: now + AUTO_ADVANCE_DELAY,
            action: Deferred::Advance,
        });
        debug!(step = self.index, ?action, "gate satisfied, advance scheduled");
    }

    /// Fires any deferred actions that have come due. Call this once per
    /// render/tick pass.
    pub fn poll(&mut self, engine: &mut dyn EngineControl, now: Duration) {
        let due: Vec<Deferred> = {
            let (ready, waiting): (Vec<Pending>, Vec<Pending>) =
                self.pending.drain(..).partition(|p| p.due <= now);
            self.pending = waiting;
            ready.into_iter().map(|p| p.action).collect()
        };

        for action in due {
            match action {
                Deferred::Advance => {
                    if self.phase == TutorialPhase::Active {
                        self.advance(engine, now);
                    }
                }
                Deferred::StartRun => engine.start_run(),
                Deferred::SampleRequest => {
                    let first = TrackerId(1);
                    if self.phase == TutorialPhase::Active && !engine.tracker_blocked(first) {
                        engine.emit_sample_request(first);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn advance(&mut self, engine: &mut dyn EngineControl, now: Duration) {
        let step = &self.steps[self.index];
        if step.terminal {
            self.complete(engine);
            self.pending.push(Pending {
                due: now + AUTO_START_DELAY,
                action: Deferred::StartRun,
            });
            info!("tutorial completed, run auto-start scheduled");
        } else if self.index + 1 < self.steps.len() {
            self.show_step(self.index + 1, engine, now);
        } else {
            // Last step without the terminal flag: complete quietly
            self.complete(engine);
        }
    }

    fn show_step(&mut self, index: usize, engine: &mut dyn EngineControl, now: Duration) {
        self.index = index;
        let step = &self.steps[index];
        self.gate_armed = step.gate.is_some();

        // Leaving a step drops its scheduled advance/sample, never a
        // pending run start.
        self.pending.retain(|p| p.action == Deferred::StartRun);

        if step.gate == Some(GateAction::NetworkBlock) && !engine.tracker_blocked(TrackerId(1)) {
            self.pending.push(Pending {
                due: now + SAMPLE_REQUEST_DELAY,
                action: Deferred::SampleRequest,
            });
        }
        debug!(step = index, gated = self.gate_armed, "showing tutorial step");
    }

    fn complete(&mut self, engine: &mut dyn EngineControl) {
        self.phase = TutorialPhase::Completed;
        self.gate_armed = false;
        self.pending.clear();
        engine.set_override_active(false);
        if let Err(e) = self.flags.set(COMPLETED_FLAG, true) {
            warn!("failed to persist tutorial flag: {e}");
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// Current phase.
    pub fn phase(&self) -> TutorialPhase {
        self.phase
    }

    /// True while steps are being shown.
    pub fn is_active(&self) -> bool {
        self.phase == TutorialPhase::Active
    }

    /// Current 0-based step index.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Display payload for the current step, or `None` when inactive.
    pub fn step_view(&self) -> Option<StepView> {
        if self.phase != TutorialPhase::Active {
            return None;
        }
        let step = &self.steps[self.index];
        Some(StepView {
            index: self.index,
            total: self.steps.len(),
            icon: step.icon,
            title: step.title,
            body: step.body,
            prev_visible: self.index > 0,
            next_label: if step.gate.is_some() {
                None
            } else {
                Some(step.next_label.unwrap_or("Next →"))
            },
            anchor: step.anchor,
            placement: step.placement,
        })
    }

    /// Panel placement for the current step given the resolved anchor
    /// rectangle. A `None` rect (selector matched nothing) degrades to a
    /// centered panel instead of failing the step.
    pub fn placement_for(&self, anchor_rect: Option<Rect>, viewport: Viewport) -> Placement {
        let side = self
            .step_view()
            .map(|v| v.placement)
            .unwrap_or(PreferredSide::Center);
        compute_placement(side, anchor_rect, viewport)
    }
}
