//! Pixelsim - interactive terminal front-end.
//!
//! Wires the tracker engine, the guided tutorial, and the TUI dashboard
//! together: the engine ticks at 1 Hz on the wall clock, terminal events
//! stream to the dashboard over a channel, and the tutorial's completed
//! flag persists in an embedded database next to the binary.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pixelsim_core::dashboard::{restore_terminal, setup_terminal, GameDashboard, TutorialPanel};
use pixelsim_core::engine::{EngineConfig, TrackerEngine};
use pixelsim_core::events::ChannelSink;
use pixelsim_core::storage::SledFlagStore;
use pixelsim_core::tracker::TrackerId;
use pixelsim_core::tutorial::{GateAction, TutorialController, TutorialPhase};
use pixelsim_env::{Clock, SystemClock};

/// Sled database directory for the durable tutorial flag.
const DATA_DIR: &str = "pixelsim_data";

/// Log file next to the binary; the terminal itself belongs to the TUI.
const LOG_FILE: &str = "pixelsim.log";

struct App {
    clock: Arc<SystemClock>,
    engine: TrackerEngine,
    tutorial: TutorialController<SledFlagStore>,
    viewing_product: bool,
}

impl App {
    fn new(tx: crossbeam::channel::Sender<pixelsim_core::events::TerminalEvent>) -> Result<Self> {
        let clock = SystemClock::shared();
        let engine = TrackerEngine::new(
            EngineConfig::default(),
            clock.clone(),
            Box::new(ChannelSink::new(tx)),
        );
        let flags = SledFlagStore::open(DATA_DIR)
            .with_context(|| format!("opening flag store at {DATA_DIR}"))?;
        let tutorial = TutorialController::with_default_steps(flags);
        Ok(Self {
            clock,
            engine,
            tutorial,
            viewing_product: false,
        })
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        let now = self.now();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('s') => self.engine.start(),
            KeyCode::Char('r') => self.engine.reset(),
            KeyCode::Char('t') => self.tutorial.reset(&mut self.engine, now),
            KeyCode::Char('n') => self.tutorial.next_step(&mut self.engine, now),
            KeyCode::Char('p') => self.tutorial.previous_step(&mut self.engine, now),
            KeyCode::Char('k') => self.tutorial.skip(&mut self.engine, true),
            KeyCode::Char('v') => {
                if self.viewing_product {
                    self.engine.return_to_main();
                } else {
                    self.engine.view_product("Wireless Headphones");
                    self.tutorial.notify(GateAction::ProductClick, now);
                }
                self.viewing_product = !self.viewing_product;
            }
            KeyCode::Char(c @ '1'..='3') => {
                let id = TrackerId(c as u8 - b'0');
                if self.engine.block_request(id) {
                    self.tutorial.notify(GateAction::NetworkBlock, now);
                }
            }
            KeyCode::Char(c @ '4'..='6') => {
                let id = TrackerId(c as u8 - b'0' - 3);
                if self.engine.delete_code(id) {
                    self.tutorial.notify(GateAction::CodeDelete, now);
                }
            }
            _ => {}
        }
        true
    }

    fn tutorial_panel(&self) -> Option<TutorialPanel> {
        self.tutorial.step_view().map(|v| TutorialPanel {
            index: v.index,
            total: v.total,
            icon: v.icon.to_string(),
            title: v.title.to_string(),
            body: v.body.to_string(),
            next_label: v.next_label.map(|l| l.to_string()),
        })
    }
}

fn run(app: &mut App, dashboard: &mut GameDashboard) -> Result<()> {
    let mut terminal = setup_terminal().context("entering TUI mode")?;

    // First launch opens the tutorial; returning players go straight to
    // the idle simulator.
    if app.tutorial.phase() == TutorialPhase::NotStarted {
        let now = app.now();
        app.tutorial.start(&mut app.engine, now);
    }

    let mut last_tick = Instant::now();
    let result = loop {
        let now = app.now();
        app.tutorial.poll(&mut app.engine, now);

        if last_tick.elapsed() >= Duration::from_secs(1) {
            app.engine.tick();
            last_tick += Duration::from_secs(1);
        }

        dashboard.drain_events();
        dashboard.update_stats(app.engine.stats());
        dashboard.update_trackers(app.engine.trackers());
        dashboard.update_tutorial(app.tutorial_panel());

        if let Err(e) = terminal.draw(|f| dashboard.render(f)) {
            break Err(e.into());
        }

        match event::poll(Duration::from_millis(50)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if !app.handle_key(key.code) {
                        break Ok(());
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }
    };

    restore_terminal(&mut terminal).context("restoring terminal")?;
    result
}

fn main() -> Result<()> {
    let log_file = std::fs::File::create(LOG_FILE)
        .with_context(|| format!("creating log file {LOG_FILE}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    info!("Pixelsim starting");

    let (tx, rx) = crossbeam::channel::unbounded();
    let mut app = App::new(tx)?;
    let mut dashboard = GameDashboard::new(rx);

    run(&mut app, &mut dashboard)?;

    info!("Pixelsim exiting");
    Ok(())
}
