//! Pixelsim TUI Dashboard Module
//! ==============================
//!
//! Terminal dashboard for the interactive simulator. Uses Ratatui for
//! rendering and Crossbeam for event delivery from the engine.
//!
//! Enable with the `dashboard` feature flag.
//!
//! Panels:
//! - Tracker roster with per-tracker neutralization state
//! - Network terminal feed (the engine's emitted request/block lines)
//! - Stats bar (timer, blocked count, data leaked, time on site)
//! - Tutorial overlay panel while the walkthrough is active

use std::collections::VecDeque;
use std::io::{self, Stdout};

use crossbeam::channel::Receiver;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};

use crate::events::TerminalEvent;
use crate::session::{Severity, StatsSnapshot};
use crate::tracker::Tracker;

/// Terminal feed lines kept on screen.
const FEED_CAPACITY: usize = 100;

// =============================================================================
// TUTORIAL PANEL STATE
// =============================================================================

/// Owned copy of the tutorial step shown in the overlay panel.
#[derive(Debug, Clone)]
pub struct TutorialPanel {
    pub index: usize,
    pub total: usize,
    pub icon: String,
    pub title: String,
    pub body: String,
    /// Next button label, absent while the step waits on a gated action
    pub next_label: Option<String>,
}

// =============================================================================
// GAME DASHBOARD
// =============================================================================

/// TUI dashboard fed by the engine's event channel.
pub struct GameDashboard {
    rx: Receiver<TerminalEvent>,
    feed: VecDeque<TerminalEvent>,
    stats: Option<StatsSnapshot>,
    trackers: Vec<Tracker>,
    tutorial: Option<TutorialPanel>,
    frame_count: usize,
}

impl GameDashboard {
    /// Create a new dashboard with the terminal-event receiver channel.
    pub fn new(rx: Receiver<TerminalEvent>) -> Self {
        Self {
            rx,
            feed: VecDeque::with_capacity(FEED_CAPACITY),
            stats: None,
            trackers: Vec::new(),
            tutorial: None,
            frame_count: 0,
        }
    }

    /// Drain pending engine events into the feed. A `Waiting` event clears
    /// the feed back to the initial prompt, matching a session reset.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            if matches!(event, TerminalEvent::MonitoringStarted) {
                self.feed.clear();
            }
            self.feed.push_back(event);
            while self.feed.len() > FEED_CAPACITY {
                self.feed.pop_front();
            }
        }
    }

    /// Update the stats bar (called from main loop each tick).
    pub fn update_stats(&mut self, stats: StatsSnapshot) {
        self.stats = Some(stats);
    }

    /// Update the tracker roster panel.
    pub fn update_trackers(&mut self, trackers: &[Tracker]) {
        self.trackers = trackers.to_vec();
    }

    /// Show or hide the tutorial overlay panel.
    pub fn update_tutorial(&mut self, panel: Option<TutorialPanel>) {
        self.tutorial = panel;
    }

    /// Render one frame.
    pub fn render(&mut self, f: &mut Frame) {
        self.frame_count += 1;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Stats bar
                Constraint::Length(5), // Tracker roster
                Constraint::Min(5),    // Terminal feed / tutorial
                Constraint::Length(1), // Footer
            ])
            .split(f.area());

        // === HEADER ===
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "🕵️ Pixel Tracking Simulator",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::raw(format!("Frame: {}", self.frame_count)),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(header, chunks[0]);

        self.render_stats(f, chunks[1]);
        self.render_trackers(f, chunks[2]);

        if self.tutorial.is_some() {
            self.render_tutorial(f, chunks[3]);
        } else {
            self.render_feed(f, chunks[3]);
        }

        // === FOOTER ===
        let footer = Paragraph::new(
            "s start | r reset | 1-3 block | 4-6 delete | v view product | n/p/k tutorial | q quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        f.render_widget(footer, chunks[4]);
    }

    fn render_stats(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let stat_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ])
            .split(area);

        let (timer, timer_sev, blocked, leaked, leak_sev, on_site) = match &self.stats {
            Some(s) => (
                s.timer.clone(),
                s.timer_severity,
                s.blocked.clone(),
                s.data_leaked.clone(),
                s.leak_severity,
                s.time_on_site.clone(),
            ),
            None => (
                "--".to_string(),
                Severity::Normal,
                "--".to_string(),
                "--".to_string(),
                Severity::Normal,
                "--".to_string(),
            ),
        };

        let cells = [
            ("Time Left", timer, severity_color(timer_sev)),
            ("Blocked", blocked, Color::Cyan),
            ("Data Leaked", leaked, severity_color(leak_sev)),
            ("Time on Site", on_site, Color::Cyan),
        ];
        for (i, (title, value, color)) in cells.into_iter().enumerate() {
            let widget = Paragraph::new(value)
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .block(Block::default().title(title).borders(Borders::ALL));
            f.render_widget(widget, stat_chunks[i]);
        }
    }

    fn render_trackers(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let header_cells = ["#", "Domain", "Company", "State"]
            .iter()
            .map(|h| Span::styled(*h, Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .trackers
            .iter()
            .map(|t| {
                let (state, color) = if t.code_deleted {
                    ("CODE DELETED", Color::Green)
                } else if t.blocked {
                    ("BLOCKED", Color::Green)
                } else {
                    ("ACTIVE", Color::Red)
                };
                Row::new(vec![
                    Span::raw(t.id.to_string()),
                    Span::raw(t.name.clone()),
                    Span::raw(t.company.clone()),
                    Span::styled(state, Style::default().fg(color)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(28),
                Constraint::Length(20),
                Constraint::Length(14),
            ],
        )
        .header(header)
        .block(Block::default().title("Trackers").borders(Borders::ALL));
        f.render_widget(table, area);
    }

    fn render_feed(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .feed
            .iter()
            .filter_map(|event| event.text().map(|text| (feed_color(event), text)))
            .map(|(color, text)| Line::from(Span::styled(text, Style::default().fg(color))))
            .collect();
        let skip = lines.len().saturating_sub(visible);

        let feed = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
            .block(Block::default().title("Network Monitor").borders(Borders::ALL));
        f.render_widget(feed, area);
    }

    fn render_tutorial(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let panel = match &self.tutorial {
            Some(p) => p,
            None => return,
        };

        let title = format!(
            " {} {} ({}/{}) ",
            panel.icon,
            panel.title,
            panel.index + 1,
            panel.total
        );
        let hint = match &panel.next_label {
            Some(label) => format!("\n\n[n] {}", label),
            None => "\n\n(complete the highlighted action to continue)".to_string(),
        };

        let body = Paragraph::new(format!("{}{}", panel.body, hint))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta)),
            );
        f.render_widget(body, area);
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Normal => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Critical => Color::Red,
    }
}

fn feed_color(event: &TerminalEvent) -> Color {
    match event {
        TerminalEvent::MonitoringStarted | TerminalEvent::Waiting => Color::DarkGray,
        TerminalEvent::Request { .. } => Color::Yellow,
        TerminalEvent::RequestsNeutralized { .. }
        | TerminalEvent::Blocked { .. }
        | TerminalEvent::CodeDeleted { .. } => Color::Green,
        TerminalEvent::GameOver { won: true, .. } => Color::Green,
        TerminalEvent::GameOver { won: false, .. } => Color::Red,
    }
}

// =============================================================================
// TERMINAL SETUP
// =============================================================================

/// Put the terminal into raw + alternate-screen mode.
pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Restore the terminal on exit.
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
