//! Session state - the mutable record of one timed run.

use serde::{Deserialize, Serialize};

/// State machine for one run of the simulation engine.
///
/// `Idle -> Active -> {Won | Lost} -> Idle`; reset returns to `Idle` from any
/// state, and `start()` re-enters `Active` from `Idle` or either terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// No timed run in progress
    Idle,
    /// Countdown running, trackers leaking data
    Active,
    /// All trackers neutralized in time
    Won,
    /// The countdown reached zero first
    Lost,
}

impl RunPhase {
    /// True while a timed run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, RunPhase::Active)
    }

    /// True once the run has ended, win or lose.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Won | RunPhase::Lost)
    }
}

/// The mutable counters of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Seconds left before the run is lost
    pub time_remaining: u32,

    /// Count of trackers with `blocked == true`; monotonically
    /// non-decreasing within a run, bounded by the roster size
    pub trackers_blocked: u32,

    /// Synthetic exfiltration accumulator, 0.5 KB per active tracker second
    pub data_leaked_kb: f64,

    /// Seconds elapsed since the run started
    pub time_on_site: u32,
}

impl SessionState {
    /// Fresh counters for a run with the given time limit.
    pub fn new(time_limit_secs: u32) -> Self {
        Self {
            time_remaining: time_limit_secs,
            trackers_blocked: 0,
            data_leaked_kb: 0.0,
            time_on_site: 0,
        }
    }
}

/// Display severity for a stat, mirroring the color thresholds of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Formatted stats payload handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// `"{n}s"` countdown display
    pub timer: String,
    pub timer_severity: Severity,

    /// `"{blocked}/{total}"` display
    pub blocked: String,

    /// One-decimal `"{x.x} KB"` display
    pub data_leaked: String,
    pub leak_severity: Severity,

    /// `"{n}s"` time-on-site display
    pub time_on_site: String,
}

impl StatsSnapshot {
    /// Builds the display payload from the raw counters.
    pub fn from_session(session: &SessionState, total_trackers: u32) -> Self {
        let timer_severity = if session.time_remaining <= 15 {
            Severity::Critical
        } else if session.time_remaining <= 30 {
            Severity::Warning
        } else {
            Severity::Normal
        };

        let leak_severity = if session.data_leaked_kb > 20.0 {
            Severity::Critical
        } else if session.data_leaked_kb > 10.0 {
            Severity::Warning
        } else {
            Severity::Normal
        };

        Self {
            timer: format!("{}s", session.time_remaining),
            timer_severity,
            blocked: format!("{}/{}", session.trackers_blocked, total_trackers),
            data_leaked: format!("{:.1} KB", session.data_leaked_kb),
            leak_severity,
            time_on_site: format!("{}s", session.time_on_site),
        }
    }
}

/// Terminal win/lose payload, readable until the next start or reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Whether all trackers were neutralized before the countdown hit zero
    pub won: bool,

    /// Seconds left at the instant the run ended (meaningful on a win)
    pub time_remaining: u32,

    /// Trackers neutralized during the run
    pub trackers_blocked: u32,

    /// Trackers still active at the end (meaningful on a loss)
    pub unblocked: u32,

    /// Total synthetic data leaked over the run
    pub data_leaked_kb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_counters() {
        let session = SessionState::new(45);
        assert_eq!(session.time_remaining, 45);
        assert_eq!(session.trackers_blocked, 0);
        assert_eq!(session.data_leaked_kb, 0.0);
        assert_eq!(session.time_on_site, 0);
    }

    #[test]
    fn test_snapshot_formatting() {
        let mut session = SessionState::new(45);
        session.trackers_blocked = 2;
        session.data_leaked_kb = 7.25;
        session.time_on_site = 12;

        let snap = StatsSnapshot::from_session(&session, 3);
        assert_eq!(snap.timer, "45s");
        assert_eq!(snap.blocked, "2/3");
        assert_eq!(snap.data_leaked, "7.2 KB");
        assert_eq!(snap.time_on_site, "12s");
    }

    #[test]
    fn test_timer_severity_thresholds() {
        let mut session = SessionState::new(45);
        assert_eq!(
            StatsSnapshot::from_session(&session, 3).timer_severity,
            Severity::Normal
        );

        session.time_remaining = 30;
        assert_eq!(
            StatsSnapshot::from_session(&session, 3).timer_severity,
            Severity::Warning
        );

        session.time_remaining = 15;
        assert_eq!(
            StatsSnapshot::from_session(&session, 3).timer_severity,
            Severity::Critical
        );
    }

    #[test]
    fn test_leak_severity_thresholds() {
        let mut session = SessionState::new(45);
        session.data_leaked_kb = 10.5;
        assert_eq!(
            StatsSnapshot::from_session(&session, 3).leak_severity,
            Severity::Warning
        );

        session.data_leaked_kb = 20.5;
        assert_eq!(
            StatsSnapshot::from_session(&session, 3).leak_severity,
            Severity::Critical
        );
    }

    #[test]
    fn test_run_phase_queries() {
        assert!(RunPhase::Active.is_active());
        assert!(!RunPhase::Idle.is_active());
        assert!(RunPhase::Won.is_terminal());
        assert!(RunPhase::Lost.is_terminal());
        assert!(!RunPhase::Active.is_terminal());
    }
}
