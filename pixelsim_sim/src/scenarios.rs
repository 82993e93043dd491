//! Deterministic test scenarios for the tracking simulator.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// All three trackers neutralized in the opening seconds
    SpeedRun,

    /// No user action at all until the timer expires
    Timeout,

    /// Delete a tracker's code, then try to block the same tracker
    DeleteThenBlock,

    /// Final tracker neutralized on the last remaining second
    LastSecondSave,

    /// Actions arriving after the run has already ended
    StaleControls,

    /// Full-length idle run, checking the request emission cap
    RequestFlood,

    /// Complete tutorial walkthrough ending in an auto-started run
    TutorialWalkthrough,

    /// Tutorial skipped partway through; the run must not auto-start
    TutorialSkip,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SpeedRun,
            ScenarioId::Timeout,
            ScenarioId::DeleteThenBlock,
            ScenarioId::LastSecondSave,
            ScenarioId::StaleControls,
            ScenarioId::RequestFlood,
            ScenarioId::TutorialWalkthrough,
            ScenarioId::TutorialSkip,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SpeedRun => "speed_run",
            ScenarioId::Timeout => "timeout",
            ScenarioId::DeleteThenBlock => "delete_then_block",
            ScenarioId::LastSecondSave => "last_second_save",
            ScenarioId::StaleControls => "stale_controls",
            ScenarioId::RequestFlood => "request_flood",
            ScenarioId::TutorialWalkthrough => "tutorial_walkthrough",
            ScenarioId::TutorialSkip => "tutorial_skip",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SpeedRun => "Neutralize all 3 trackers immediately, verify early win",
            ScenarioId::Timeout => "Idle for the whole run, verify loss and full leak accrual",
            ScenarioId::DeleteThenBlock => {
                "Delete code then block the same tracker, verify single count"
            }
            ScenarioId::LastSecondSave => "Win with 1 second remaining, verify no spurious timeout",
            ScenarioId::StaleControls => "Fire actions after game over, verify frozen outcome",
            ScenarioId::RequestFlood => "Idle full run, verify the periodic request cap holds",
            ScenarioId::TutorialWalkthrough => {
                "Walk every tutorial step through its gates, verify auto-start"
            }
            ScenarioId::TutorialSkip => "Skip mid-tutorial, verify durable flag and no auto-start",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "speed_run" | "speedrun" => Ok(ScenarioId::SpeedRun),
            "timeout" => Ok(ScenarioId::Timeout),
            "delete_then_block" | "deletethenblock" => Ok(ScenarioId::DeleteThenBlock),
            "last_second_save" | "lastsecondsave" => Ok(ScenarioId::LastSecondSave),
            "stale_controls" | "stalecontrols" => Ok(ScenarioId::StaleControls),
            "request_flood" | "requestflood" => Ok(ScenarioId::RequestFlood),
            "tutorial_walkthrough" | "tutorialwalkthrough" => Ok(ScenarioId::TutorialWalkthrough),
            "tutorial_skip" | "tutorialskip" => Ok(ScenarioId::TutorialSkip),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
        }
    }
}
