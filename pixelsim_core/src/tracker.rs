//! Tracker roster - the three simulated third-party tracking scripts.
//!
//! Every run uses the same fixed roster; the tracker instances persist for
//! the whole session and only their neutralization flags change.

use serde::{Deserialize, Serialize};

/// Stable identity of a tracker within the fixed roster (1-based, matches
/// the rendered tracking-code lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerId(pub u8);

impl std::fmt::Display for TrackerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One simulated third-party tracking script embedded in the shop page.
///
/// # Invariant
///
/// `code_deleted == true` implies `blocked == true`: removing the code also
/// silences the tracker. The only mutators are [`Tracker::block`],
/// [`Tracker::delete_code`] and [`Tracker::reset`], all of which preserve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracker {
    /// Stable identity
    pub id: TrackerId,

    /// Domain the tracker phones home to
    pub name: String,

    /// Display label of the company behind it
    pub company: String,

    /// The HTML snippet this tracker hides in the page source
    pub code: String,

    /// New requests from this tracker are suppressed
    pub blocked: bool,

    /// The tracking snippet has been removed from the page
    pub code_deleted: bool,
}

impl Tracker {
    fn new(id: u8, name: &str, company: &str, code: &str) -> Self {
        Self {
            id: TrackerId(id),
            name: name.to_string(),
            company: company.to_string(),
            code: code.to_string(),
            blocked: false,
            code_deleted: false,
        }
    }

    /// True once the tracker can no longer emit requests.
    pub fn neutralized(&self) -> bool {
        self.blocked || self.code_deleted
    }

    /// Blocks the tracker's network requests.
    pub fn block(&mut self) {
        self.blocked = true;
    }

    /// Deletes the tracking code. Deletion subsumes blocking.
    pub fn delete_code(&mut self) {
        self.code_deleted = true;
        self.blocked = true;
    }

    /// Clears both neutralization flags for a fresh run.
    pub fn reset(&mut self) {
        self.blocked = false;
        self.code_deleted = false;
    }
}

/// The canonical three-tracker roster: an analytics script, an ad-network
/// pixel loader and a data broker's invisible 1x1 image.
pub fn default_roster() -> Vec<Tracker> {
    vec![
        Tracker::new(
            1,
            "analytics.com",
            "Analytics Tracker",
            r#"<script src="https://analytics.com/track.js?site=shopeasy"></script>"#,
        ),
        Tracker::new(
            2,
            "adnetwork.com",
            "Ad Network",
            r#"<script src="https://adnetwork.com/pixel.js?id=12345&ref=shopeasy"></script>"#,
        ),
        Tracker::new(
            3,
            "databroker.com",
            "Data Broker",
            r#"<img src="https://databroker.com/collect?id=12345" width="1" height="1" alt="" />"#,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_has_three_trackers() {
        let roster = default_roster();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].id, TrackerId(1));
        assert_eq!(roster[2].name, "databroker.com");
        assert!(roster.iter().all(|t| !t.neutralized()));
    }

    #[test]
    fn test_delete_implies_blocked() {
        let mut tracker = default_roster().remove(0);
        tracker.delete_code();
        assert!(tracker.code_deleted);
        assert!(tracker.blocked);
        assert!(tracker.neutralized());
    }

    #[test]
    fn test_block_does_not_delete() {
        let mut tracker = default_roster().remove(1);
        tracker.block();
        assert!(tracker.blocked);
        assert!(!tracker.code_deleted);
    }

    #[test]
    fn test_reset_clears_flags() {
        let mut tracker = default_roster().remove(2);
        tracker.delete_code();
        tracker.reset();
        assert!(!tracker.blocked);
        assert!(!tracker.code_deleted);
    }
}
