//! Terminal events - the append-only record stream the engine emits for the
//! renderer, plus the request-URL builder.

use crate::tracker::TrackerId;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Fixed simulated user id embedded in every request URL.
pub const SIMULATED_USER_ID: &str = "12345";

/// Matches JS `encodeURIComponent`: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
/// gets percent-encoded.
const QUERY_DATA: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// What a simulated request claims the user was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestAction {
    PageView,
    Click,
    ProductView,
    Homepage,
    Tutorial,
}

impl RequestAction {
    /// The `action` query-parameter value.
    pub fn wire_name(&self) -> &'static str {
        match self {
            RequestAction::PageView => "pageview",
            RequestAction::Click => "click",
            RequestAction::ProductView => "product_view",
            RequestAction::Homepage => "homepage",
            RequestAction::Tutorial => "tutorial",
        }
    }
}

/// Builds the simulated outbound request URL:
/// `https://{domain}/track?user=12345&action={action}[&data={encoded}]&time={epoch-ms}`
pub fn request_url(
    domain: &str,
    action: RequestAction,
    data: Option<&str>,
    epoch_ms: u64,
) -> String {
    let mut url = format!(
        "https://{}/track?user={}&action={}",
        domain,
        SIMULATED_USER_ID,
        action.wire_name()
    );
    if let Some(data) = data {
        url.push_str("&data=");
        url.push_str(&utf8_percent_encode(data, QUERY_DATA).to_string());
    }
    url.push_str(&format!("&time={}", epoch_ms));
    url
}

/// One record in the append-only terminal log.
///
/// `RequestsNeutralized` carries no text of its own; it instructs the
/// renderer to restyle that tracker's pending request lines and drop their
/// block affordances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminalEvent {
    /// `$ Monitoring network traffic...`
    MonitoringStarted,

    /// `$ Waiting for activity...`
    Waiting,

    /// A simulated outbound call, rendered with a block affordance
    Request { tracker: TrackerId, url: String },

    /// All pending request lines for this tracker become inert
    RequestsNeutralized { tracker: TrackerId },

    /// Success notice after a block action
    Blocked { tracker: TrackerId, name: String },

    /// Success notice after a code deletion
    CodeDeleted { tracker: TrackerId, company: String },

    /// Final win/lose notice
    GameOver { won: bool, still_active: u32 },
}

impl TerminalEvent {
    /// The terminal line for this event, or `None` for pure restyle
    /// instructions.
    pub fn text(&self) -> Option<String> {
        match self {
            TerminalEvent::MonitoringStarted => {
                Some("$ Monitoring network traffic...".to_string())
            }
            TerminalEvent::Waiting => Some("$ Waiting for activity...".to_string()),
            TerminalEvent::Request { url, .. } => Some(format!("→ GET {}", url)),
            TerminalEvent::RequestsNeutralized { .. } => None,
            TerminalEvent::Blocked { name, .. } => Some(format!(
                "✓ BLOCKED: All requests to {} have been blocked!",
                name
            )),
            TerminalEvent::CodeDeleted { company, .. } => Some(format!(
                "✓ CODE DELETED: {} tracking pixel removed from HTML!",
                company
            )),
            TerminalEvent::GameOver { won: true, .. } => {
                Some("$ Game Over - All trackers blocked!".to_string())
            }
            TerminalEvent::GameOver {
                won: false,
                still_active,
            } => Some(format!(
                "$ Game Over - {} tracker(s) still active",
                still_active
            )),
        }
    }
}

/// Append-only sink the engine writes its display records to.
///
/// The engine never reads the sink back; display state lives with the
/// renderer.
pub trait LogSink: Send {
    /// Appends one event record.
    fn append(&mut self, event: TerminalEvent);
}

/// Sink that keeps every event in memory behind a shared handle.
///
/// Clones share the same buffer, so a test or the simulation harness can
/// keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TerminalEvent>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    pub fn events(&self) -> Vec<TerminalEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of captured events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// True if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns all captured events.
    pub fn drain(&self) -> Vec<TerminalEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, event: TerminalEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Sink that forwards events to the dashboard over a crossbeam channel.
#[cfg(feature = "dashboard")]
pub struct ChannelSink {
    tx: crossbeam::channel::Sender<TerminalEvent>,
}

#[cfg(feature = "dashboard")]
impl ChannelSink {
    /// Wraps a channel sender.
    pub fn new(tx: crossbeam::channel::Sender<TerminalEvent>) -> Self {
        Self { tx }
    }
}

#[cfg(feature = "dashboard")]
impl LogSink for ChannelSink {
    fn append(&mut self, event: TerminalEvent) {
        // Receiver gone means the dashboard closed; nothing left to display.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_without_data() {
        let url = request_url("analytics.com", RequestAction::PageView, None, 1_700_000_000_000);
        assert_eq!(
            url,
            "https://analytics.com/track?user=12345&action=pageview&time=1700000000000"
        );
    }

    #[test]
    fn test_request_url_encodes_data() {
        let url = request_url(
            "adnetwork.com",
            RequestAction::Click,
            Some("Smartphone Pro"),
            7,
        );
        assert_eq!(
            url,
            "https://adnetwork.com/track?user=12345&action=click&data=Smartphone%20Pro&time=7"
        );
    }

    #[test]
    fn test_request_url_keeps_unreserved_marks() {
        let url = request_url("databroker.com", RequestAction::Tutorial, Some("a-b_c.d!"), 0);
        assert!(url.contains("&data=a-b_c.d!&"));
    }

    #[test]
    fn test_event_text() {
        let event = TerminalEvent::Blocked {
            tracker: TrackerId(1),
            name: "analytics.com".to_string(),
        };
        assert_eq!(
            event.text().unwrap(),
            "✓ BLOCKED: All requests to analytics.com have been blocked!"
        );

        assert!(TerminalEvent::RequestsNeutralized {
            tracker: TrackerId(1)
        }
        .text()
        .is_none());
    }

    #[test]
    fn test_memory_sink_shares_buffer_across_clones() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.append(TerminalEvent::MonitoringStarted);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0], TerminalEvent::MonitoringStarted);
    }
}
