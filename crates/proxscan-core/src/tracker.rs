//! Proximity reporting.
//!
//! A rendezvous service only needs a new proximity report when the set of
//! visible access points changes. The tracker remembers the BSSIDs of the
//! report currently being sent and of the last one the service acknowledged.

use std::collections::BTreeSet;

use crate::types::{Entry, ProximityMessage};

/// Tracks which BSSID set was last reported upstream.
#[derive(Debug, Default, Clone)]
pub struct ProximityTracker {
    in_flight: Option<BTreeSet<String>>,
    last_sent: Option<BTreeSet<String>>,
}

fn bssid_set(entries: &[Entry]) -> BTreeSet<String> {
    entries.iter().map(|e| e.bssid.clone()).collect()
}

impl ProximityTracker {
    /// Create a tracker that has reported nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the report for `entries`.
    ///
    /// Returns `None` for an empty scan, since there is nothing to report.
    /// Otherwise the BSSID set is remembered until [`acknowledge`](Self::acknowledge).
    pub fn compose(&mut self, entries: &[Entry]) -> Option<ProximityMessage> {
        if entries.is_empty() {
            return None;
        }
        self.in_flight = Some(bssid_set(entries));
        Some(ProximityMessage::from_entries(entries))
    }

    /// Whether `entries` differ from the last acknowledged report.
    ///
    /// Order does not matter. Always true before the first acknowledgement.
    #[must_use]
    pub fn has_changed(&self, entries: &[Entry]) -> bool {
        self.last_sent
            .as_ref()
            .map_or(true, |sent| *sent != bssid_set(entries))
    }

    /// Record that the most recently composed report was delivered.
    ///
    /// Returns `false` if nothing was composed since the last acknowledgement.
    pub fn acknowledge(&mut self) -> bool {
        match self.in_flight.take() {
            Some(set) => {
                self.last_sent = Some(set);
                true
            }
            None => false,
        }
    }

    /// Forget everything, e.g. after the upstream connection was re-established.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.last_sent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(bssids: &[&str]) -> Vec<Entry> {
        bssids.iter().map(|b| Entry::new(*b, "", false)).collect()
    }

    #[test]
    fn test_empty_scan_composes_nothing() {
        let mut tracker = ProximityTracker::new();
        assert!(tracker.compose(&[]).is_none());
        assert!(!tracker.acknowledge());
    }

    #[test]
    fn test_changed_until_acknowledged() {
        let mut tracker = ProximityTracker::new();
        let scan = entries(&["a", "b"]);

        assert!(tracker.has_changed(&scan));
        let message = tracker.compose(&scan).unwrap();
        assert_eq!(message.proximity.wifiaps.len(), 2);
        assert!(tracker.has_changed(&scan));

        assert!(tracker.acknowledge());
        assert!(!tracker.has_changed(&scan));
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut tracker = ProximityTracker::new();
        tracker.compose(&entries(&["a", "b"]));
        tracker.acknowledge();

        assert!(!tracker.has_changed(&entries(&["b", "a"])));
        assert!(tracker.has_changed(&entries(&["a"])));
        assert!(tracker.has_changed(&entries(&["a", "b", "c"])));
    }

    #[test]
    fn test_reset_forgets_last_sent() {
        let mut tracker = ProximityTracker::new();
        let scan = entries(&["a"]);
        tracker.compose(&scan);
        tracker.acknowledge();

        tracker.reset();
        assert!(tracker.has_changed(&scan));
    }
}
