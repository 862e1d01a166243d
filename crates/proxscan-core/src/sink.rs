//! Inbound adapter for platform scan completions.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::coordinator::Shared;
use crate::types::{Entry, RawScanResult, ResultSet};

/// Receives the platform's one-shot "scan complete" event.
///
/// Obtained from [`ScanCoordinator::sink`](crate::ScanCoordinator::sink) and
/// handed to the platform adapter. May be called from any thread; it only
/// takes the coordinator's state lock briefly and never waits on a caller.
#[derive(Clone)]
pub struct ScanSink {
    shared: Arc<Shared>,
}

impl fmt::Debug for ScanSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSink").finish_non_exhaustive()
    }
}

impl ScanSink {
    pub(crate) const fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Deliver the records of a completed platform scan.
    ///
    /// The record whose BSSID matches the association at delivery time is
    /// marked attached. An empty delivery still completes the cycle.
    pub fn on_scan_complete(&self, raw: Vec<RawScanResult>) {
        let association = self.shared.platform.current_association();
        let entries = translate(raw, association.as_ref().map(|a| a.bssid.as_str()));
        let count = entries.len();

        let mut state = self.shared.lock();
        state.pending = Some(entries.clone());
        state.ready = true;

        match state.in_flight.take() {
            Some(in_flight) => {
                state.pending_cycle = Some(in_flight.cycle);
                in_flight.done.send_replace(Some(entries));
                debug!(cycle = in_flight.cycle, count, "Scan results delivered");
            }
            None => {
                state.pending_cycle = None;
                info!(count, "Unsolicited scan results cached");
            }
        }
    }
}

/// Translate platform records, marking the one for `attached_bssid`.
fn translate(raw: Vec<RawScanResult>, attached_bssid: Option<&str>) -> ResultSet {
    raw.into_iter()
        .map(|record| {
            let attached = attached_bssid.is_some_and(|bssid| bssid == record.bssid);
            Entry::new(record.bssid, record.ssid, attached)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ScanConfig;
    use crate::coordinator::poll_until_triggered;
    use crate::platform::{MockPlatform, WifiPlatform};
    use crate::types::Association;
    use crate::ScanCoordinator;

    fn sink_with(platform: &Arc<MockPlatform>) -> (ScanCoordinator, ScanSink) {
        let coordinator = ScanCoordinator::new(
            Arc::clone(platform) as Arc<dyn WifiPlatform>,
            &ScanConfig::default(),
        );
        let sink = coordinator.sink();
        (coordinator, sink)
    }

    #[test]
    fn test_translate_marks_only_the_associated_bssid() {
        let entries = translate(
            vec![RawScanResult::new("x", "netX"), RawScanResult::new("y", "netY")],
            Some("y"),
        );
        assert!(!entries[0].attached);
        assert!(entries[1].attached);
        assert_eq!(entries[1].ssid, "netY");
    }

    #[test]
    fn test_translate_without_association() {
        let entries = translate(vec![RawScanResult::new("x", "")], None);
        assert!(!entries[0].attached);
    }

    #[test]
    fn test_translate_preserves_order() {
        let raw: Vec<_> = ["c", "a", "b"]
            .iter()
            .map(|b| RawScanResult::new(*b, ""))
            .collect();
        let bssids: Vec<_> = translate(raw, None).into_iter().map(|e| e.bssid).collect();
        assert_eq!(bssids, ["c", "a", "b"]);
    }

    #[test]
    fn test_unsolicited_delivery_is_cached() {
        let platform = Arc::new(MockPlatform::new());
        let (coordinator, sink) = sink_with(&platform);

        sink.on_scan_complete(vec![RawScanResult::new("x", "")]);

        let state = coordinator.shared_state();
        assert!(state.ready);
        assert_eq!(state.pending_cycle, None);
        assert_eq!(state.pending.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_empty_delivery_sets_ready() {
        let platform = Arc::new(MockPlatform::new());
        let (coordinator, sink) = sink_with(&platform);

        sink.on_scan_complete(Vec::new());

        let state = coordinator.shared_state();
        assert!(state.ready);
        assert_eq!(state.pending, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_association_is_read_at_delivery_time() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_association(Some(Association::new("x", "netX")));
        let (coordinator, sink) = sink_with(&platform);
        // Spend the cold-start shortcut.
        coordinator.scan(false).await;

        let mut fut = tokio_test::task::spawn(coordinator.scan(true));
        poll_until_triggered(&mut fut, &coordinator, || platform.scan_calls()).await;

        platform.set_association(Some(Association::new("y", "netY")));
        sink.on_scan_complete(vec![RawScanResult::new("x", ""), RawScanResult::new("y", "")]);

        let result = tokio::time::timeout(Duration::from_secs(5), fut).await.unwrap();
        assert!(!result[0].attached);
        assert!(result[1].attached);
    }
}
