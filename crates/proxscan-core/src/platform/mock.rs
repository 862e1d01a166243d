//! Scripted platform for tests and development without a Wi-Fi adapter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::WifiPlatform;
use crate::sink::ScanSink;
use crate::types::{Association, RawScanResult};

/// Results the mock hands to its sink after each accepted or refused scan.
#[derive(Debug, Clone)]
struct AutoDelivery {
    results: Vec<RawScanResult>,
    delay: Duration,
}

/// A [`WifiPlatform`] whose behaviour is set by the caller.
///
/// By default the radio is on, scans are accepted, there is no association
/// and nothing is ever delivered.
#[derive(Debug)]
pub struct MockPlatform {
    radio_enabled: AtomicBool,
    scan_accepted: AtomicBool,
    scan_calls: AtomicUsize,
    association: Mutex<Option<Association>>,
    auto_delivery: Mutex<Option<AutoDelivery>>,
    sink: OnceLock<ScanSink>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a mock with the radio on and no association.
    #[must_use]
    pub fn new() -> Self {
        Self {
            radio_enabled: AtomicBool::new(true),
            scan_accepted: AtomicBool::new(true),
            scan_calls: AtomicUsize::new(0),
            association: Mutex::new(None),
            auto_delivery: Mutex::new(None),
            sink: OnceLock::new(),
        }
    }

    /// Attach the sink that receives deliveries. Later calls are ignored.
    pub fn attach(&self, sink: ScanSink) {
        let _ = self.sink.set(sink);
    }

    /// Turn the radio on or off.
    pub fn set_radio_enabled(&self, enabled: bool) {
        self.radio_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Choose what `start_scan` returns.
    pub fn set_scan_accepted(&self, accepted: bool) {
        self.scan_accepted.store(accepted, Ordering::SeqCst);
    }

    /// Set or clear the current association.
    pub fn set_association(&self, association: Option<Association>) {
        *self
            .association
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = association;
    }

    /// Deliver `results` from a background thread `delay` after every scan request.
    pub fn deliver_on_scan(&self, results: Vec<RawScanResult>, delay: Duration) {
        *self
            .auto_delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(AutoDelivery { results, delay });
    }

    /// Deliver `results` to the attached sink on the calling thread.
    pub fn deliver(&self, results: Vec<RawScanResult>) {
        if let Some(sink) = self.sink.get() {
            sink.on_scan_complete(results);
        }
    }

    /// Number of `start_scan` calls so far.
    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }
}

impl WifiPlatform for MockPlatform {
    fn radio_enabled(&self) -> bool {
        self.radio_enabled.load(Ordering::SeqCst)
    }

    fn start_scan(&self) -> bool {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);

        let delivery = self
            .auto_delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let (Some(delivery), Some(sink)) = (delivery, self.sink.get().cloned()) {
            debug!(count = delivery.results.len(), "Mock platform scheduling delivery");
            std::thread::spawn(move || {
                std::thread::sleep(delivery.delay);
                sink.on_scan_complete(delivery.results);
            });
        }

        self.scan_accepted.load(Ordering::SeqCst)
    }

    fn current_association(&self) -> Option<Association> {
        self.association
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
