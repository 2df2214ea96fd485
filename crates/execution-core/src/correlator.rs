//! Source-key correlation over the execution ledger.

use crate::client_order_id::{ClientOrderIdCodec, SourceKey};
use crate::ledger::ExecutionLedger;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::time::Duration;

/// Window used by [`OrderCorrelator::find_recent_by_key`] when none is given.
pub const DEFAULT_RECENT_WINDOW: Duration = Duration::from_secs(30);

/// A window of `length` ending at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub end: DateTime<Utc>,
    pub length: Duration,
}

impl TimeWindow {
    pub fn ending_at(end: DateTime<Utc>, length: Duration) -> Self {
        Self { end, length }
    }

    /// Earliest excluded instant. `None` if the window reaches past the
    /// representable range and so covers all history.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        TimeDelta::from_std(self.length)
            .ok()
            .and_then(|d| self.end.checked_sub_signed(d))
    }

    /// Strictly after the start. The end is not an upper bound, so rows
    /// stamped slightly ahead of the local clock still count.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        match self.start() {
            Some(start) => t > start,
            None => true,
        }
    }
}

/// Finds the client order ids of one source key that show up in the ledger.
#[derive(Debug, Clone, Copy)]
pub struct OrderCorrelator<'a> {
    codec: &'a ClientOrderIdCodec,
}

impl<'a> OrderCorrelator<'a> {
    pub fn new(codec: &'a ClientOrderIdCodec) -> Self {
        Self { codec }
    }

    /// Client order ids whose source key is `key`, in order of first
    /// execution, each reported once.
    pub fn correlate(
        &self,
        ledger: &ExecutionLedger,
        key: &SourceKey,
        window: Option<TimeWindow>,
    ) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();

        for record in ledger.records() {
            if let Some(w) = window {
                if !w.contains(record.transact_time) {
                    continue;
                }
            }
            if seen.contains(record.client_order_id.as_str()) {
                continue;
            }
            if self.codec.parse(&record.client_order_id) == *key {
                seen.insert(record.client_order_id.as_str());
                ids.push(record.client_order_id.clone());
            }
        }

        ids
    }

    /// [`correlate`](Self::correlate) restricted to the last `window`
    /// (30 seconds by default) before `now`.
    pub fn find_recent_by_key(
        &self,
        ledger: &ExecutionLedger,
        key: &SourceKey,
        now: DateTime<Utc>,
        window: Option<Duration>,
    ) -> Vec<String> {
        let window = TimeWindow::ending_at(now, window.unwrap_or(DEFAULT_RECENT_WINDOW));
        self.correlate(ledger, key, Some(window))
    }
}
