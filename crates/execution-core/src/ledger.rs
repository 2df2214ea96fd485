//! Time-ordered execution table built from a venue's execution history.

use crate::error::{BatchReport, DiscardReason, DiscardedRecord, ExecutionError};
use crate::execution::{ExecutionRecord, RawExecution};
use crate::order::OrderStatus;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of reconciling one execution batch.
#[derive(Debug)]
pub struct Reconciled {
    /// The usable rows.
    pub ledger: ExecutionLedger,
    /// Present when any row was left out.
    pub report: Option<BatchReport>,
}

impl Reconciled {
    /// Turn a lossy reconciliation into `MalformedExecutionBatch`.
    pub fn strict(self) -> Result<ExecutionLedger, ExecutionError> {
        match self.report {
            Some(report) => Err(ExecutionError::MalformedExecutionBatch(report)),
            None => Ok(self.ledger),
        }
    }

    /// Keep the usable rows, whatever was discarded.
    pub fn into_ledger(self) -> ExecutionLedger {
        self.ledger
    }
}

/// Executions sorted by transaction time, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLedger {
    records: Vec<ExecutionRecord>,
}

impl ExecutionLedger {
    /// Build a ledger from a raw batch.
    ///
    /// A batch whose rows all have the same number of fields is used whole.
    /// Otherwise rows are grouped by field count and only the group with the
    /// most fields is kept; every other row is reported as discarded. Rows
    /// of the kept shape that cannot be decoded are reported as well.
    pub fn reconcile(batch: Vec<RawExecution>) -> Reconciled {
        let total = batch.len();
        let mut groups: BTreeMap<usize, Vec<RawExecution>> = BTreeMap::new();
        for raw in batch {
            groups.entry(raw.len()).or_default().push(raw);
        }

        let mut discarded = Vec::new();
        let (kept_field_count, kept_rows) = match groups.pop_last() {
            Some(group) => group,
            None => return Reconciled {
                ledger: Self::default(),
                report: None,
            },
        };

        for (field_count, rows) in groups {
            discarded.extend(rows.into_iter().map(|record| DiscardedRecord {
                field_count,
                reason: DiscardReason::MinorityShape,
                record,
            }));
        }

        let mut records = Vec::with_capacity(kept_rows.len());
        for raw in kept_rows {
            let field_count = raw.len();
            match ExecutionRecord::from_raw(raw.clone()) {
                Ok(record) => records.push(record),
                Err(e) => discarded.push(DiscardedRecord {
                    field_count,
                    reason: DiscardReason::Undecodable(e.to_string()),
                    record: raw,
                }),
            }
        }

        let ledger = Self::from_records(records);

        let report = if discarded.is_empty() {
            debug!(rows = total, fields = kept_field_count, "Execution batch reconciled");
            None
        } else {
            let report = BatchReport {
                kept_field_count,
                kept: ledger.len(),
                discarded,
            };
            warn!(
                total,
                kept = report.kept,
                kept_fields = report.kept_field_count,
                discarded = report.discarded_count(),
                shapes = ?report.discarded_shapes(),
                "Discarded execution records"
            );
            Some(report)
        };

        Reconciled { ledger, report }
    }

    /// Build a ledger from decoded records. Sorting is stable, so rows with
    /// equal timestamps keep the venue's order.
    pub fn from_records(mut records: Vec<ExecutionRecord>) -> Self {
        records.sort_by_key(|r| r.transact_time);
        Self { records }
    }

    /// All rows, oldest first.
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows for one client order id, or every row when `None`.
    pub fn select(&self, client_order_id: Option<&str>) -> Vec<&ExecutionRecord> {
        match client_order_id {
            Some(id) => self
                .records
                .iter()
                .filter(|r| r.client_order_id == id)
                .collect(),
            None => self.records.iter().collect(),
        }
    }

    /// Whether the latest row of an order shows `target`.
    ///
    /// `Triggered` is read from the trigger marker, not the status field.
    /// Fails with `EmptyHistory` when the order has no rows.
    pub fn has_reached_status(
        &self,
        client_order_id: &str,
        target: OrderStatus,
    ) -> Result<bool, ExecutionError> {
        let last = self
            .records
            .iter()
            .rev()
            .find(|r| r.client_order_id == client_order_id)
            .ok_or_else(|| ExecutionError::EmptyHistory {
                client_order_id: client_order_id.to_string(),
            })?;

        Ok(matches_status(last, target))
    }

    /// Whether any row of an order ever showed `target`.
    pub fn has_ever_had_status(&self, client_order_id: &str, target: OrderStatus) -> bool {
        self.records
            .iter()
            .filter(|r| r.client_order_id == client_order_id)
            .any(|r| matches_status(r, target))
    }
}

fn matches_status(record: &ExecutionRecord, target: OrderStatus) -> bool {
    match target {
        OrderStatus::Triggered => record.is_triggered(),
        other => record.ord_status == other.as_str(),
    }
}
