//! Error taxonomy shared by every adapter and the lifecycle manager.

use crate::execution::RawExecution;
use common::Venue;
use std::fmt;
use thiserror::Error;

/// Errors surfaced by the execution layer.
///
/// Validation errors (`InvalidOrder`) are raised before any network call.
/// `Venue` errors are propagated unchanged; the core never retries.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Order fails local validation (precision, min notional, missing fields).
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Capability not implemented by a venue.
    #[error("{operation} is not supported on {venue}")]
    Unsupported {
        /// Venue that lacks the capability.
        venue: Venue,
        /// Name of the capability.
        operation: &'static str,
    },

    /// Instrument settles in a way exposure cannot be computed for.
    #[error("unknown instrument type for {symbol}: {future_type}")]
    UnknownInstrumentType {
        /// Instrument symbol.
        symbol: String,
        /// Type reported by the venue.
        future_type: String,
    },

    /// A status query needs at least one execution row and there is none.
    #[error("no executions recorded for client order id '{client_order_id}'")]
    EmptyHistory {
        /// The client order id that was queried.
        client_order_id: String,
    },

    /// Execution batch mixed record shapes; only returned in strict mode.
    #[error("malformed execution batch: {0}")]
    MalformedExecutionBatch(BatchReport),

    /// Venue payload is missing data the core needs.
    #[error("invalid venue data: {0}")]
    InvalidVenueData(String),

    /// Transport or API failure from the venue.
    #[error("{venue} error: {source}")]
    Venue {
        /// Venue that failed.
        venue: Venue,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ExecutionError {
    /// Wrap a venue-level error.
    pub fn venue(
        venue: Venue,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Venue {
            venue,
            source: source.into(),
        }
    }

    /// Shortcut for [`ExecutionError::Unsupported`].
    pub fn unsupported(venue: Venue, operation: &'static str) -> Self {
        Self::Unsupported { venue, operation }
    }

    /// True for transport/API failures.
    pub fn is_venue_error(&self) -> bool {
        matches!(self, Self::Venue { .. })
    }
}

/// Why an execution record was left out of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Record belongs to a shape group with fewer fields than the kept one.
    MinorityShape,
    /// Record has the kept shape but a required field could not be read.
    Undecodable(String),
}

/// One record left out of the ledger, kept verbatim for the operator.
#[derive(Debug, Clone)]
pub struct DiscardedRecord {
    /// Number of fields in the record.
    pub field_count: usize,
    /// Why it was discarded.
    pub reason: DiscardReason,
    /// The record as received.
    pub record: RawExecution,
}

/// Diagnostic produced when an execution batch could not be used as-is.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Field count of the shape that was kept.
    pub kept_field_count: usize,
    /// Number of records kept.
    pub kept: usize,
    /// Records that were discarded.
    pub discarded: Vec<DiscardedRecord>,
}

impl BatchReport {
    /// Number of discarded records.
    pub fn discarded_count(&self) -> usize {
        self.discarded.len()
    }

    /// Distinct field counts among discarded records, ascending.
    pub fn discarded_shapes(&self) -> Vec<usize> {
        let mut shapes: Vec<usize> = self.discarded.iter().map(|d| d.field_count).collect();
        shapes.sort_unstable();
        shapes.dedup();
        shapes
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kept {} records with {} fields, discarded {} (shapes {:?})",
            self.kept,
            self.kept_field_count,
            self.discarded.len(),
            self.discarded_shapes()
        )
    }
}
