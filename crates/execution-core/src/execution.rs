//! Execution rows as reported by a venue.

use crate::error::ExecutionError;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// One execution row exactly as the venue returned it.
///
/// Field sets may differ between rows of the same batch.
pub type RawExecution = serde_json::Map<String, Value>;

/// Value of the `triggered` field once a stop order has fired.
pub const TRIGGERED_MARKER: &str = "StopOrderTriggered";

/// Field names shared by every venue's execution rows.
pub(crate) mod fields {
    pub const CLIENT_ORDER_ID: &str = "clOrdID";
    pub const ORDER_ID: &str = "orderID";
    pub const ORD_STATUS: &str = "ordStatus";
    pub const TRIGGERED: &str = "triggered";
    pub const TRANSACT_TIME: &str = "transactTime";
}

/// Decoded execution row.
///
/// The typed fields are the ones reconciliation needs; everything else the
/// venue sent stays in `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    /// Client order id (empty for orders placed without one).
    pub client_order_id: String,
    /// Venue order id.
    pub order_id: String,
    /// Order status at the time of the event, verbatim.
    pub ord_status: String,
    /// Trigger marker for stop orders.
    pub triggered: Option<String>,
    /// When the venue processed the event.
    pub transact_time: DateTime<Utc>,
    /// The row as received.
    pub fields: RawExecution,
}

impl ExecutionRecord {
    /// Decode a raw row.
    ///
    /// `transactTime` is required and may be an RFC 3339 string or epoch
    /// milliseconds. Missing `clOrdID` and `ordStatus` decode as empty strings.
    pub fn from_raw(raw: RawExecution) -> Result<Self, ExecutionError> {
        let transact_time = match raw.get(fields::TRANSACT_TIME) {
            Some(value) => parse_timestamp(value)?,
            None => {
                return Err(ExecutionError::InvalidVenueData(format!(
                    "execution row has no {}",
                    fields::TRANSACT_TIME
                )))
            }
        };

        Ok(Self {
            client_order_id: string_field(&raw, fields::CLIENT_ORDER_ID).unwrap_or_default(),
            order_id: string_field(&raw, fields::ORDER_ID).unwrap_or_default(),
            ord_status: string_field(&raw, fields::ORD_STATUS).unwrap_or_default(),
            triggered: string_field(&raw, fields::TRIGGERED),
            transact_time,
            fields: raw,
        })
    }

    /// Number of fields in the original row.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether a stop order has fired.
    pub fn is_triggered(&self) -> bool {
        self.triggered.as_deref() == Some(TRIGGERED_MARKER)
    }
}

/// Read a field as a string, accepting numbers (Binance order ids are integers).
fn string_field(raw: &RawExecution, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, ExecutionError> {
    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ExecutionError::InvalidVenueData(format!("unreadable {}: {}", fields::TRANSACT_TIME, value))
    })
}
