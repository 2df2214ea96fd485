//! Structured client order ids and the source keys derived from them.

use crate::error::ExecutionError;
use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a client order id for an order that belongs to no source,
/// such as a position close.
///
/// Format: `{prefix}{uuid}` where uuid is a v4 UUID in simple format (no hyphens).
pub fn generate_client_order_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().as_simple())
}

/// Order status named by a target status marker.
pub fn status_for_marker(marker: char) -> Option<OrderStatus> {
    match marker {
        'N' => Some(OrderStatus::New),
        'C' => Some(OrderStatus::Canceled),
        'F' => Some(OrderStatus::Filled),
        'P' => Some(OrderStatus::PartiallyFilled),
        'T' => Some(OrderStatus::Triggered),
        _ => None,
    }
}

/// Correlation identity of a family of orders: `"<sourceName>-<typeMarker>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey(String);

impl SourceKey {
    /// Build a key from its two parts.
    pub fn new(source_name: &str, source_type: &str) -> Self {
        Self(format!("{}-{}", source_name, source_type))
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The parts of a client order id, without the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrderId {
    pub source_name: String,
    pub source_type: char,
    pub target_status: char,
}

impl ClientOrderId {
    /// Source key this id belongs to.
    pub fn source_key(&self) -> SourceKey {
        SourceKey::new(&self.source_name, &self.source_type.to_string())
    }

    /// Status the order was issued to reach, if the marker is known.
    pub fn target(&self) -> Option<OrderStatus> {
        status_for_marker(self.target_status)
    }
}

/// Encodes and decodes `<prefix><sourceName>-<typeMarker>_<statusMarker>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrderIdCodec {
    prefix: String,
}

impl ClientOrderIdCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the wire id.
    ///
    /// The source name may not contain `-` or `_`, since either would shift
    /// the split points on the way back.
    pub fn compose(&self, id: &ClientOrderId) -> Result<String, ExecutionError> {
        if id.source_name.contains(['-', '_']) {
            return Err(ExecutionError::InvalidOrder(format!(
                "source name '{}' may not contain '-' or '_'",
                id.source_name
            )));
        }
        if id.source_type == '-' || id.target_status == '_' {
            return Err(ExecutionError::InvalidOrder(format!(
                "invalid markers '{}' / '{}'",
                id.source_type, id.target_status
            )));
        }

        Ok(format!(
            "{}{}-{}_{}",
            self.prefix, id.source_name, id.source_type, id.target_status
        ))
    }

    /// Derive the source key of a wire id.
    ///
    /// Everything before the first `-` is the source name; the first
    /// character after it (ignoring further leading dashes) is the type
    /// marker. An id without a dash yields the key `"-"`.
    pub fn parse(&self, client_order_id: &str) -> SourceKey {
        let body = self.strip_prefix(client_order_id);

        match body.split_once('-') {
            Some((name, rest)) => {
                let marker: String = rest.trim_start_matches('-').chars().take(1).collect();
                SourceKey::new(name, &marker)
            }
            None => SourceKey::new("", ""),
        }
    }

    /// Fully decode a wire id. `None` if it does not follow the layout.
    pub fn decode(&self, client_order_id: &str) -> Option<ClientOrderId> {
        let body = client_order_id.strip_prefix(self.prefix.as_str())?;
        let (name, rest) = body.split_once('-')?;

        let mut chars = rest.chars();
        let source_type = chars.next()?;
        if chars.next()? != '_' {
            return None;
        }
        let target_status = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        Some(ClientOrderId {
            source_name: name.to_string(),
            source_type,
            target_status,
        })
    }

    fn strip_prefix<'a>(&self, client_order_id: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            return client_order_id;
        }
        client_order_id
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(client_order_id)
    }
}
