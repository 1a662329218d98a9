//! Serialization layer. Defaults to JSON via serde_json.
//!
//! The on-disk form is a single [`Document`]: the next identifier to hand out
//! plus every record in identifier order.

use crate::error::{Error, Result};
use crate::model::{Record, RecordId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Everything a collection writes to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document<V> {
    /// Identifier the next insert will receive.
    pub next_id: RecordId,
    /// Stored records, ascending by identifier.
    pub records: Vec<Record<V>>,
}

impl<V> Default for Document<V> {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: Vec::new(),
        }
    }
}

/// Converts collection documents to/from bytes for persistence.
pub trait Serializer: Send + Sync {
    /// Encode a document to bytes.
    fn serialize<V: Serialize>(&self, doc: &Document<V>) -> Result<Vec<u8>>;

    /// Decode bytes back into a document.
    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<Document<V>>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation, easier to read by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize<V: Serialize>(&self, doc: &Document<V>) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(doc)
        } else {
            serde_json::to_vec(doc)
        };
        bytes.map_err(|e| Error::Serialize(e.to_string()))
    }

    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<Document<V>> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialize(e.to_string()))
    }
}
