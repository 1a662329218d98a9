//! Record types: the car body, its partial-update form, and the stored record
//! that pairs a body with its identifier.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Store-assigned identifier. Monotonic, starting at 1, never reused.
pub type RecordId = u64;

/// Name of the identifier field in a record's JSON form.
pub const ID_FIELD: &str = "id";

/// Fields a create request must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "color", "manufacturer", "model", "year"];

/// A car as submitted by a client.
///
/// Field values are opaque: whatever JSON value the client sent (text, a
/// number, `null`, ...) is stored and handed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Display name.
    pub name: Value,
    /// Paint colour.
    pub color: Value,
    /// Maker, e.g. "Seat".
    pub manufacturer: Value,
    /// Model line.
    pub model: Value,
    /// Model year, e.g. `2019` or `"2019"`.
    pub year: Value,
}

/// The car fields an update request carries.
///
/// An update replaces each field present in the request body with the value
/// sent, `null` included. Fields missing from the body keep their stored
/// value, so a client may send the full record from `/car/read` or just the
/// fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CarPatch {
    /// New name.
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    /// New colour.
    #[serde(default, deserialize_with = "present")]
    pub color: Option<Value>,
    /// New manufacturer.
    #[serde(default, deserialize_with = "present")]
    pub manufacturer: Option<Value>,
    /// New model.
    #[serde(default, deserialize_with = "present")]
    pub model: Option<Value>,
    /// New year.
    #[serde(default, deserialize_with = "present")]
    pub year: Option<Value>,
}

// A key that is present yields `Some`, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl CarPatch {
    /// Overwrite the fields of `car` that this patch carries.
    pub fn apply(self, car: &mut Car) {
        if let Some(v) = self.name {
            car.name = v;
        }
        if let Some(v) = self.color {
            car.color = v;
        }
        if let Some(v) = self.manufacturer {
            car.manufacturer = v;
        }
        if let Some(v) = self.model {
            car.model = v;
        }
        if let Some(v) = self.year {
            car.year = v;
        }
    }
}

/// A body that has been stored and carries exactly one identifier.
///
/// Serializes flat: `{"id": 1, "name": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<V> {
    /// Identifier assigned on insert.
    pub id: RecordId,
    /// The stored value.
    #[serde(flatten)]
    pub body: V,
}

impl<V> Record<V> {
    /// Pair a body with its identifier.
    pub fn new(id: RecordId, body: V) -> Self {
        Self { id, body }
    }
}
