//! Keyed projection of normalized records
//!
//! Reduces a record sequence to a single field's values. Each value is keyed by
//! the record's remote `uuid` when it has one, otherwise by the next free
//! sequential index.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::{AxlError, Result};
use crate::value::{AxlValue, FlatRecord};

/// Field holding the remote-assigned identifier
pub const UUID_FIELD: &str = "uuid";

/// Key of one entry in a [`KeyedCollection`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Uuid(String),
    Index(usize),
}

impl RecordKey {
    pub fn uuid(&self) -> Option<&str> {
        match self {
            RecordKey::Uuid(u) => Some(u),
            RecordKey::Index(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Uuid(u) => write!(f, "{}", u),
            RecordKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(uuid: &str) -> Self {
        RecordKey::Uuid(uuid.to_string())
    }
}

impl From<usize> for RecordKey {
    fn from(index: usize) -> Self {
        RecordKey::Index(index)
    }
}

// Serialized as a plain string so collections render as JSON objects
impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered `key -> projected value` map
pub type KeyedCollection = IndexMap<RecordKey, AxlValue>;

/// Non-empty scalar uuid of a record, if any
pub fn record_uuid(record: &FlatRecord) -> Option<&str> {
    record
        .get(UUID_FIELD)
        .and_then(AxlValue::as_str)
        .filter(|u| !u.is_empty())
}

/// Project `records` onto `field`
///
/// With `strict`, a record lacking a non-empty `field` fails the projection;
/// otherwise that record is skipped.
pub fn project(records: &[FlatRecord], field: &str, strict: bool) -> Result<KeyedCollection> {
    let mut out = KeyedCollection::with_capacity(records.len());
    let mut next_index = 0usize;

    for (i, record) in records.iter().enumerate() {
        let value = match record.get(field) {
            Some(v) if !v.is_empty() => v,
            _ if strict => return Err(AxlError::missing_field(i, field)),
            _ => continue,
        };

        let key = match record_uuid(record) {
            Some(uuid) => RecordKey::Uuid(uuid.to_string()),
            None => {
                let key = RecordKey::Index(next_index);
                next_index += 1;
                key
            }
        };
        out.insert(key, value.clone());
    }

    Ok(out)
}
