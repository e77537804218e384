//! Recursive value model for AXL requests and replies
//!
//! The AXL schema is wide and loosely shaped: the same element may come back as
//! a single child or as a run of repeated siblings, and a text node may carry
//! attributes such as `uuid`. Rather than a typed struct per object, every
//! request and reply is carried as an [`AxlValue`] tree.
//!
//! ```rust
//! use axl_core::value::{record, AxlValue};
//!
//! let phone = record([
//!     ("name", AxlValue::from("SEP001122334455")),
//!     ("devicePoolName", AxlValue::from("DP_NYC")),
//! ]);
//! assert_eq!(phone["name"].as_str(), Some("SEP001122334455"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key under which element text is stored when the element also has attributes
pub const TEXT_KEY: &str = "_";

/// Ordered field map, mirroring one remote object
pub type FlatRecord = IndexMap<String, AxlValue>;

/// A node in an AXL request or reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxlValue {
    /// Text leaf
    Scalar(String),
    /// Nested object
    Record(FlatRecord),
    /// Repeated elements, in document order
    List(Vec<AxlValue>),
}

impl AxlValue {
    /// Empty text leaf, used for returned tags and blanked fields
    pub fn empty() -> Self {
        AxlValue::Scalar(String::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AxlValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&FlatRecord> {
        match self {
            AxlValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AxlValue]> {
        match self {
            AxlValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<FlatRecord> {
        match self {
            AxlValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Look up a field when this value is a record
    pub fn get(&self, field: &str) -> Option<&AxlValue> {
        self.as_record().and_then(|r| r.get(field))
    }

    /// Text content of a leaf, or of an attributed element (`{_: text, uuid: ..}`)
    pub fn text(&self) -> Option<&str> {
        match self {
            AxlValue::Scalar(s) => Some(s),
            AxlValue::Record(r) => r.get(TEXT_KEY).and_then(AxlValue::as_str),
            AxlValue::List(_) => None,
        }
    }

    /// True for empty text, empty records and empty lists
    pub fn is_empty(&self) -> bool {
        match self {
            AxlValue::Scalar(s) => s.is_empty(),
            AxlValue::Record(r) => r.is_empty(),
            AxlValue::List(l) => l.is_empty(),
        }
    }

    /// Iterate a value that may be a single item or a list of items
    ///
    /// A scalar or record yields itself once; a list yields its elements.
    pub fn one_or_many(&self) -> impl Iterator<Item = &AxlValue> {
        let items: &[AxlValue] = match self {
            AxlValue::List(l) => l,
            other => std::slice::from_ref(other),
        };
        items.iter()
    }
}

/// Build a record from `(field, value)` pairs, keeping their order
pub fn record<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> FlatRecord
where
    K: Into<String>,
    V: Into<AxlValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl From<&str> for AxlValue {
    fn from(s: &str) -> Self {
        AxlValue::Scalar(s.to_string())
    }
}

impl From<String> for AxlValue {
    fn from(s: String) -> Self {
        AxlValue::Scalar(s)
    }
}

impl From<&String> for AxlValue {
    fn from(s: &String) -> Self {
        AxlValue::Scalar(s.clone())
    }
}

impl From<bool> for AxlValue {
    fn from(b: bool) -> Self {
        AxlValue::Scalar(b.to_string())
    }
}

impl From<u16> for AxlValue {
    fn from(n: u16) -> Self {
        AxlValue::Scalar(n.to_string())
    }
}

impl From<u32> for AxlValue {
    fn from(n: u32) -> Self {
        AxlValue::Scalar(n.to_string())
    }
}

impl From<i64> for AxlValue {
    fn from(n: i64) -> Self {
        AxlValue::Scalar(n.to_string())
    }
}

impl From<FlatRecord> for AxlValue {
    fn from(r: FlatRecord) -> Self {
        AxlValue::Record(r)
    }
}

impl<T: Into<AxlValue>> From<Vec<T>> for AxlValue {
    fn from(items: Vec<T>) -> Self {
        AxlValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// JSON bridge so callers can describe records with `serde_json::json!`.
///
/// Numbers and booleans become their text form and `null` becomes empty text,
/// matching how the values travel over the wire.
impl From<serde_json::Value> for AxlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AxlValue::empty(),
            serde_json::Value::Bool(b) => AxlValue::Scalar(b.to_string()),
            serde_json::Value::Number(n) => AxlValue::Scalar(n.to_string()),
            serde_json::Value::String(s) => AxlValue::Scalar(s),
            serde_json::Value::Array(items) => {
                AxlValue::List(items.into_iter().map(AxlValue::from).collect())
            }
            serde_json::Value::Object(map) => AxlValue::Record(
                map.into_iter().map(|(k, v)| (k, AxlValue::from(v))).collect(),
            ),
        }
    }
}
