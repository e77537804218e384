//! Update diffing
//!
//! AXL `update<Type>` replaces every field it is given. To avoid clobbering
//! fields the caller never meant to touch, an update request carries only the
//! search key and the fields whose desired value differs from what the server
//! currently holds, plus any membership or rename directives.

use crate::registry::{NAME_FIELD, PARTITION_FIELD, PATTERN_FIELD};
use crate::projection::UUID_FIELD;
use crate::value::{AxlValue, FlatRecord};

/// Directive fields copied through verbatim; they have no current value to diff
pub const RESERVED_DIRECTIVES: &[&str] = &["addMembers", "removeMembers", "newName"];

/// How the object being updated is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    Name(String),
    Uuid(String),
    PatternAndPartition { pattern: String, partition: String },
}

impl SearchKey {
    /// Key fields in request order
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            SearchKey::Name(name) => vec![(NAME_FIELD, name.as_str())],
            SearchKey::Uuid(uuid) => vec![(UUID_FIELD, uuid.as_str())],
            SearchKey::PatternAndPartition { pattern, partition } => vec![
                (PATTERN_FIELD, pattern.as_str()),
                (PARTITION_FIELD, partition.as_str()),
            ],
        }
    }
}

/// Whether `wanted` changes `current`
///
/// A reference field reads back with attributes (`{_: "DP_NYC", uuid}`) but is
/// written as plain text; a scalar desired value is compared against its text.
fn differs(current: &AxlValue, wanted: &AxlValue) -> bool {
    match (current, wanted) {
        (AxlValue::Record(_), AxlValue::Scalar(text)) => current.text() != Some(text.as_str()),
        _ => current != wanted,
    }
}

/// Build the minimal update request for `desired` against `canonical`
///
/// The per-field diff and each reserved directive are evaluated independently,
/// so a directive never hides a changed field or another directive.
pub fn compute_update(canonical: &FlatRecord, desired: &FlatRecord, key: &SearchKey) -> FlatRecord {
    let mut request: FlatRecord = key
        .fields()
        .into_iter()
        .map(|(field, value)| (field.to_string(), AxlValue::from(value)))
        .collect();

    for (field, current) in canonical {
        if let Some(wanted) = desired.get(field) {
            if differs(current, wanted) {
                request.insert(field.clone(), wanted.clone());
            }
        }
    }

    for directive in RESERVED_DIRECTIVES {
        if let Some(value) = desired.get(*directive) {
            request.insert(directive.to_string(), value.clone());
        }
    }

    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rec(value: serde_json::Value) -> FlatRecord {
        AxlValue::from(value).into_record().unwrap()
    }

    #[test]
    fn test_changed_fields_and_directives() {
        let canonical = rec(json!({"name": "Phone1", "description": "old", "devicePoolName": "DP_NYC"}));
        let desired = rec(json!({"name": "Phone1", "description": "new", "addMembers": ["X"]}));

        let request = compute_update(&canonical, &desired, &SearchKey::Name("Phone1".into()));

        let mut expected = FlatRecord::new();
        expected.insert("name".into(), AxlValue::from("Phone1"));
        expected.insert("description".into(), AxlValue::from("new"));
        expected.insert("addMembers".into(), AxlValue::from(vec!["X"]));
        assert_eq!(request, expected);
    }

    #[test]
    fn test_equal_values_are_omitted() {
        let canonical = rec(json!({"uuid": "u1", "name": "CSS_NYC", "description": "same"}));
        let desired = rec(json!({"description": "same"}));
        let request = compute_update(&canonical, &desired, &SearchKey::Uuid("u1".into()));
        assert_eq!(request.len(), 1);
        assert_eq!(request["uuid"].as_str(), Some("u1"));
    }

    #[test]
    fn test_nested_values_compare_structurally() {
        let canonical = rec(json!({"name": "DP", "localRouteGroup": {"name": "Standard Local Route Group", "value": "RG_A"}}));
        let same = rec(json!({"localRouteGroup": {"name": "Standard Local Route Group", "value": "RG_A"}}));
        let changed = rec(json!({"localRouteGroup": {"name": "Standard Local Route Group", "value": "RG_B"}}));
        let key = SearchKey::Name("DP".into());

        assert!(!compute_update(&canonical, &same, &key).contains_key("localRouteGroup"));
        assert!(compute_update(&canonical, &changed, &key).contains_key("localRouteGroup"));
    }

    #[test]
    fn test_reference_fields_compare_by_text() {
        let canonical = rec(json!({
            "name": "SEP1",
            "devicePoolName": {"_": "DP_NYC", "uuid": "{DP-1}"},
            "locationName": {"_": "LOC_NYC", "uuid": "{L-1}"},
            "callingSearchSpaceName": {"uuid": "{CSS-1}"}
        }));
        let desired = rec(json!({
            "devicePoolName": "DP_NYC",
            "locationName": "LOC_LAX",
            "callingSearchSpaceName": ""
        }));
        let request = compute_update(&canonical, &desired, &SearchKey::Name("SEP1".into()));
        let keys: Vec<&str> = request.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "locationName", "callingSearchSpaceName"]);
        assert_eq!(request["locationName"].as_str(), Some("LOC_LAX"));
    }

    #[test]
    fn test_fields_unknown_to_canonical_are_ignored() {
        let canonical = rec(json!({"name": "P1"}));
        let desired = rec(json!({"name": "P1", "bogus": "x"}));
        let request = compute_update(&canonical, &desired, &SearchKey::Name("P1".into()));
        assert!(!request.contains_key("bogus"));
    }

    #[test]
    fn test_all_directives_pass_through_independently() {
        // a changed field ahead of the directives must not hide any of them
        let canonical = rec(json!({"name": "CSS1", "description": "a", "members": ""}));
        let desired = rec(json!({
            "description": "b",
            "addMembers": {"member": {"routePartitionName": "PT_A"}},
            "removeMembers": {"member": {"routePartitionName": "PT_B"}},
            "newName": "CSS2"
        }));
        let request = compute_update(&canonical, &desired, &SearchKey::Name("CSS1".into()));
        for field in ["name", "description", "addMembers", "removeMembers", "newName"] {
            assert!(request.contains_key(field), "missing {}", field);
        }
        assert_eq!(request["newName"].as_str(), Some("CSS2"));
    }

    #[test]
    fn test_pattern_and_partition_key() {
        let canonical = rec(json!({"pattern": "9.@", "routePartitionName": "PT_NYC", "blockEnable": "false"}));
        let desired = rec(json!({"pattern": "9.@", "routePartitionName": "PT_NYC", "blockEnable": "true"}));
        let key = SearchKey::PatternAndPartition {
            pattern: "9.@".into(),
            partition: "PT_NYC".into(),
        };
        let request = compute_update(&canonical, &desired, &key);
        let keys: Vec<&str> = request.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["pattern", "routePartitionName", "blockEnable"]);
    }
}
