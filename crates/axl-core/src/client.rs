//! Generic CRUD dispatcher
//!
//! [`AxlClient`] turns "do `verb` to an object of type `T`" into the matching
//! AXL procedure call. Every entry point validates the type name against the
//! [`Registry`] before anything goes on the wire, builds the request shape the
//! procedure expects, and runs the reply through
//! [`normalize`](crate::normalize::normalize) and
//! [`project`](crate::projection::project).
//!
//! # Procedure naming
//!
//! | Operation | Procedure | Request |
//! |-----------|-----------|---------|
//! | list      | `list<T>`   | `{searchCriteria, returnedTags}` |
//! | get       | `get<T>`    | `{name}` / `{uuid}` / `{pattern, routePartitionName}` |
//! | add       | `add<T>`    | `{<t>: data}` (wrapper key lower-first) |
//! | update    | `update<T>` | search key + changed fields |
//! | delete    | `remove<T>` | `{uuid}` |
//!
//! Deletion is only offered by uuid. Names are not guaranteed unique, and
//! removing the wrong object cannot be undone.
//!
//! # Example
//!
//! ```rust,no_run
//! use axl_core::{AxlClient, AxlConfig};
//!
//! # async fn example() -> axl_core::Result<()> {
//! let config = AxlConfig::new("https://cucm.example.com:8443/axl/", "axladmin", "secret");
//! let client = AxlClient::connect(&config)?;
//!
//! let pools = client.list_by_type_and_site("DevicePool", "NYC").await?;
//! for (uuid, name) in &pools {
//!     println!("{} {:?}", uuid, name.as_str());
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Instant;

use tracing::{debug, warn};

use crate::call_log::{CallLog, CallRecord};
use crate::config::AxlConfig;
use crate::diff::{SearchKey, compute_update};
use crate::error::{AxlError, Result};
use crate::normalize::{first_property, normalize};
use crate::projection::{KeyedCollection, UUID_FIELD, project};
use crate::registry::{NAME_FIELD, ObjectType, PARTITION_FIELD, PATTERN_FIELD, Registry, SiteScope, Verb, wrapper_key};
use crate::transport::{AxlTransport, SoapTransport};
use crate::value::{AxlValue, FlatRecord, record};

/// Build a `{searchCriteria, returnedTags}` list request
pub fn search_request(criteria: FlatRecord, returned_tags: &[&str]) -> AxlValue {
    let tags: FlatRecord = returned_tags
        .iter()
        .map(|tag| (tag.to_string(), AxlValue::empty()))
        .collect();
    AxlValue::Record(record([
        ("searchCriteria", AxlValue::Record(criteria)),
        ("returnedTags", AxlValue::Record(tags)),
    ]))
}

/// Non-empty text value of `field` in caller data
fn required_text<'a>(data: &'a FlatRecord, field: &str, purpose: &str) -> Result<&'a str> {
    data.get(field)
        .and_then(AxlValue::text)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AxlError::invalid_input(format!("data does not contain a valid {} to {}", field, purpose)))
}

/// AXL client over a transport
pub struct AxlClient<T = SoapTransport> {
    transport: T,
    registry: Registry,
    calls: CallLog,
}

impl AxlClient<SoapTransport> {
    /// Connect to the endpoint described by `config`
    pub fn connect(config: &AxlConfig) -> Result<Self> {
        let transport = SoapTransport::new(config)?;
        debug!("AXL client for {} (schema {})", config.url, config.schema_version);
        Ok(Self::new(transport))
    }
}

impl<T: AxlTransport> AxlClient<T> {
    /// Client over `transport` with the standard type registry
    pub fn new(transport: T) -> Self {
        Self::with_registry(transport, Registry::standard())
    }

    pub fn with_registry(transport: T, registry: Registry) -> Self {
        Self {
            transport,
            registry,
            calls: CallLog::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Every remote call made so far, for diagnostics
    pub fn call_log(&self) -> &CallLog {
        &self.calls
    }

    /// Invoke one procedure and log it, whatever the outcome
    pub(crate) async fn call(&self, procedure: &str, request: AxlValue) -> Result<AxlValue> {
        let started = Instant::now();
        let result = self.transport.invoke(procedure, &request).await;
        let elapsed = started.elapsed().as_secs_f64();

        let (reply, error) = match &result {
            Ok(reply) => (Some(reply.clone()), None),
            Err(e) => {
                warn!("{} failed after {:.3}s: {}", procedure, elapsed, e);
                (None, Some(e.to_string()))
            }
        };
        let count = self.calls.append(CallRecord {
            procedure: procedure.to_string(),
            elapsed,
            request,
            reply,
            error,
        });
        debug!(procedure, elapsed, call = count, "AXL call");

        result.map_err(AxlError::from)
    }

    fn lookup(&self, type_name: &str, operation: &'static str) -> Result<&ObjectType> {
        self.registry.lookup(type_name, operation)
    }

    /// List objects of `type_name` belonging to `site`, keyed by uuid
    ///
    /// Lines and remote destination profiles cannot be searched by site on
    /// the server and are resolved indirectly.
    pub async fn list_by_type_and_site(&self, type_name: &str, site: &str) -> Result<KeyedCollection> {
        let ty = self.lookup(type_name, "list by site")?;
        match ty.site_scope {
            SiteScope::Search => self.list_searched(ty, site).await,
            SiteScope::PhoneTraversal => self.lines_by_site(site).await,
            SiteScope::DevicePoolFilter => self.remote_destination_profiles_by_site(site).await,
        }
    }

    /// Server-side wildcard search on the type's search field
    pub(crate) async fn list_searched(&self, ty: &ObjectType, site: &str) -> Result<KeyedCollection> {
        let criteria = self.registry.search_criteria_for(ty.name, site)?;
        let request = search_request(
            record([(criteria.search_field, criteria.search_pattern)]),
            ty.return_tags,
        );
        let reply = self.call(&Verb::List.procedure(ty), request).await?;
        let records = normalize(&reply)?;
        project(&records, criteria.return_field, true)
    }

    /// Fetch the single object named `name`
    ///
    /// Fails with `AmbiguousResult` unless exactly one object matches.
    pub async fn get_by_name(&self, name: &str, type_name: &str) -> Result<FlatRecord> {
        let ty = self.lookup(type_name, "get by name")?;
        if !ty.supports_get_by_name {
            return Err(AxlError::unsupported(type_name, "get by name"));
        }

        let procedure = Verb::Get.procedure(ty);
        let reply = self
            .call(&procedure, AxlValue::Record(record([(NAME_FIELD, name)])))
            .await?;
        let mut records = normalize(&reply)?;
        if records.len() != 1 {
            return Err(AxlError::AmbiguousResult {
                procedure,
                count: records.len(),
            });
        }
        Ok(records.remove(0))
    }

    /// Fetch an object by uuid; an empty reply yields an empty record
    pub async fn get_by_uuid(&self, uuid: &str, type_name: &str) -> Result<FlatRecord> {
        let ty = self.lookup(type_name, "get by uuid")?;
        let reply = self
            .call(&Verb::Get.procedure(ty), AxlValue::Record(record([(UUID_FIELD, uuid)])))
            .await?;
        Ok(normalize(&reply)?.into_iter().next().unwrap_or_default())
    }

    /// Fetch a dial-plan object by its pattern and partition
    pub async fn get_by_pattern_and_partition(
        &self,
        pattern: &str,
        partition: &str,
        type_name: &str,
    ) -> Result<FlatRecord> {
        let ty = self.lookup(type_name, "get by pattern")?;
        if !ty.supports_get_by_pattern {
            return Err(AxlError::unsupported(type_name, "get by pattern"));
        }
        let request = record([(PATTERN_FIELD, pattern), (PARTITION_FIELD, partition)]);
        let reply = self
            .call(&Verb::Get.procedure(ty), AxlValue::Record(request))
            .await?;
        Ok(normalize(&reply)?.into_iter().next().unwrap_or_default())
    }

    /// Create an object; `data` must already be shaped for the type
    ///
    /// Returns the acknowledgement, normally the new object's uuid.
    pub async fn add_by_record(&self, data: FlatRecord, type_name: &str) -> Result<AxlValue> {
        let ty = self.lookup(type_name, "add")?;
        let request = record([(wrapper_key(ty), AxlValue::Record(data))]);
        let reply = self
            .call(&Verb::Add.procedure(ty), AxlValue::Record(request))
            .await?;
        first_property(&reply)
    }

    /// Remove an object by uuid, returning the raw acknowledgement
    pub async fn delete_by_uuid(&self, uuid: &str, type_name: &str) -> Result<AxlValue> {
        let ty = self.lookup(type_name, "delete")?;
        self.call(&Verb::Remove.procedure(ty), AxlValue::Record(record([(UUID_FIELD, uuid)])))
            .await
    }

    /// Update the object named by `data["name"]` with the fields that changed
    pub async fn update_by_record(&self, data: FlatRecord, type_name: &str) -> Result<AxlValue> {
        let ty = self.lookup(type_name, "update by name")?;
        let name = required_text(&data, NAME_FIELD, "update")?.to_string();
        let canonical = self.get_by_name(&name, type_name).await?;
        self.submit_update(ty, &canonical, &data, SearchKey::Name(name)).await
    }

    /// Update the object identified by `data["uuid"]` with the fields that changed
    pub async fn update_by_uuid(&self, data: FlatRecord, type_name: &str) -> Result<AxlValue> {
        let ty = self.lookup(type_name, "update by uuid")?;
        let uuid = required_text(&data, UUID_FIELD, "update")?.to_string();
        let canonical = self.get_by_uuid(&uuid, type_name).await?;
        self.submit_update(ty, &canonical, &data, SearchKey::Uuid(uuid)).await
    }

    /// Update the dial-plan object identified by `data["pattern"]` and
    /// `data["routePartitionName"]`
    pub async fn update_by_pattern_and_partition(&self, data: FlatRecord, type_name: &str) -> Result<AxlValue> {
        let ty = self.lookup(type_name, "update by pattern")?;
        let pattern = required_text(&data, PATTERN_FIELD, "update")?.to_string();
        let partition = required_text(&data, PARTITION_FIELD, "update")?.to_string();
        let canonical = self
            .get_by_pattern_and_partition(&pattern, &partition, type_name)
            .await?;
        self.submit_update(ty, &canonical, &data, SearchKey::PatternAndPartition { pattern, partition })
            .await
    }

    async fn submit_update(
        &self,
        ty: &ObjectType,
        canonical: &FlatRecord,
        desired: &FlatRecord,
        key: SearchKey,
    ) -> Result<AxlValue> {
        let request = compute_update(canonical, desired, &key);
        debug!(
            "update{} touches {} field(s)",
            ty.name,
            request.len().saturating_sub(key.fields().len())
        );
        let reply = self
            .call(&Verb::Update.procedure(ty), AxlValue::Record(request))
            .await?;
        first_property(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Replies with a fixed value and remembers what it was sent
    struct Echo {
        reply: AxlValue,
        sent: Mutex<Vec<(String, AxlValue)>>,
    }

    #[async_trait]
    impl AxlTransport for Echo {
        async fn invoke(&self, procedure: &str, request: &AxlValue) -> std::result::Result<AxlValue, TransportError> {
            self.sent.lock().push((procedure.to_string(), request.clone()));
            Ok(self.reply.clone())
        }
    }

    fn client(reply: serde_json::Value) -> AxlClient<Echo> {
        AxlClient::new(Echo {
            reply: AxlValue::from(reply),
            sent: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_search_request_shape() {
        let request = search_request(record([("name", "%NYC%")]), &["pattern", "routePartitionName"]);
        assert_eq!(
            request,
            AxlValue::from(json!({
                "searchCriteria": {"name": "%NYC%"},
                "returnedTags": {"pattern": "", "routePartitionName": ""}
            }))
        );
    }

    #[tokio::test]
    async fn test_add_uses_lower_first_wrapper_and_plain_procedure() {
        let client = client(json!({"return": "{NEW-UUID}"}));
        let ack = client
            .add_by_record(record([("name", "CSS_NYC")]), "Css")
            .await
            .unwrap();
        assert_eq!(ack.as_str(), Some("{NEW-UUID}"));

        let sent = client.transport().sent.lock();
        assert_eq!(sent[0].0, "addCss");
        assert_eq!(sent[0].1, AxlValue::from(json!({"css": {"name": "CSS_NYC"}})));
    }

    #[tokio::test]
    async fn test_unknown_type_never_reaches_transport() {
        let client = client(json!({"return": ""}));
        let err = client.delete_by_uuid("{X}", "Widget").await.unwrap_err();
        assert!(matches!(err, AxlError::UnsupportedType { .. }));
        assert!(client.transport().sent.lock().is_empty());
        assert!(client.call_log().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_search_key_in_data() {
        let client = client(json!({"return": ""}));
        let err = client
            .update_by_record(record([("description", "x")]), "Phone")
            .await
            .unwrap_err();
        assert!(matches!(err, AxlError::InvalidInput(_)));

        let err = client
            .update_by_pattern_and_partition(record([("pattern", "1000")]), "TransPattern")
            .await
            .unwrap_err();
        assert!(matches!(err, AxlError::InvalidInput(_)));
        assert!(client.call_log().is_empty());
    }
}
