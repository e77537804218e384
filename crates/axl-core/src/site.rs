//! Site and topology aggregation
//!
//! A "site" is a substring convention: objects whose names, partitions or
//! device pools contain the site code belong to it. Operations here compose
//! the dispatcher primitives across every registered type.
//!
//! Whole-site reads are fail-soft per type. A type that cannot be listed is
//! logged and reported as empty so one broken type does not hide the rest.
//! Whole-site deletion never aborts; every outcome lands in the
//! [`SiteDeletionReport`].

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::client::{AxlClient, search_request};
use crate::error::{AxlError, Result};
use crate::normalize::normalize;
use crate::projection::{KeyedCollection, RecordKey, UUID_FIELD, project};
use crate::registry::{DEVICE_POOL_FIELD, NAME_FIELD, PATTERN_FIELD, Verb};
use crate::transport::AxlTransport;
use crate::value::{AxlValue, FlatRecord, record};

pub const LINES_FIELD: &str = "lines";
pub const DIRN_FIELD: &str = "dirn";

/// Tags requested when listing remote destination profiles
pub const RDP_SUMMARY_TAGS: &[&str] = &[
    NAME_FIELD,
    "model",
    "callingSearchSpaceName",
    DEVICE_POOL_FIELD,
    "userId",
    UUID_FIELD,
];

const STANDARD_LOCAL_ROUTE_GROUP: &str = "Standard Local Route Group";

/// One step of whole-site deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    /// Remove every site object of this type
    Remove(&'static str),
    /// Clear media resource list and local route group on the site's device
    /// pools so the objects they reference can be removed
    DetachDevicePools,
}

impl DeletionStep {
    /// Report key for this step
    pub fn name(&self) -> &'static str {
        match self {
            DeletionStep::Remove(type_name) => type_name,
            DeletionStep::DetachDevicePools => "updateDevicePool",
        }
    }
}

/// Dependency order for tearing down a site
pub const SITE_DELETION_ORDER: &[DeletionStep] = &[
    DeletionStep::Remove("RemoteDestinationProfile"),
    DeletionStep::Remove("HuntPilot"),
    DeletionStep::Remove("CtiRoutePoint"),
    DeletionStep::Remove("CalledPartyTransformationPattern"),
    DeletionStep::Remove("CallingPartyTransformationPattern"),
    DeletionStep::Remove("ApplicationDialRules"),
    DeletionStep::Remove("TransPattern"),
    DeletionStep::DetachDevicePools,
    DeletionStep::Remove("RouteGroup"),
    DeletionStep::Remove("H323Gateway"),
    DeletionStep::Remove("MediaResourceList"),
    DeletionStep::Remove("MediaResourceGroup"),
    DeletionStep::Remove("Mtp"),
    DeletionStep::Remove("ConferenceBridge"),
    DeletionStep::Remove("DevicePool"),
    DeletionStep::Remove("CallManagerGroup"),
    DeletionStep::Remove("Region"),
    DeletionStep::Remove("Location"),
    DeletionStep::Remove("Css"),
    DeletionStep::Remove("RoutePartition"),
    DeletionStep::Remove("Srst"),
];

/// Per-step, per-object outcomes of [`AxlClient::delete_all_of_site`]
pub type SiteDeletionReport = IndexMap<String, IndexMap<RecordKey, Result<AxlValue>>>;

/// Line entries of a phone record
///
/// `lines` holds one `line` record when the phone has a single line and a list
/// of them otherwise; both shapes are flattened. A phone without lines yields
/// nothing.
pub fn phone_lines(phone: &FlatRecord) -> impl Iterator<Item = &AxlValue> {
    phone
        .get(LINES_FIELD)
        .and_then(AxlValue::as_record)
        .into_iter()
        .flat_map(|lines| lines.values())
        .flat_map(|entry| entry.one_or_many())
}

/// `(uuid, pattern)` of a line's directory number, when both are present
pub fn dirn_entry(line: &AxlValue) -> Option<(&str, &str)> {
    let dirn = line.get(DIRN_FIELD)?;
    let non_empty = |field: &str| {
        dirn.get(field)
            .and_then(AxlValue::text)
            .filter(|v| !v.is_empty())
    };
    Some((non_empty(UUID_FIELD)?, non_empty(PATTERN_FIELD)?))
}

impl<T: AxlTransport> AxlClient<T> {
    /// Lines on the phones of `site`, as directory number uuid to pattern
    ///
    /// Lines carry no site attribute; they are found by fetching each phone in
    /// the site's device pools and walking its line appearances.
    pub async fn lines_by_site(&self, site: &str) -> Result<KeyedCollection> {
        let phone_type = self.registry().lookup("Phone", "list lines by site")?;
        let phones = self.list_searched(phone_type, site).await?;

        let mut lines = KeyedCollection::new();
        for key in phones.keys() {
            let Some(uuid) = key.uuid() else {
                warn!("Skipping phone {} of site {}: no uuid, lines not collected", key, site);
                continue;
            };
            let phone = self.get_by_uuid(uuid, phone_type.name).await?;
            for (dirn_uuid, pattern) in phone_lines(&phone).filter_map(dirn_entry) {
                lines.insert(RecordKey::from(dirn_uuid), AxlValue::from(pattern));
            }
        }
        Ok(lines)
    }

    /// Remote destination profiles whose device pool name contains `site`
    ///
    /// Profiles cannot be searched by device pool on the server, so all of
    /// them are fetched and filtered here.
    pub async fn remote_destination_profiles_by_site(&self, site: &str) -> Result<KeyedCollection> {
        let ty = self
            .registry()
            .lookup("RemoteDestinationProfile", "list by site")?;
        let request = search_request(record([(NAME_FIELD, "%")]), RDP_SUMMARY_TAGS);
        let reply = self.call(&Verb::List.procedure(ty), request).await?;

        let at_site: Vec<FlatRecord> = normalize(&reply)?
            .into_iter()
            .filter(|profile| {
                profile
                    .get(DEVICE_POOL_FIELD)
                    .and_then(AxlValue::text)
                    .is_some_and(|pool| pool.contains(site))
            })
            .collect();
        project(&at_site, NAME_FIELD, true)
    }

    /// Every swept type's objects at `site`
    ///
    /// A type whose listing fails is logged and reported as empty.
    pub async fn all_of_site(&self, site: &str) -> IndexMap<String, KeyedCollection> {
        let mut site_objects = IndexMap::new();
        for ty in self.registry().site_sweep() {
            let objects = match self.list_by_type_and_site(ty.name, site).await {
                Ok(objects) => objects,
                Err(e) => {
                    warn!("Listing {} for site {} failed: {}", ty.name, site, e);
                    KeyedCollection::new()
                }
            };
            site_objects.insert(ty.name.to_string(), objects);
        }

        let total: usize = site_objects.values().map(|objects| objects.len()).sum();
        info!("Site {}: {} objects across {} types", site, total, site_objects.len());
        site_objects
    }

    /// Full records for every swept type's objects at `site`
    ///
    /// Fail-soft per type, like [`all_of_site`](Self::all_of_site). An object
    /// without a uuid cannot be fetched and fails its whole type.
    pub async fn all_detailed_of_site(&self, site: &str) -> IndexMap<String, IndexMap<RecordKey, FlatRecord>> {
        let mut detailed = IndexMap::new();
        for (type_name, objects) in self.all_of_site(site).await {
            let details = match self.fetch_details(&type_name, &objects).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("Fetching {} details for site {} failed: {}", type_name, site, e);
                    IndexMap::new()
                }
            };
            detailed.insert(type_name, details);
        }
        detailed
    }

    async fn fetch_details(
        &self,
        type_name: &str,
        objects: &KeyedCollection,
    ) -> Result<IndexMap<RecordKey, FlatRecord>> {
        let mut details = IndexMap::with_capacity(objects.len());
        for (index, key) in objects.keys().enumerate() {
            let uuid = key
                .uuid()
                .ok_or_else(|| AxlError::missing_field(index, UUID_FIELD))?;
            details.insert(key.clone(), self.get_by_uuid(uuid, type_name).await?);
        }
        Ok(details)
    }

    /// Remove every object of `site` in dependency order
    ///
    /// Each removal is attempted regardless of earlier failures. Objects
    /// listed without a uuid are skipped.
    pub async fn delete_all_of_site(&self, site: &str) -> SiteDeletionReport {
        warn!("Deleting every object of site {}", site);
        let site_objects = self.all_of_site(site).await;

        let mut report = SiteDeletionReport::new();
        for step in SITE_DELETION_ORDER {
            let type_name = match step {
                DeletionStep::Remove(type_name) => *type_name,
                DeletionStep::DetachDevicePools => "DevicePool",
            };
            let Some(objects) = site_objects.get(type_name) else { continue };

            for key in objects.keys() {
                let Some(uuid) = key.uuid() else {
                    warn!("Skipping {} entry {} of site {}: no uuid", type_name, key, site);
                    continue;
                };
                let outcome = match step {
                    DeletionStep::Remove(_) => self.delete_by_uuid(uuid, type_name).await,
                    DeletionStep::DetachDevicePools => self.detach_device_pool(uuid).await,
                };
                if let Err(e) = &outcome {
                    warn!("{} {} failed: {}", step.name(), uuid, e);
                }
                report
                    .entry(step.name().to_string())
                    .or_default()
                    .insert(key.clone(), outcome);
            }
        }

        let failed = report
            .values()
            .flat_map(|outcomes| outcomes.values())
            .filter(|outcome| outcome.is_err())
            .count();
        info!("Site {} deletion finished with {} failure(s)", site, failed);
        report
    }

    async fn detach_device_pool(&self, uuid: &str) -> Result<AxlValue> {
        let ty = self.registry().lookup("DevicePool", "detach")?;
        let request = record([
            (UUID_FIELD, AxlValue::from(uuid)),
            ("mediaResourceListName", AxlValue::empty()),
            (
                "localRouteGroup",
                AxlValue::Record(record([("name", STANDARD_LOCAL_ROUTE_GROUP), ("value", "")])),
            ),
        ]);
        self.call(&Verb::Update.procedure(ty), AxlValue::Record(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phone(value: serde_json::Value) -> FlatRecord {
        AxlValue::from(value).into_record().unwrap()
    }

    #[test]
    fn test_single_line_phone() {
        let phone = phone(json!({
            "name": "SEP001",
            "lines": {"line": {"index": "1", "dirn": {"pattern": "1001", "uuid": "{D1}"}}}
        }));
        let entries: Vec<_> = phone_lines(&phone).filter_map(dirn_entry).collect();
        assert_eq!(entries, vec![("{D1}", "1001")]);
    }

    #[test]
    fn test_multi_line_phone() {
        let phone = phone(json!({
            "name": "SEP002",
            "lines": {"line": [
                {"index": "1", "dirn": {"pattern": "2001", "uuid": "{D1}"}},
                {"index": "2", "dirn": {"pattern": "2002", "uuid": "{D2}"}},
                {"index": "3", "dirn": {"pattern": "", "uuid": "{D3}"}}
            ]}
        }));
        let entries: Vec<_> = phone_lines(&phone).filter_map(dirn_entry).collect();
        assert_eq!(entries, vec![("{D1}", "2001"), ("{D2}", "2002")]);
    }

    #[test]
    fn test_phone_without_lines() {
        let phone = phone(json!({"name": "SEP003", "lines": ""}));
        assert_eq!(phone_lines(&phone).count(), 0);
    }

    #[test]
    fn test_deletion_order_detaches_pools_before_removing_them() {
        let position = |step: DeletionStep| SITE_DELETION_ORDER.iter().position(|s| *s == step).unwrap();
        assert!(position(DeletionStep::DetachDevicePools) < position(DeletionStep::Remove("MediaResourceList")));
        assert!(position(DeletionStep::DetachDevicePools) < position(DeletionStep::Remove("RouteGroup")));
        assert!(position(DeletionStep::Remove("DevicePool")) < position(DeletionStep::Remove("Srst")));
        assert_eq!(SITE_DELETION_ORDER.first(), Some(&DeletionStep::Remove("RemoteDestinationProfile")));
        assert_eq!(DeletionStep::DetachDevicePools.name(), "updateDevicePool");
    }
}
