//! Fixed-shape queries and provisioning shortcuts
//!
//! These sit beside the generic dispatcher for lookups whose request shape
//! does not follow the per-type table: inventory listings, route plan
//! searches, user listings, LDAP sync control and SRST provisioning.

use std::net::IpAddr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::client::{AxlClient, search_request};
use crate::error::{AxlError, Result};
use crate::normalize::normalize;
use crate::projection::{KeyedCollection, project};
use crate::registry::{DEVICE_POOL_FIELD, NAME_FIELD, PATTERN_FIELD, Verb};
use crate::site::{DIRN_FIELD, LINES_FIELD, dirn_entry, phone_lines};
use crate::transport::AxlTransport;
use crate::value::{AxlValue, FlatRecord, record};

/// Device pools named `DP_<site>` define the site codes
static SITE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^DP_(\w+)").expect("valid site code regex"));

/// Tags requested by [`AxlClient::phones_summary_by_site`]
pub const PHONE_SUMMARY_TAGS: &[&str] = &[
    NAME_FIELD,
    "description",
    "product",
    "callingSearchSpaceName",
    DEVICE_POOL_FIELD,
    "locationName",
    "ownerUserName",
];

pub const USER_SUMMARY_TAGS: &[&str] = &["firstName", "lastName", "userid", "primaryExtension"];

pub const ROUTE_PLAN_TAGS: &[&str] = &["dnOrPattern", "partition", "type", "routeDetail"];

/// Ports every SRST reference is provisioned with
pub const SRST_PORT: u16 = 2000;
pub const SRST_SIP_PORT: u16 = 5060;

/// Site codes from a list of device pool names, in input order
pub fn site_codes<'a>(device_pools: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    device_pools
        .into_iter()
        .filter_map(|pool| SITE_CODE.captures(pool))
        .filter_map(|caps| caps.get(1))
        .map(|code| code.as_str().to_string())
        .collect()
}

impl<T: AxlTransport> AxlClient<T> {
    async fn list_records(&self, procedure: &str, criteria: FlatRecord, tags: &[&str]) -> Result<Vec<FlatRecord>> {
        let reply = self.call(procedure, search_request(criteria, tags)).await?;
        normalize(&reply)
    }

    async fn list_type(&self, type_name: &str, criteria: FlatRecord, tags: &[&str]) -> Result<Vec<FlatRecord>> {
        let ty = self.registry().lookup(type_name, "list")?;
        self.list_records(&Verb::List.procedure(ty), criteria, tags)
            .await
    }

    /// Every phone on the cluster, uuid to name
    pub async fn phone_names(&self) -> Result<KeyedCollection> {
        let phones = self
            .list_type("Phone", record([(DEVICE_POOL_FIELD, "%")]), &[NAME_FIELD])
            .await?;
        project(&phones, NAME_FIELD, true)
    }

    /// Every device pool on the cluster, uuid to name
    pub async fn device_pool_names(&self) -> Result<KeyedCollection> {
        let pools = self
            .list_type("DevicePool", record([(NAME_FIELD, "%")]), &[NAME_FIELD])
            .await?;
        project(&pools, NAME_FIELD, true)
    }

    /// Site codes derived from `DP_<site>` device pool names
    pub async fn site_names(&self) -> Result<Vec<String>> {
        let pools = self.device_pool_names().await?;
        Ok(site_codes(pools.values().filter_map(AxlValue::as_str)))
    }

    /// Summary records for the phones of `site`
    pub async fn phones_summary_by_site(&self, site: &str) -> Result<Vec<FlatRecord>> {
        self.list_type(
            "Phone",
            record([(DEVICE_POOL_FIELD, format!("%{}%", site))]),
            PHONE_SUMMARY_TAGS,
        )
        .await
    }

    /// Dial patterns of the lines on phone `name`, in line order
    pub async fn directory_numbers_by_phone_name(&self, name: &str) -> Result<Vec<String>> {
        let phone = self.get_by_name(name, "Phone").await?;
        let has_lines = phone
            .get(LINES_FIELD)
            .and_then(AxlValue::as_record)
            .is_some_and(|lines| !lines.is_empty());
        if !has_lines {
            return Err(AxlError::missing_field(0, LINES_FIELD));
        }

        phone_lines(&phone)
            .enumerate()
            .map(|(index, line)| {
                line.get(DIRN_FIELD)
                    .and_then(|dirn| dirn.get(PATTERN_FIELD))
                    .and_then(AxlValue::text)
                    .map(str::to_string)
                    .ok_or_else(|| AxlError::missing_field(index, format!("{}.{}", DIRN_FIELD, PATTERN_FIELD)))
            })
            .collect()
    }

    /// Full line records for phone `name`, keyed by directory number uuid
    pub async fn lines_details_by_phone_name(&self, name: &str) -> Result<IndexMap<String, FlatRecord>> {
        let phone = self.get_by_name(name, "Phone").await?;
        let mut lines = IndexMap::new();
        for (uuid, _) in phone_lines(&phone).filter_map(dirn_entry) {
            let line = self.get_by_uuid(uuid, "Line").await?;
            lines.insert(uuid.to_string(), line);
        }
        Ok(lines)
    }

    /// Route plan entries matching `pattern` in `partition` (`%` for any)
    pub async fn route_plan(&self, pattern: &str, partition: &str) -> Result<Vec<FlatRecord>> {
        self.list_records(
            "listRoutePlan",
            record([("dnOrPattern", pattern), ("partition", partition)]),
            ROUTE_PLAN_TAGS,
        )
        .await
    }

    /// Summary records for every end user
    pub async fn all_users(&self) -> Result<Vec<FlatRecord>> {
        self.list_type("User", record([("userid", "%")]), USER_SUMMARY_TAGS)
            .await
    }

    /// Start (`sync = true`) or cancel a sync of LDAP directory `name`
    pub async fn do_ldap_sync(&self, name: &str, sync: bool) -> Result<AxlValue> {
        let request = record([(NAME_FIELD, AxlValue::from(name)), ("sync", AxlValue::from(sync))]);
        self.call("doLdapSync", AxlValue::Record(request)).await
    }

    pub async fn ldap_sync_status(&self, name: &str) -> Result<AxlValue> {
        self.call("getLdapSyncStatus", AxlValue::Record(record([(NAME_FIELD, name)])))
            .await
    }

    /// Add SRST reference `SRST_<site>` pointing at `ip`
    pub async fn add_srst_router(&self, site: &str, ip: IpAddr) -> Result<AxlValue> {
        if site.trim().is_empty() {
            return Err(AxlError::invalid_input("site must not be empty"));
        }
        let srst = record([
            (NAME_FIELD, AxlValue::from(format!("SRST_{}", site))),
            ("ipAddress", AxlValue::from(ip.to_string())),
            ("port", AxlValue::from(SRST_PORT)),
            ("SipPort", AxlValue::from(SRST_SIP_PORT)),
        ]);
        self.add_by_record(srst, "Srst").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_codes() {
        let pools = ["DP_NYC", "DP_LAX_2", "Default", "XDP_BAD", "DP_"];
        assert_eq!(site_codes(pools), vec!["NYC", "LAX_2"]);
    }
}
