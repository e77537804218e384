//! Object-type registry
//!
//! Declarative table of every AXL object type the dispatcher accepts. Each entry
//! says which field a site search filters on, which tags a list request asks
//! for, and which lookup modes the type supports. Supporting a new type is a
//! new table row; the dispatcher has no per-type branches beyond the
//! [`SiteScope`] variants.

use indexmap::IndexMap;

use crate::error::{AxlError, Result};

/// Default search and return field for most object types
pub const NAME_FIELD: &str = "name";
pub const PATTERN_FIELD: &str = "pattern";
pub const PARTITION_FIELD: &str = "routePartitionName";
pub const DEVICE_POOL_FIELD: &str = "devicePoolName";

/// How objects of a type are attributed to a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteScope {
    /// Server-side wildcard search on the type's search field
    Search,
    /// Fetch all, then keep those whose device pool name contains the site
    DevicePoolFilter,
    /// Reachable only through the phones that own them
    PhoneTraversal,
}

/// One registered object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    /// AXL type name, as used in procedure names (`listDevicePool`)
    pub name: &'static str,
    /// Field the site search filters on
    pub search_field: &'static str,
    /// Tags requested by list calls; the first one is projected
    pub return_tags: &'static [&'static str],
    pub supports_get_by_name: bool,
    pub supports_get_by_pattern: bool,
    pub site_scope: SiteScope,
    /// Visited by whole-site aggregation
    pub in_site_sweep: bool,
}

impl ObjectType {
    /// Type with the default name search and name return tag
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            search_field: NAME_FIELD,
            return_tags: &[NAME_FIELD],
            supports_get_by_name: true,
            supports_get_by_pattern: false,
            site_scope: SiteScope::Search,
            in_site_sweep: true,
        }
    }

    /// Device type scoped by device pool name
    pub const fn device(name: &'static str) -> Self {
        Self {
            search_field: DEVICE_POOL_FIELD,
            ..Self::named(name)
        }
    }

    /// Dial-plan type searched by partition and projected on pattern
    pub const fn dial_pattern(name: &'static str) -> Self {
        Self {
            search_field: PARTITION_FIELD,
            return_tags: &[PATTERN_FIELD],
            supports_get_by_pattern: true,
            ..Self::named(name)
        }
    }

    /// Field projected out of list replies
    pub fn return_field(&self) -> &'static str {
        self.return_tags.first().copied().unwrap_or(NAME_FIELD)
    }
}

/// Search criteria for a site-scoped list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub search_field: &'static str,
    pub search_pattern: String,
    pub return_field: &'static str,
}

/// The standard type table, in site sweep order
pub static OBJECT_TYPES: &[ObjectType] = &[
    ObjectType::named("DevicePool"),
    ObjectType::named("Srst"),
    ObjectType::named("RoutePartition"),
    ObjectType::named("Css"),
    ObjectType::named("Location"),
    ObjectType::named("Region"),
    ObjectType::named("CallManagerGroup"),
    ObjectType::named("ConferenceBridge"),
    ObjectType::named("Mtp"),
    ObjectType::named("MediaResourceGroup"),
    ObjectType::named("MediaResourceList"),
    ObjectType::device("H323Gateway"),
    ObjectType::named("RouteGroup"),
    ObjectType::named("RouteList"),
    ObjectType {
        return_tags: &[PATTERN_FIELD, PARTITION_FIELD],
        ..ObjectType::dial_pattern("RoutePattern")
    },
    ObjectType {
        // natural key is pattern + partition
        supports_get_by_name: false,
        ..ObjectType::dial_pattern("TransPattern")
    },
    ObjectType::named("ApplicationDialRules"),
    ObjectType::dial_pattern("CallingPartyTransformationPattern"),
    ObjectType::dial_pattern("CalledPartyTransformationPattern"),
    ObjectType::named("DateTimeGroup"),
    ObjectType {
        in_site_sweep: false,
        ..ObjectType::device("Phone")
    },
    ObjectType {
        name: "Line",
        search_field: PATTERN_FIELD,
        return_tags: &[PATTERN_FIELD],
        supports_get_by_name: false,
        supports_get_by_pattern: true,
        site_scope: SiteScope::PhoneTraversal,
        in_site_sweep: false,
    },
    ObjectType::device("CtiRoutePoint"),
    ObjectType::dial_pattern("HuntPilot"),
    ObjectType {
        site_scope: SiteScope::DevicePoolFilter,
        ..ObjectType::named("RemoteDestinationProfile")
    },
    ObjectType {
        name: "User",
        search_field: "userid",
        return_tags: &["userid"],
        supports_get_by_name: false,
        supports_get_by_pattern: false,
        site_scope: SiteScope::Search,
        in_site_sweep: false,
    },
];

/// Lookup table over a set of [`ObjectType`]s
#[derive(Debug, Clone)]
pub struct Registry {
    types: IndexMap<&'static str, ObjectType>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Registry {
    /// Registry over [`OBJECT_TYPES`]
    pub fn standard() -> Self {
        Self::from_types(OBJECT_TYPES.iter().cloned())
    }

    /// Registry over a custom table; later duplicates replace earlier entries
    pub fn from_types(types: impl IntoIterator<Item = ObjectType>) -> Self {
        Self {
            types: types.into_iter().map(|t| (t.name, t)).collect(),
        }
    }

    pub fn is_supported(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Resolve a type name, failing with `UnsupportedType` if unregistered
    pub fn lookup(&self, type_name: &str, operation: &'static str) -> Result<&ObjectType> {
        self.types
            .get(type_name)
            .ok_or_else(|| AxlError::unsupported(type_name, operation))
    }

    /// All registered types, in table order
    pub fn types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.values()
    }

    /// Types visited by whole-site aggregation
    pub fn site_sweep(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.values().filter(|t| t.in_site_sweep)
    }

    /// Wildcard search for `site` on the type's search field
    pub fn search_criteria_for(&self, type_name: &str, site: &str) -> Result<SearchCriteria> {
        let ty = self.lookup(type_name, "site search")?;
        Ok(SearchCriteria {
            search_field: ty.search_field,
            search_pattern: format!("%{}%", site),
            return_field: ty.return_field(),
        })
    }
}

/// Remote operation verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Get,
    Add,
    Update,
    Remove,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::List => "list",
            Verb::Get => "get",
            Verb::Add => "add",
            Verb::Update => "update",
            Verb::Remove => "remove",
        }
    }

    /// Remote procedure name, e.g. `listDevicePool`
    ///
    /// The type name keeps its casing in the procedure name, even for `add`
    /// whose request wrapper key is lower-first (see [`wrapper_key`]).
    pub fn procedure(&self, ty: &ObjectType) -> String {
        format!("{}{}", self.as_str(), ty.name)
    }
}

/// Request wrapper key for `add` calls: `DevicePool` -> `devicePool`
pub fn wrapper_key(ty: &ObjectType) -> String {
    lower_first(ty.name)
}

/// Lower-case only the first character
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
