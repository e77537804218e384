//! # AXL-Core
//!
//! Client for the Cisco Unified Communications Manager AXL SOAP interface.
//!
//! This crate provides:
//! - Generic list/get/add/update/remove dispatch over a registry of AXL object types
//! - Normalization of the one-vs-many reply shapes into record sequences
//! - Keyed projection of list replies (uuid to field value)
//! - Minimal-diff updates against the server's canonical object
//! - Site aggregation and dependency-ordered site teardown
//! - A per-client log of every remote call
//!
//! ## Architecture
//!
//! [`AxlClient`] owns a [`Registry`], a [`CallLog`] and an [`AxlTransport`].
//! The transport is the only part that talks to the network; everything above
//! it works on [`AxlValue`] trees and can be exercised with a scripted
//! transport.

pub mod error;
pub mod value;
pub mod normalize;
pub mod projection;
pub mod registry;
pub mod diff;
pub mod call_log;
pub mod transport;
pub mod client;
pub mod site;
pub mod directory;
pub mod config;
pub mod logging;

pub use error::{AxlError, Result, TransportError};
pub use value::{AxlValue, FlatRecord};
pub use projection::{KeyedCollection, RecordKey};
pub use registry::{ObjectType, Registry, SiteScope, Verb};
pub use diff::{SearchKey, compute_update};
pub use call_log::{CallLog, CallRecord};
pub use transport::{AxlTransport, SoapTransport};
pub use client::AxlClient;
pub use site::{DeletionStep, SiteDeletionReport};
pub use config::AxlConfig;

/// Convenient re-exports for callers
pub mod prelude {
    pub use crate::{AxlClient, AxlConfig, AxlError, AxlTransport, AxlValue, FlatRecord, KeyedCollection, RecordKey, Result};
    pub use crate::value::record;
}
