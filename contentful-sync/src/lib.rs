//! Contentful identity connector.
//!
//! Enumerates organizations, spaces, teams and users of one Contentful
//! organization, projects their entitlements and grants, and reconciles
//! grant/revoke requests against the Management API.

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod organizations;
pub mod pagination;
pub mod resource;
pub mod role_cache;
pub mod spaces;
pub mod sync;
pub mod syncer;
pub mod teams;
pub mod users;

pub use client::{ContentfulApi, HttpContentfulClient};
pub use config::ConnectorConfig;
pub use connector::Connector;
pub use error::{ConnectorError, ConnectorResult};
pub use pagination::Page;
pub use resource::{
    Entitlement, Grant, GrantOutcome, Resource, ResourceId, ResourceType, RevokeOutcome
};
pub use role_cache::RoleCache;
pub use sync::{SyncReport, SyncRunner, SyncSnapshot};
pub use syncer::ResourceSyncer;
