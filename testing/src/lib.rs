//! Shared test fixtures for the Contentful connector.
//!
//! Provides a mock Management API server plus JSON builders for the
//! payload shapes the connector decodes. Each test starts its own server;
//! nothing is shared between test processes.

mod fixtures;

pub use fixtures::*;
