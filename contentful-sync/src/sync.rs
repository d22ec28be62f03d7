use crate::connector::Connector;
use crate::error::{ConnectorError, ConnectorResult};
use crate::resource::{Entitlement, Grant, Resource};
use crate::syncer::ResourceSyncer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resources_synced: u32,
    pub entitlements_synced: u32,
    pub grants_synced: u32,
    pub errors: Vec<SyncError>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    pub entity_type: String,
    pub entity_id: String,
    pub error: String,
    pub timestamp: DateTime<Utc>
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            ..Default::default()
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, entity_type: &str, entity_id: &str, error: impl ToString) {
        self.errors.push(SyncError {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            error: error.to_string(),
            timestamp: Utc::now()
        });
    }
}

/// Everything one full walk produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub resources: Vec<Resource>,
    pub entitlements: Vec<Entitlement>,
    pub grants: Vec<Grant>,
    pub report: SyncReport
}

/// Drives every syncer page by page until each walk runs out of cursors.
pub struct SyncRunner<'a> {
    connector: &'a Connector
}

impl<'a> SyncRunner<'a> {
    pub fn new(connector: &'a Connector) -> Self {
        Self { connector }
    }

    /// Walks resources, entitlements and grants of every kind.
    ///
    /// A failed entitlement or grant walk is recorded against its resource and
    /// the run moves on; a failed resource listing skips the rest of that
    /// kind. Cancellation aborts the whole run.
    pub async fn run(&self, cancel: &CancellationToken) -> ConnectorResult<SyncSnapshot> {
        let mut snapshot = SyncSnapshot {
            report: SyncReport::new(),
            ..Default::default()
        };
        info!("Starting full Contentful sync");

        for syncer in self.connector.syncers() {
            let kind = syncer.resource_type();
            let resources = match list_all(syncer, cancel).await {
                Ok(resources) => resources,
                Err(ConnectorError::Cancelled) => return Err(ConnectorError::Cancelled),
                Err(e) => {
                    warn!(resource_type = %kind, error = %e, "Failed to list resources");
                    snapshot.report.add_error(kind.as_str(), "*", &e);
                    continue;
                }
            };
            debug!(resource_type = %kind, count = resources.len(), "Listed resources");

            for resource in &resources {
                match entitlements_of(syncer, cancel, resource).await {
                    Ok(entitlements) => snapshot.entitlements.extend(entitlements),
                    Err(ConnectorError::Cancelled) => return Err(ConnectorError::Cancelled),
                    Err(e) => {
                        warn!(resource = %resource.id, error = %e, "Failed to list entitlements");
                        snapshot.report.add_error(kind.as_str(), &resource.id.id, &e);
                    }
                }

                match grants_of(syncer, cancel, resource).await {
                    Ok(grants) => snapshot.grants.extend(grants),
                    Err(ConnectorError::Cancelled) => return Err(ConnectorError::Cancelled),
                    Err(e) => {
                        warn!(resource = %resource.id, error = %e, "Failed to list grants");
                        snapshot.report.add_error(kind.as_str(), &resource.id.id, &e);
                    }
                }
            }

            snapshot.resources.extend(resources);
        }

        let report = &mut snapshot.report;
        report.resources_synced = snapshot.resources.len() as u32;
        report.entitlements_synced = snapshot.entitlements.len() as u32;
        report.grants_synced = snapshot.grants.len() as u32;
        report.complete();
        info!(
            resources = report.resources_synced,
            entitlements = report.entitlements_synced,
            grants = report.grants_synced,
            errors = report.errors.len(),
            "Sync completed"
        );

        Ok(snapshot)
    }
}

pub async fn list_all(
    syncer: &dyn ResourceSyncer,
    cancel: &CancellationToken
) -> ConnectorResult<Vec<Resource>> {
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = syncer.list(cancel, cursor.as_deref()).await?;
        all.extend(page.items);
        cursor = page.next_cursor;

        if cursor.is_none() {
            break;
        }
    }

    Ok(all)
}

pub async fn entitlements_of(
    syncer: &dyn ResourceSyncer,
    cancel: &CancellationToken,
    resource: &Resource
) -> ConnectorResult<Vec<Entitlement>> {
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = syncer
            .entitlements(cancel, resource, cursor.as_deref())
            .await?;
        all.extend(page.items);
        cursor = page.next_cursor;

        if cursor.is_none() {
            break;
        }
    }

    Ok(all)
}

pub async fn grants_of(
    syncer: &dyn ResourceSyncer,
    cancel: &CancellationToken,
    resource: &Resource
) -> ConnectorResult<Vec<Grant>> {
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = syncer.grants(cancel, resource, cursor.as_deref()).await?;
        all.extend(page.items);
        cursor = page.next_cursor;

        if cursor.is_none() {
            break;
        }
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_report() {
        let mut report = SyncReport::new();
        assert!(report.completed_at.is_none());
        assert!(!report.has_errors());

        report.add_error("space", "sp1", "Role r9 not found in space sp1");
        assert!(report.has_errors());

        report.complete();
        assert!(report.completed_at.is_some());
    }

    #[test]
    fn test_sync_error_serialization() {
        let error = SyncError {
            entity_type: "team".to_string(),
            entity_id: "t1".to_string(),
            error: "boom".to_string(),
            timestamp: Utc::now()
        };

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("team"));
        assert!(json.contains("t1"));
    }
}
