use crate::error::{ConnectorError, ConnectorResult};
use crate::pagination::Page;
use crate::resource::{
    Entitlement, Grant, GrantOutcome, Resource, ResourceId, ResourceType, RevokeOutcome
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Sync and provisioning operations for one resource kind.
///
/// Paged operations take the cursor returned by the previous call (`None`
/// for the first page) and return `next_cursor: None` once the walk is done.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    async fn list(
        &self,
        cancel: &CancellationToken,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Resource>>;

    async fn entitlements(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Entitlement>>;

    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Grant>>;

    async fn grant(
        &self,
        cancel: &CancellationToken,
        principal: &Resource,
        entitlement: &Entitlement
    ) -> ConnectorResult<GrantOutcome>;

    async fn revoke(&self, cancel: &CancellationToken, grant: &Grant)
    -> ConnectorResult<RevokeOutcome>;
}

/// Grants and revokes only ever target user principals.
pub(crate) fn ensure_user_principal(principal: &ResourceId) -> ConnectorResult<()> {
    if principal.resource_type.is_principal() {
        Ok(())
    } else {
        Err(ConnectorError::UnsupportedResourceType(format!(
            "{} cannot be a grant principal",
            principal
        )))
    }
}
