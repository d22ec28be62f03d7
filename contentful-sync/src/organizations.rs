use crate::client::ContentfulApi;
use crate::error::{ConnectorError, ConnectorResult};
use crate::pagination::{self, Page};
use crate::resource::{
    Entitlement, Grant, GrantOutcome, Resource, ResourceId, ResourceType, RevokeOutcome
};
use crate::syncer::{ResourceSyncer, ensure_user_principal};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const ORG_OWNER: &str = "owner";
pub const ORG_ADMIN: &str = "admin";
pub const ORG_DEVELOPER: &str = "developer";
pub const ORG_MEMBER: &str = "member";

pub const ORGANIZATION_ROLES: [(&str, &str); 4] = [
    (ORG_OWNER, "Owner"),
    (ORG_ADMIN, "Admin"),
    (ORG_DEVELOPER, "Developer"),
    (ORG_MEMBER, "Member")
];

/// Entitlement for organization role `slug`, as listed by the projector.
pub fn role_entitlement(resource: &Resource, slug: &str) -> Entitlement {
    let label = ORGANIZATION_ROLES
        .iter()
        .find(|(known, _)| *known == slug)
        .map_or(slug, |(_, label)| *label);
    Entitlement::assignment(
        resource,
        slug,
        format!("{} of the {} organization", label, resource.display_name)
    )
}

pub struct OrganizationSyncer {
    client: Arc<dyn ContentfulApi>,
    organization_id: String
}

impl OrganizationSyncer {
    pub fn new(client: Arc<dyn ContentfulApi>, organization_id: impl Into<String>) -> Self {
        Self {
            client,
            organization_id: organization_id.into()
        }
    }

    /// Memberships are only readable for the organization the token is configured for.
    fn is_configured(&self, resource: &ResourceId) -> bool {
        resource.id == self.organization_id
    }
}

#[async_trait]
impl ResourceSyncer for OrganizationSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Organization
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Resource>> {
        let offset = pagination::decode(cursor)?;
        let page = self.client.list_organizations(cancel, offset).await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let resources = page
            .items
            .into_iter()
            .filter_map(|org| {
                if org.sys.id.is_empty() {
                    warn!(name = %org.name, "Skipping organization without id");
                    return None;
                }
                Some(Resource::organization(org.sys.id, org.name))
            })
            .collect();

        Ok(Page::new(resources, next_cursor))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        resource: &Resource,
        _cursor: Option<&str>
    ) -> ConnectorResult<Page<Entitlement>> {
        let entitlements = ORGANIZATION_ROLES
            .iter()
            .map(|(slug, _)| role_entitlement(resource, slug))
            .collect();
        Ok(Page::last(entitlements))
    }

    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Grant>> {
        let offset = pagination::decode(cursor)?;
        if !self.is_configured(&resource.id) {
            debug!(organization_id = %resource.id.id, "Not the configured organization, no grants");
            return Ok(Page::empty());
        }

        let page = self
            .client
            .list_organization_memberships(cancel, offset)
            .await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let grants = page
            .items
            .into_iter()
            .filter_map(|membership| match membership.sys.user {
                Some(user) => Some(Grant::new(
                    role_entitlement(resource, &membership.role),
                    ResourceId::user(user.id())
                )),
                None => {
                    warn!(membership_id = %membership.sys.id, "Organization membership without user");
                    None
                }
            })
            .collect();

        Ok(Page::new(grants, next_cursor))
    }

    /// Organization memberships come from accepted invitations, so there is
    /// nothing to create here.
    async fn grant(
        &self,
        _cancel: &CancellationToken,
        principal: &Resource,
        entitlement: &Entitlement
    ) -> ConnectorResult<GrantOutcome> {
        ensure_user_principal(&principal.id)?;
        let slug = entitlement.target_slug(ResourceType::Organization)?;
        info!(
            user_id = %principal.id.id,
            role = %slug,
            "Organization membership cannot be provisioned, skipping"
        );
        Ok(GrantOutcome::Unsupported)
    }

    async fn revoke(
        &self,
        cancel: &CancellationToken,
        grant: &Grant
    ) -> ConnectorResult<RevokeOutcome> {
        ensure_user_principal(&grant.principal)?;
        let resource = &grant.entitlement.resource.id;
        if !self.is_configured(resource) {
            return Err(ConnectorError::InvalidEntitlement(format!(
                "{} is not the configured organization",
                resource
            )));
        }

        let user_id = &grant.principal.id;
        let memberships = self
            .client
            .find_organization_memberships_by_user(cancel, user_id)
            .await?;
        let Some(membership) = memberships.first() else {
            info!(user_id = %user_id, "Organization membership already revoked");
            return Ok(RevokeOutcome::AlreadyRevoked);
        };

        match self
            .client
            .delete_organization_membership(cancel, &membership.sys.id)
            .await
        {
            Ok(()) => Ok(RevokeOutcome::Revoked),
            Err(e) if e.is_not_found() => Ok(RevokeOutcome::AlreadyRevoked),
            Err(e) => Err(e)
        }
    }
}
