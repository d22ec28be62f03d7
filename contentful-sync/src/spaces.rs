use crate::client::ContentfulApi;
use crate::client::model::{LinkSys, NewSpaceMembership};
use crate::error::{ConnectorError, ConnectorResult};
use crate::pagination::{self, Page};
use crate::role_cache::RoleCache;
use crate::resource::{
    Entitlement, Grant, GrantOutcome, Resource, ResourceId, ResourceType, RevokeOutcome
};
use crate::syncer::{ResourceSyncer, ensure_user_principal};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Synthetic entitlement backed by the membership admin flag rather than a role.
pub const SPACE_ADMIN: &str = "admin";

pub fn admin_entitlement(resource: &Resource) -> Entitlement {
    Entitlement::assignment(
        resource,
        SPACE_ADMIN,
        format!("Admin for {} space", resource.display_name)
    )
}

pub fn role_entitlement(resource: &Resource, role_name: &str) -> Entitlement {
    Entitlement::assignment(
        resource,
        role_name,
        format!("Role {} for {} space", role_name, resource.display_name)
    )
}

pub struct SpaceSyncer {
    client: Arc<dyn ContentfulApi>,
    roles: Arc<RoleCache>
}

impl SpaceSyncer {
    pub fn new(client: Arc<dyn ContentfulApi>, roles: Arc<RoleCache>) -> Self {
        Self { client, roles }
    }
}

#[async_trait]
impl ResourceSyncer for SpaceSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Space
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Resource>> {
        let offset = pagination::decode(cursor)?;
        let page = self.client.list_spaces(cancel, offset).await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let resources = page
            .items
            .into_iter()
            .filter_map(|space| {
                if space.sys.id.is_empty() {
                    warn!(name = %space.name, "Skipping space without id");
                    return None;
                }
                Some(Resource::space(space.sys.id, space.name))
            })
            .collect();

        Ok(Page::new(resources, next_cursor))
    }

    /// One entitlement per role of the space, plus `admin` on the first page only.
    async fn entitlements(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Entitlement>> {
        let offset = pagination::decode(cursor)?;
        let space_id = &resource.id.id;

        let page = self.client.list_roles(cancel, offset).await?;
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let mut entitlements: Vec<Entitlement> = page
            .items
            .into_iter()
            .filter(|role| role.space_id().is_none_or(|id| id == space_id))
            .map(|role| role_entitlement(resource, &role.name))
            .collect();

        if offset == 0 {
            entitlements.push(admin_entitlement(resource));
        }

        Ok(Page::new(entitlements, next_cursor))
    }

    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Grant>> {
        let offset = pagination::decode(cursor)?;
        let space_id = &resource.id.id;

        let page = self
            .client
            .list_space_memberships(cancel, space_id, offset)
            .await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let mut grants = Vec::with_capacity(page.items.len());
        for membership in page.items {
            let Some(user) = membership.sys.user else {
                warn!(membership_id = %membership.sys.id, "Space membership without user");
                continue;
            };
            let principal = ResourceId::user(user.id());

            if membership.admin {
                grants.push(Grant::new(admin_entitlement(resource), principal));
                continue;
            }

            for role in &membership.roles {
                let role_name = self
                    .roles
                    .resolve_name(cancel, space_id, role.id())
                    .await
                    .inspect_err(|e| {
                        warn!(space_id = %space_id, role_id = %role.id(), error = %e, "Role lookup failed");
                    })?;
                grants.push(Grant::new(role_entitlement(resource, &role_name), principal.clone()));
            }
        }

        Ok(Page::new(grants, next_cursor))
    }

    async fn grant(
        &self,
        cancel: &CancellationToken,
        principal: &Resource,
        entitlement: &Entitlement
    ) -> ConnectorResult<GrantOutcome> {
        ensure_user_principal(&principal.id)?;
        let role = entitlement.target_slug(ResourceType::Space)?;
        let space_id = &entitlement.resource.id.id;
        let user_id = &principal.id.id;

        // `query` is a free-text search; only an exact id match is this user.
        let users = self.client.find_users(cancel, user_id).await?;
        let user = users
            .items
            .iter()
            .find(|u| u.sys.id == *user_id)
            .ok_or_else(|| ConnectorError::UserNotFound {
                user_id: user_id.clone()
            })?;

        let admin = role == SPACE_ADMIN;
        let role_id = if admin {
            None
        } else {
            let role_id = self
                .roles
                .resolve_id(cancel, space_id, &role)
                .await
                .map_err(|e| match e {
                    ConnectorError::RoleNotFound { space_id, role } => {
                        ConnectorError::MissingRole { space_id, role }
                    }
                    other => other
                })?;
            if role_id.is_empty() {
                return Err(ConnectorError::MissingRole {
                    space_id: space_id.clone(),
                    role
                });
            }
            Some(role_id)
        };

        let body = NewSpaceMembership {
            admin,
            email: user.email.clone(),
            roles: role_id.into_iter().map(LinkSys::role).collect()
        };
        let created = self
            .client
            .create_space_membership(cancel, space_id, &body)
            .await?;

        debug!(
            space_id = %space_id,
            user_id = %user_id,
            role = %role,
            membership_id = %created.sys.id,
            "Created space membership"
        );
        Ok(GrantOutcome::Granted)
    }

    /// Deletes the user's whole membership in the space.
    async fn revoke(
        &self,
        cancel: &CancellationToken,
        grant: &Grant
    ) -> ConnectorResult<RevokeOutcome> {
        ensure_user_principal(&grant.principal)?;
        let space_id = &grant.entitlement.resource.id.id;
        let user_id = &grant.principal.id;

        let memberships = self
            .client
            .find_space_memberships_by_user(cancel, space_id, user_id)
            .await?;
        let Some(membership) = memberships.first() else {
            info!(space_id = %space_id, user_id = %user_id, "Space membership already revoked");
            return Ok(RevokeOutcome::AlreadyRevoked);
        };

        match self
            .client
            .delete_space_membership(cancel, space_id, &membership.sys.id)
            .await
        {
            Ok(()) => Ok(RevokeOutcome::Revoked),
            Err(e) if e.is_not_found() => Ok(RevokeOutcome::AlreadyRevoked),
            Err(e) => Err(e)
        }
    }
}
