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

pub const TEAM_MEMBER: &str = "member";

pub fn member_entitlement(resource: &Resource) -> Entitlement {
    Entitlement::assignment(
        resource,
        TEAM_MEMBER,
        format!("Member of {} team", resource.display_name)
    )
}

pub struct TeamSyncer {
    client: Arc<dyn ContentfulApi>
}

impl TeamSyncer {
    pub fn new(client: Arc<dyn ContentfulApi>) -> Self {
        Self { client }
    }

    async fn organization_membership_id(
        &self,
        cancel: &CancellationToken,
        user_id: &str
    ) -> ConnectorResult<Option<String>> {
        let memberships = self
            .client
            .find_organization_memberships_by_user(cancel, user_id)
            .await?;
        Ok(memberships.first().map(|m| m.sys.id.clone()))
    }

    /// Walks every page of the organization membership's team memberships
    /// until one for `team_id` turns up.
    async fn find_team_membership(
        &self,
        cancel: &CancellationToken,
        organization_membership_id: &str,
        team_id: &str
    ) -> ConnectorResult<Option<String>> {
        let mut offset = 0u32;

        loop {
            let page = self
                .client
                .find_team_memberships_by_organization_membership(
                    cancel,
                    organization_membership_id,
                    offset
                )
                .await?;
            if page.is_empty() {
                return Ok(None);
            }
            offset += page.items.len() as u32;

            let found = page
                .items
                .into_iter()
                .find(|m| m.sys.team.as_ref().is_some_and(|t| t.id() == team_id));
            if let Some(membership) = found {
                return Ok(Some(membership.sys.id));
            }
        }
    }
}

#[async_trait]
impl ResourceSyncer for TeamSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Team
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Resource>> {
        let offset = pagination::decode(cursor)?;
        let page = self.client.list_teams(cancel, offset).await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let resources = page
            .items
            .into_iter()
            .filter_map(|team| {
                if team.sys.id.is_empty() {
                    warn!(name = %team.name, "Skipping team without id");
                    return None;
                }
                let description = team.description.filter(|d| !d.is_empty());
                Some(Resource::team(team.sys.id, team.name, description))
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
        Ok(Page::last(vec![member_entitlement(resource)]))
    }

    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Grant>> {
        let offset = pagination::decode(cursor)?;
        let page = self
            .client
            .list_team_memberships(cancel, &resource.id.id, offset)
            .await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let member = member_entitlement(resource);
        let grants = page
            .items
            .into_iter()
            .filter_map(|membership| match membership.sys.user {
                Some(user) => Some(Grant::new(member.clone(), ResourceId::user(user.id()))),
                None => {
                    warn!(membership_id = %membership.sys.id, "Team membership without user");
                    None
                }
            })
            .collect();

        Ok(Page::new(grants, next_cursor))
    }

    /// Links the user's existing organization membership to the team.
    async fn grant(
        &self,
        cancel: &CancellationToken,
        principal: &Resource,
        entitlement: &Entitlement
    ) -> ConnectorResult<GrantOutcome> {
        ensure_user_principal(&principal.id)?;
        let slug = entitlement.target_slug(ResourceType::Team)?;
        if slug != TEAM_MEMBER {
            return Err(ConnectorError::InvalidEntitlement(entitlement.id.clone()));
        }
        let team_id = &entitlement.resource.id.id;
        let user_id = &principal.id.id;

        let organization_membership_id = self
            .organization_membership_id(cancel, user_id)
            .await?
            .ok_or_else(|| ConnectorError::OrganizationMembershipNotFound {
                user_id: user_id.clone()
            })?;

        let created = self
            .client
            .create_team_membership(cancel, team_id, &organization_membership_id)
            .await?;

        debug!(
            team_id = %team_id,
            user_id = %user_id,
            membership_id = %created.sys.id,
            "Created team membership"
        );
        Ok(GrantOutcome::Granted)
    }

    async fn revoke(
        &self,
        cancel: &CancellationToken,
        grant: &Grant
    ) -> ConnectorResult<RevokeOutcome> {
        ensure_user_principal(&grant.principal)?;
        let team_id = &grant.entitlement.resource.id.id;
        let user_id = &grant.principal.id;

        let Some(organization_membership_id) =
            self.organization_membership_id(cancel, user_id).await?
        else {
            info!(team_id = %team_id, user_id = %user_id, "User left the organization, team membership already revoked");
            return Ok(RevokeOutcome::AlreadyRevoked);
        };

        let Some(membership_id) = self
            .find_team_membership(cancel, &organization_membership_id, team_id)
            .await?
        else {
            info!(team_id = %team_id, user_id = %user_id, "Team membership already revoked");
            return Ok(RevokeOutcome::AlreadyRevoked);
        };

        match self
            .client
            .delete_team_membership(cancel, team_id, &membership_id)
            .await
        {
            Ok(()) => Ok(RevokeOutcome::Revoked),
            Err(e) if e.is_not_found() => Ok(RevokeOutcome::AlreadyRevoked),
            Err(e) => Err(e)
        }
    }
}
