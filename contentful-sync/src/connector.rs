use crate::client::ContentfulApi;
use crate::client::http::create_http_client;
use crate::config::ConnectorConfig;
use crate::error::ConnectorResult;
use crate::organizations::OrganizationSyncer;
use crate::resource::{Entitlement, Grant, GrantOutcome, Resource, ResourceType, RevokeOutcome};
use crate::role_cache::RoleCache;
use crate::spaces::SpaceSyncer;
use crate::syncer::ResourceSyncer;
use crate::teams::TeamSyncer;
use crate::users::UserSyncer;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One connector session: the four syncers sharing a client and a role cache.
///
/// The role cache lives exactly as long as the connector, so build a new
/// connector for every sync run.
pub struct Connector {
    roles: Arc<RoleCache>,
    organizations: OrganizationSyncer,
    spaces: SpaceSyncer,
    teams: TeamSyncer,
    users: UserSyncer
}

impl Connector {
    pub fn new(config: &ConnectorConfig) -> ConnectorResult<Self> {
        let client = create_http_client(config)?;
        Ok(Self::with_client(client, &config.organization_id))
    }

    pub fn with_client(client: Arc<dyn ContentfulApi>, organization_id: &str) -> Self {
        let roles = Arc::new(RoleCache::new(Arc::clone(&client)));
        Self {
            organizations: OrganizationSyncer::new(Arc::clone(&client), organization_id),
            spaces: SpaceSyncer::new(Arc::clone(&client), Arc::clone(&roles)),
            teams: TeamSyncer::new(Arc::clone(&client)),
            users: UserSyncer::new(client),
            roles
        }
    }

    pub fn syncer(&self, resource_type: ResourceType) -> &dyn ResourceSyncer {
        match resource_type {
            ResourceType::Organization => &self.organizations,
            ResourceType::Space => &self.spaces,
            ResourceType::Team => &self.teams,
            ResourceType::User => &self.users
        }
    }

    /// Syncers in walk order: principals first, then the groups that reference them.
    pub fn syncers(&self) -> [&dyn ResourceSyncer; 4] {
        [&self.users, &self.organizations, &self.teams, &self.spaces]
    }

    pub fn users(&self) -> &UserSyncer {
        &self.users
    }

    pub fn role_cache(&self) -> &Arc<RoleCache> {
        &self.roles
    }

    pub async fn grant(
        &self,
        cancel: &CancellationToken,
        principal: &Resource,
        entitlement: &Entitlement
    ) -> ConnectorResult<GrantOutcome> {
        self.syncer(entitlement.resource.resource_type())
            .grant(cancel, principal, entitlement)
            .await
    }

    pub async fn revoke(
        &self,
        cancel: &CancellationToken,
        grant: &Grant
    ) -> ConnectorResult<RevokeOutcome> {
        self.syncer(grant.entitlement.resource.resource_type())
            .revoke(cancel, grant)
            .await
    }
}
