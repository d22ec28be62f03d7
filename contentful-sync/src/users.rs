use crate::client::ContentfulApi;
use crate::client::model::{NewInvitation, User};
use crate::error::{ConnectorError, ConnectorResult};
use crate::pagination::{self, Page};
use crate::resource::{
    Entitlement, Grant, GrantOutcome, Resource, ResourceType, RevokeOutcome, UserProfile
};
use crate::syncer::ResourceSyncer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialOption {
    NoPassword
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCapability {
    pub supported_credentials: Vec<CredentialOption>,
    pub preferred_credential: CredentialOption
}

/// Request to create an account: the login is the email, the profile must
/// carry `firstName`, `lastName` and the organization `role`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: String,
    #[serde(default)]
    pub profile: Map<String, Value>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CreateAccountResponse {
    /// The user has to accept the invitation behind `message` before the account exists.
    ActionRequired { message: String }
}

pub struct UserSyncer {
    client: Arc<dyn ContentfulApi>
}

impl UserSyncer {
    pub fn new(client: Arc<dyn ContentfulApi>) -> Self {
        Self { client }
    }

    pub fn account_capability(&self) -> AccountCapability {
        AccountCapability {
            supported_credentials: vec![CredentialOption::NoPassword],
            preferred_credential: CredentialOption::NoPassword
        }
    }

    /// Invites the user into the organization and returns the invitation URL.
    pub async fn create_account(
        &self,
        cancel: &CancellationToken,
        account: &AccountInfo
    ) -> ConnectorResult<CreateAccountResponse> {
        let body = invitation_body(account)?;
        let invitation = self.client.create_invitation(cancel, &body).await?;
        info!(email = %body.email, invitation_id = %invitation.sys.id, "Created invitation");

        Ok(CreateAccountResponse::ActionRequired {
            message: invitation.sys.invitation_url.unwrap_or_default()
        })
    }

    /// Best effort: the last-active timestamp lives on the organization
    /// membership. Lookup failures leave it empty; cancellation does not.
    async fn last_active_at(
        &self,
        cancel: &CancellationToken,
        user_id: &str
    ) -> ConnectorResult<Option<DateTime<Utc>>> {
        match self
            .client
            .find_organization_memberships_by_user(cancel, user_id)
            .await
        {
            Ok(memberships) => Ok(memberships.first().and_then(|m| m.sys.last_active_at)),
            Err(ConnectorError::Cancelled) => Err(ConnectorError::Cancelled),
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "Could not read last activity");
                Ok(None)
            }
        }
    }

    async fn user_resource(
        &self,
        cancel: &CancellationToken,
        user: User
    ) -> ConnectorResult<Option<Resource>> {
        if user.sys.id.is_empty() {
            warn!(email = %user.email, "Skipping user without id");
            return Ok(None);
        }
        let last_active_at = self.last_active_at(cancel, &user.sys.id).await?;

        Ok(Some(Resource::user(
            user.sys.id,
            UserProfile {
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                two_factor_enabled: user.two_factor_enabled,
                created_at: user.sys.created_at,
                last_active_at
            }
        )))
    }
}

fn profile_field(account: &AccountInfo, key: &str) -> ConnectorResult<String> {
    account
        .profile
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::InvalidAccountInfo(format!("missing profile field {key}")))
}

fn invitation_body(account: &AccountInfo) -> ConnectorResult<NewInvitation> {
    if account.login.is_empty() {
        return Err(ConnectorError::InvalidAccountInfo(
            "login (email) is required".to_string()
        ));
    }
    Ok(NewInvitation {
        email: account.login.clone(),
        first_name: profile_field(account, "firstName")?,
        last_name: profile_field(account, "lastName")?,
        role: profile_field(account, "role")?
    })
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::User
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        cursor: Option<&str>
    ) -> ConnectorResult<Page<Resource>> {
        let offset = pagination::decode(cursor)?;
        let page = self.client.list_users(cancel, offset).await?;
        if page.is_empty() {
            return Ok(Page::empty());
        }
        let next_cursor = pagination::next_cursor(offset, page.items.len());

        let mut resources = Vec::with_capacity(page.items.len());
        for user in page.items {
            if let Some(resource) = self.user_resource(cancel, user).await? {
                resources.push(resource);
            }
        }

        Ok(Page::new(resources, next_cursor))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        _resource: &Resource,
        _cursor: Option<&str>
    ) -> ConnectorResult<Page<Entitlement>> {
        Ok(Page::empty())
    }

    async fn grants(
        &self,
        _cancel: &CancellationToken,
        _resource: &Resource,
        _cursor: Option<&str>
    ) -> ConnectorResult<Page<Grant>> {
        Ok(Page::empty())
    }

    async fn grant(
        &self,
        _cancel: &CancellationToken,
        _principal: &Resource,
        entitlement: &Entitlement
    ) -> ConnectorResult<GrantOutcome> {
        Err(ConnectorError::InvalidEntitlement(format!(
            "users have no entitlements: {}",
            entitlement.id
        )))
    }

    async fn revoke(
        &self,
        _cancel: &CancellationToken,
        grant: &Grant
    ) -> ConnectorResult<RevokeOutcome> {
        Err(ConnectorError::InvalidEntitlement(format!(
            "users have no grants: {}",
            grant.id
        )))
    }
}
