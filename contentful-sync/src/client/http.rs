use crate::client::ContentfulApi;
use crate::client::model::{
    Collection, Invitation, NewInvitation, NewSpaceMembership, NewTeamMembership, Organization,
    OrganizationMembership, Role, Space, SpaceMembership, Team, TeamMembership, User
};
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, ConnectorResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const MANAGEMENT_CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";

pub struct HttpContentfulClient {
    client: Client,
    base_url: String,
    organization_id: String,
    api_token: String,
    page_size: u32
}

impl HttpContentfulClient {
    pub fn new(config: &ConnectorConfig) -> ConnectorResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ConnectorError::Transport)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            organization_id: config.organization_id.clone(),
            api_token: config.api_token.clone(),
            page_size: config.page_size
        })
    }

    fn organization_path(&self, suffix: &str) -> String {
        format!("/organizations/{}{}", self.organization_id, suffix)
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn paged(&self, offset: u32) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.page_size.to_string()),
            ("skip", offset.to_string()),
        ]
    }

    async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        query: &[(&str, String)]
    ) -> ConnectorResult<T> {
        let url = self.url(path, query);
        debug!(url = %url, "Making Contentful API request");

        let request = self.client.get(&url);
        cancellable(cancel, async {
            let response = self.send(request).await?;
            decode(response).await
        })
        .await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B
    ) -> ConnectorResult<T> {
        let url = self.url(path, &[]);
        debug!(url = %url, "Posting to Contentful API");

        let request = self
            .client
            .post(&url)
            .header("Content-Type", MANAGEMENT_CONTENT_TYPE)
            .body(serde_json::to_vec(body)?);
        cancellable(cancel, async {
            let response = self.send(request).await?;
            decode(response).await
        })
        .await
    }

    async fn delete(&self, cancel: &CancellationToken, path: &str) -> ConnectorResult<()> {
        let url = self.url(path, &[]);
        debug!(url = %url, "Deleting via Contentful API");

        let request = self.client.delete(&url);
        cancellable(cancel, async {
            self.send(request).await?;
            Ok(())
        })
        .await
    }

    async fn send(&self, request: RequestBuilder) -> ConnectorResult<Response> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ConnectorError::api(status, body))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ConnectorResult<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    request: impl Future<Output = ConnectorResult<T>>
) -> ConnectorResult<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ConnectorError::Cancelled),
        result = request => result
    }
}

#[async_trait]
impl ContentfulApi for HttpContentfulClient {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn list_organizations(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Organization>> {
        self.get(cancel, "/organizations", &self.paged(offset)).await
    }

    async fn list_organization_memberships(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<OrganizationMembership>> {
        let path = self.organization_path("/organization_memberships");
        self.get(cancel, &path, &self.paged(offset)).await
    }

    async fn find_organization_memberships_by_user(
        &self,
        cancel: &CancellationToken,
        user_id: &str
    ) -> ConnectorResult<Collection<OrganizationMembership>> {
        let path = self.organization_path("/organization_memberships");
        self.get(cancel, &path, &[("sys.user.sys.id[eq]", user_id.to_string())])
            .await
    }

    async fn delete_organization_membership(
        &self,
        cancel: &CancellationToken,
        membership_id: &str
    ) -> ConnectorResult<()> {
        let path = self.organization_path(&format!("/organization_memberships/{}", membership_id));
        self.delete(cancel, &path).await
    }

    async fn list_spaces(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Space>> {
        self.get(cancel, "/spaces", &self.paged(offset)).await
    }

    async fn list_roles(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Role>> {
        let path = self.organization_path("/roles");
        self.get(cancel, &path, &self.paged(offset)).await
    }

    async fn list_space_memberships(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        offset: u32
    ) -> ConnectorResult<Collection<SpaceMembership>> {
        let path = format!("/spaces/{}/space_memberships", space_id);
        self.get(cancel, &path, &self.paged(offset)).await
    }

    async fn find_space_memberships_by_user(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        user_id: &str
    ) -> ConnectorResult<Collection<SpaceMembership>> {
        let path = self.organization_path("/space_memberships");
        self.get(
            cancel,
            &path,
            &[
                ("sys.space.sys.id[eq]", space_id.to_string()),
                ("sys.user.sys.id[eq]", user_id.to_string()),
            ]
        )
        .await
    }

    async fn create_space_membership(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        membership: &NewSpaceMembership
    ) -> ConnectorResult<SpaceMembership> {
        let path = format!("/spaces/{}/space_memberships", space_id);
        self.post(cancel, &path, membership).await
    }

    async fn delete_space_membership(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        membership_id: &str
    ) -> ConnectorResult<()> {
        let path = format!("/spaces/{}/space_memberships/{}", space_id, membership_id);
        self.delete(cancel, &path).await
    }

    async fn list_teams(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Team>> {
        let path = self.organization_path("/teams");
        self.get(cancel, &path, &self.paged(offset)).await
    }

    async fn list_team_memberships(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        offset: u32
    ) -> ConnectorResult<Collection<TeamMembership>> {
        let path = self.organization_path(&format!("/teams/{}/team_memberships", team_id));
        self.get(cancel, &path, &self.paged(offset)).await
    }

    async fn find_team_memberships_by_organization_membership(
        &self,
        cancel: &CancellationToken,
        organization_membership_id: &str,
        offset: u32
    ) -> ConnectorResult<Collection<TeamMembership>> {
        let path = self.organization_path("/team_memberships");
        let mut query = vec![(
            "sys.organizationMembership.sys.id",
            organization_membership_id.to_string()
        )];
        query.extend(self.paged(offset));
        self.get(cancel, &path, &query).await
    }

    async fn create_team_membership(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        organization_membership_id: &str
    ) -> ConnectorResult<TeamMembership> {
        let path = self.organization_path(&format!("/teams/{}/team_memberships", team_id));
        let body = NewTeamMembership {
            organization_membership_id: organization_membership_id.to_string()
        };
        self.post(cancel, &path, &body).await
    }

    async fn delete_team_membership(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        membership_id: &str
    ) -> ConnectorResult<()> {
        let path = self.organization_path(&format!(
            "/teams/{}/team_memberships/{}",
            team_id, membership_id
        ));
        self.delete(cancel, &path).await
    }

    async fn list_users(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<User>> {
        let path = self.organization_path("/users");
        self.get(cancel, &path, &self.paged(offset)).await
    }

    async fn find_users(
        &self,
        cancel: &CancellationToken,
        user_id: &str
    ) -> ConnectorResult<Collection<User>> {
        let path = self.organization_path("/users");
        self.get(cancel, &path, &[("query", user_id.to_string())])
            .await
    }

    async fn create_invitation(
        &self,
        cancel: &CancellationToken,
        invitation: &NewInvitation
    ) -> ConnectorResult<Invitation> {
        let path = self.organization_path("/invitations");
        self.post(cancel, &path, invitation).await
    }
}

pub fn create_http_client(config: &ConnectorConfig) -> ConnectorResult<Arc<dyn ContentfulApi>> {
    Ok(Arc::new(HttpContentfulClient::new(config)?))
}
