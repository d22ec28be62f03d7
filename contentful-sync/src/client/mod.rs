//! Access to the Contentful user-management API.
//!
//! Syncers only talk to [`ContentfulApi`]; [`HttpContentfulClient`] is the
//! reqwest-backed implementation. Every call takes the caller's
//! cancellation token and fails with `Cancelled` once it fires.

pub mod http;
pub mod model;

use crate::error::ConnectorResult;
use async_trait::async_trait;
use model::{
    Collection, Invitation, NewInvitation, NewSpaceMembership, Organization,
    OrganizationMembership, Role, Space, SpaceMembership, Team, TeamMembership, User
};
use tokio_util::sync::CancellationToken;

pub use http::HttpContentfulClient;

#[async_trait]
pub trait ContentfulApi: Send + Sync {
    /// Number of items requested per page.
    fn page_size(&self) -> u32;

    async fn list_organizations(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Organization>>;

    async fn list_organization_memberships(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<OrganizationMembership>>;

    async fn find_organization_memberships_by_user(
        &self,
        cancel: &CancellationToken,
        user_id: &str
    ) -> ConnectorResult<Collection<OrganizationMembership>>;

    async fn delete_organization_membership(
        &self,
        cancel: &CancellationToken,
        membership_id: &str
    ) -> ConnectorResult<()>;

    async fn list_spaces(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Space>>;

    /// Roles are listed organization-wide; each carries a link to its space.
    async fn list_roles(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Role>>;

    async fn list_space_memberships(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        offset: u32
    ) -> ConnectorResult<Collection<SpaceMembership>>;

    async fn find_space_memberships_by_user(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        user_id: &str
    ) -> ConnectorResult<Collection<SpaceMembership>>;

    async fn create_space_membership(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        membership: &NewSpaceMembership
    ) -> ConnectorResult<SpaceMembership>;

    async fn delete_space_membership(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        membership_id: &str
    ) -> ConnectorResult<()>;

    async fn list_teams(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<Team>>;

    async fn list_team_memberships(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        offset: u32
    ) -> ConnectorResult<Collection<TeamMembership>>;

    /// One page of the team memberships linked to an organization membership.
    async fn find_team_memberships_by_organization_membership(
        &self,
        cancel: &CancellationToken,
        organization_membership_id: &str,
        offset: u32
    ) -> ConnectorResult<Collection<TeamMembership>>;

    async fn create_team_membership(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        organization_membership_id: &str
    ) -> ConnectorResult<TeamMembership>;

    async fn delete_team_membership(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        membership_id: &str
    ) -> ConnectorResult<()>;

    async fn list_users(
        &self,
        cancel: &CancellationToken,
        offset: u32
    ) -> ConnectorResult<Collection<User>>;

    async fn find_users(
        &self,
        cancel: &CancellationToken,
        user_id: &str
    ) -> ConnectorResult<Collection<User>>;

    async fn create_invitation(
        &self,
        cancel: &CancellationToken,
        invitation: &NewInvitation
    ) -> ConnectorResult<Invitation>;
}
