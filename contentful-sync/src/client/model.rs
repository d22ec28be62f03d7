use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope of every paged list endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Collection<T> {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>
}

impl<T> Collection<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub sys_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub user: Option<Link>,
    pub space: Option<Link>,
    pub team: Option<Link>,
    pub organization_membership: Option<Link>,
    pub invitation_url: Option<String>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Link {
    pub sys: LinkSys
}

impl Link {
    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    #[serde(rename = "type", default = "link_type")]
    pub sys_type: String,
    #[serde(default)]
    pub link_type: String,
    pub id: String
}

fn link_type() -> String {
    "Link".to_string()
}

impl LinkSys {
    pub fn role(id: impl Into<String>) -> Self {
        Self {
            sys_type: link_type(),
            link_type: "Role".to_string(),
            id: id.into()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Organization {
    pub name: String,
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Space {
    pub name: String,
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(rename = "2faEnabled", default)]
    pub two_factor_enabled: bool,
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sys: Sys
}

impl Role {
    pub fn space_id(&self) -> Option<&str> {
        self.sys.space.as_ref().map(Link::id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizationMembership {
    pub role: String,
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpaceMembership {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub roles: Vec<Link>,
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamMembership {
    pub sys: Sys
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Invitation {
    pub sys: Sys
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSpaceMembership {
    pub admin: bool,
    pub email: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<LinkSys>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMembership {
    pub organization_membership_id: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String
}
