//! The normalized resource / entitlement / grant graph handed to callers.

use crate::error::{ConnectorError, ConnectorResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Organization,
    Space,
    Team,
    User
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Space => "space",
            Self::Team => "team",
            Self::User => "user"
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Space => "Space",
            Self::Team => "Team",
            Self::User => "User"
        }
    }

    /// Users are principals; every other kind groups users.
    pub fn is_principal(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(Self::Organization),
            "space" => Ok(Self::Space),
            "team" => Ok(Self::Team),
            "user" => Ok(Self::User),
            other => Err(ConnectorError::UnsupportedResourceType(other.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub resource_type: ResourceType,
    pub id: String
}

impl ResourceId {
    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into()
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(ResourceType::User, id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub two_factor_enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceProfile {
    Group,
    Team { description: Option<String> },
    User(UserProfile)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
    pub profile: ResourceProfile
}

impl Resource {
    pub fn organization(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(ResourceType::Organization, id),
            display_name: name.into(),
            profile: ResourceProfile::Group
        }
    }

    pub fn space(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(ResourceType::Space, id),
            display_name: name.into(),
            profile: ResourceProfile::Group
        }
    }

    pub fn team(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>
    ) -> Self {
        Self {
            id: ResourceId::new(ResourceType::Team, id),
            display_name: name.into(),
            profile: ResourceProfile::Team { description }
        }
    }

    pub fn user(id: impl Into<String>, profile: UserProfile) -> Self {
        let display_name = format!("{} {}", profile.first_name, profile.last_name)
            .trim()
            .to_string();
        Self {
            id: ResourceId::user(id),
            display_name,
            profile: ResourceProfile::User(profile)
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.id.resource_type
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        match &self.profile {
            ResourceProfile::User(profile) => Some(profile),
            _ => None
        }
    }
}

/// A grantable capability on one resource, identified by
/// `"{kind}:{resource_id}:{slug}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub resource: Resource,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub grantable_to: Vec<ResourceType>
}

impl Entitlement {
    /// An assignment entitlement grantable to users.
    pub fn assignment(resource: &Resource, slug: impl Into<String>, description: String) -> Self {
        let slug = slug.into();
        Self {
            id: Self::format_id(&resource.id, &slug),
            resource: resource.clone(),
            slug,
            display_name: description.clone(),
            description,
            grantable_to: vec![ResourceType::User]
        }
    }

    pub fn format_id(resource: &ResourceId, slug: &str) -> String {
        format!("{}:{}:{}", resource.resource_type, resource.id, slug)
    }

    /// Splits an entitlement id back into (resource id, slug). Slugs may contain `:`.
    pub fn parse_id(id: &str) -> ConnectorResult<(ResourceId, String)> {
        let mut parts = id.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(kind), Some(resource_id), Some(slug))
                if !resource_id.is_empty() && !slug.is_empty() =>
            {
                let resource_type = kind
                    .parse::<ResourceType>()
                    .map_err(|_| ConnectorError::InvalidEntitlement(id.to_string()))?;
                Ok((ResourceId::new(resource_type, resource_id), slug.to_string()))
            }
            _ => Err(ConnectorError::InvalidEntitlement(id.to_string()))
        }
    }

    /// Slug recovered from the id, checked against the resource it claims to belong to.
    pub fn target_slug(&self, expected: ResourceType) -> ConnectorResult<String> {
        let (resource_id, slug) = Self::parse_id(&self.id)?;
        if resource_id.resource_type != expected || resource_id != self.resource.id {
            return Err(ConnectorError::InvalidEntitlement(format!(
                "{} does not belong to {}",
                self.id, self.resource.id
            )));
        }
        Ok(slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub entitlement: Entitlement,
    pub principal: ResourceId
}

impl Grant {
    /// Grant of `entitlement` to `principal`. Pass the same entitlement the
    /// projector emits so both compare equal.
    pub fn new(entitlement: Entitlement, principal: ResourceId) -> Self {
        Self {
            id: format!("{}:{}", entitlement.id, principal),
            entitlement,
            principal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOutcome {
    Granted,
    /// The kind cannot be provisioned through this API; nothing was changed.
    Unsupported
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeOutcome {
    Revoked,
    AlreadyRevoked
}
