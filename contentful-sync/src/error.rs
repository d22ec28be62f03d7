use thiserror::Error;

pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Contentful API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid pagination cursor: {cursor:?}")]
    InvalidCursor { cursor: String },

    #[error("Role {role} not found in space {space_id}")]
    RoleNotFound { space_id: String, role: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("No role id resolvable for {role} in space {space_id}")]
    MissingRole { space_id: String, role: String },

    #[error("Organization membership not found for user {user_id}")]
    OrganizationMembershipNotFound { user_id: String },

    #[error("Invalid entitlement: {0}")]
    InvalidEntitlement(String),

    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    #[error("Invalid account info: {0}")]
    InvalidAccountInfo(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String)
}

impl ConnectorError {
    /// Whether a caller may reasonably retry the failed page or request.
    /// Nothing inside this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    pub(crate) fn api(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            status: status.as_u16(),
            message: message.into()
        }
    }
}
