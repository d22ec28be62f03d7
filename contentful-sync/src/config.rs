use crate::error::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectorConfig {
    #[validate(length(min = 1))]
    pub api_token: String,
    #[validate(length(min = 1))]
    pub organization_id: String,
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub page_size: u32,
    #[serde(default = "default_request_timeout_seconds")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_seconds: u64
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            organization_id: String::new(),
            base_url: default_base_url(),
            page_size: default_page_size(),
            request_timeout_seconds: default_request_timeout_seconds()
        }
    }
}

impl ConnectorConfig {
    /// Reads the configuration from `CONTENTFUL_*` environment variables.
    ///
    /// `CONTENTFUL_TOKEN` and `CONTENTFUL_ORGANIZATION_ID` are required;
    /// `CONTENTFUL_BASE_URL`, `CONTENTFUL_PAGE_SIZE` and
    /// `CONTENTFUL_REQUEST_TIMEOUT_SECONDS` fall back to defaults.
    pub fn from_env() -> ConnectorResult<Self> {
        let api_token = std::env::var("CONTENTFUL_TOKEN")
            .map_err(|_| ConnectorError::Config("CONTENTFUL_TOKEN not set".to_string()))?;
        let organization_id = std::env::var("CONTENTFUL_ORGANIZATION_ID").map_err(|_| {
            ConnectorError::Config("CONTENTFUL_ORGANIZATION_ID not set".to_string())
        })?;

        let config = Self {
            api_token,
            organization_id,
            base_url: std::env::var("CONTENTFUL_BASE_URL").unwrap_or_else(|_| default_base_url()),
            page_size: std::env::var("CONTENTFUL_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAGE_SIZE),
            request_timeout_seconds: std::env::var("CONTENTFUL_REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_request_timeout_seconds)
        };
        config.validated()
    }

    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::default()
    }

    pub fn validated(self) -> ConnectorResult<Self> {
        self.validate()
            .map_err(|e| ConnectorError::Config(e.to_string()))?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Default)]
pub struct ConnectorConfigBuilder {
    api_token: Option<String>,
    organization_id: Option<String>,
    base_url: Option<String>,
    page_size: Option<u32>,
    request_timeout_seconds: Option<u64>
}

impl ConnectorConfigBuilder {
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = Some(seconds);
        self
    }

    pub fn build(self) -> ConnectorResult<ConnectorConfig> {
        let api_token = self
            .api_token
            .ok_or_else(|| ConnectorError::Config("api_token is required".to_string()))?;
        let organization_id = self
            .organization_id
            .ok_or_else(|| ConnectorError::Config("organization_id is required".to_string()))?;

        ConnectorConfig {
            api_token,
            organization_id,
            base_url: self.base_url.unwrap_or_else(default_base_url),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            request_timeout_seconds: self
                .request_timeout_seconds
                .unwrap_or_else(default_request_timeout_seconds)
        }
        .validated()
    }
}
