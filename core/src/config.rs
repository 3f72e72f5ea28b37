//! Client configuration: credentials, endpoints and API version.
//!
//! # Design
//! The library never reads files or environment variables. `Credentials`
//! derives serde traits so the embedding application can persist the key,
//! secret and token with whatever format it already uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REST_URL: &str = "https://api.rememberthemilk.com/services/rest/";
pub const DEFAULT_AUTH_URL: &str = "https://api.rememberthemilk.com/services/auth/";

/// Access level requested during authentication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Read,
    Write,
    Delete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Delete => "delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission level name other than `read`, `write` or `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission level: {0}")]
pub struct ParsePermissionError(pub String);

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "delete" => Ok(Permission::Delete),
            other => Err(ParsePermissionError(other.to_string())),
        }
    }
}

/// API key, shared secret, requested permission and the granted token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub shared_secret: String,
    #[serde(default)]
    pub perms: Permission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            shared_secret: shared_secret.into(),
            perms: Permission::default(),
            token: None,
        }
    }

    pub fn with_perms(mut self, perms: Permission) -> Self {
        self.perms = perms;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("shared_secret", &"<redacted>")
            .field("perms", &self.perms)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// REST and authentication endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub rest_url: String,
    pub auth_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoints of a service mounted at `base_url`, using the same
    /// `/services/rest/` and `/services/auth/` paths as the public service.
    pub fn at(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            rest_url: format!("{base}/services/rest/"),
            auth_url: format!("{base}/services/auth/"),
        }
    }
}

/// Reply format version requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVersion {
    /// No `v` parameter; the service answers in its original format.
    #[default]
    V1,
    /// Sends `v=2` on every call that accepts it.
    V2,
}
