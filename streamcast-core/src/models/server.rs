//! Connections to external systems owned by a user

use serde::{Deserialize, Serialize};

use super::{ServerId, UserId};

/// Live-TV provider server configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTvServer {
    pub id: ServerId,
    pub user_id: UserId,
    pub name: String,
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LiveTvServer {
    /// Username/password pair, if both are configured and non-empty
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for LiveTvServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTvServer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Smart-home hub connection (token acquisition happens elsewhere)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConnection {
    pub user_id: UserId,
    pub base_url: String,
    pub access_token: String,
}

impl std::fmt::Debug for HubConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConnection")
            .field("user_id", &self.user_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
