//! Explicit session context with file-backed load/save boundaries.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::PadPalsError;

/// User id the storefront uses for an anonymous visitor.
pub const GUEST_ID: &str = "guest";

/// A user as the auth service reports them. Role flags may arrive as
/// booleans, 0/1 integers or null.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[serde(deserialize_with = "crate::account::deserialize_string_id")]
    #[schemars(with = "String")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    #[schemars(with = "bool")]
    pub is_admin: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    #[schemars(with = "bool")]
    pub is_super_admin: bool,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Null => Ok(false),
        serde_json::Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        other => Err(D::Error::custom(format!("expected boolean flag, got {other}"))),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionContext {
    user: Option<UserSession>,
}

impl SessionContext {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserSession) -> Self {
        Self { user: Some(user) }
    }

    pub fn login(&mut self, user: UserSession) {
        tracing::info!(user_id = %user.id, "session: signed in");
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user.id, "session: signed out");
        }
    }

    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    /// Id of the signed-in user, or `None` for guests.
    pub fn user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.id.as_str())
            .filter(|id| !id.is_empty() && *id != GUEST_ID)
    }

    pub fn is_guest(&self) -> bool {
        self.user_id().is_none()
    }

    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.is_admin || u.is_super_admin)
    }

    pub fn is_super_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_super_admin)
    }

    /// Read a saved session. A missing file yields a guest session.
    pub async fn load(path: &Path) -> Result<Self, PadPalsError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "session: no saved session");
                return Ok(Self::guest());
            }
            Err(e) => return Err(PadPalsError::Session(e.to_string())),
        };
        let user: UserSession = serde_json::from_str(&text).map_err(|e| {
            PadPalsError::Session(format!("decoding {}: {}", path.display(), e))
        })?;
        Ok(Self::signed_in(user))
    }

    /// Persist the session. Saving a guest session removes the file.
    pub async fn save(&self, path: &Path) -> Result<(), PadPalsError> {
        match self.user.as_ref().filter(|_| !self.is_guest()) {
            Some(user) => {
                let text = serde_json::to_string_pretty(user)
                    .map_err(|e| PadPalsError::Session(e.to_string()))?;
                tokio::fs::write(path, text)
                    .await
                    .map_err(|e| PadPalsError::Session(e.to_string()))
            }
            None => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    Err(PadPalsError::Session(e.to_string()))
                }
                _ => Ok(()),
            },
        }
    }
}
