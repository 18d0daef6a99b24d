//! Wire types shared by the session and the page loaders.
//!
//! The backend is an external collaborator; these types mirror the subset
//! of its JSON this front end reads or writes.

use serde::{Deserialize, Serialize};

/// Identity of the signed-in user. Held only in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// `POST /login` body.
#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /signup` body.
#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /getUserByToken` body.
#[derive(Debug, Serialize)]
pub struct TokenLookupRequest<'a> {
    pub token: &'a str,
}

/// User block of a login/signup response. Some backend builds omit `email`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Response of `POST /login` and `POST /signup`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

impl AuthResponse {
    /// Build the in-memory identity, falling back to the submitted email.
    #[must_use]
    pub fn identity(&self, submitted_email: &str) -> User {
        User {
            id: self.user.id.clone(),
            email: self
                .user
                .email
                .clone()
                .unwrap_or_else(|| submitted_email.to_owned()),
            name: self.user.name.clone(),
        }
    }
}

/// Identity returned by the bootstrap endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapUser {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<BootstrapUser> for User {
    fn from(u: BootstrapUser) -> Self {
        Self { id: u.id, email: u.email, name: u.name }
    }
}

/// A company record. Only the fields the pages read are typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Location summary as shown on the company page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

/// Accept both numeric and string identifiers from the backend.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
