use serde::{Deserialize, Serialize};

/// Account role assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// The user record persisted locally as the user-record storage entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
}

/// Wire shape of the `/auth/login` and `/auth/signup` envelope payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthSession {
    /// Extract the identity portion, dropping the credentials.
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: None,
            role: self.role,
        }
    }
}
