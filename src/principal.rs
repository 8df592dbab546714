/// Principal (user) domain types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Authorization role carried in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Privileged,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Privileged => "privileged",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "privileged" => Ok(Role::Privileged),
            other => Err(AuthError::Validation(format!("unknown role: {}", other))),
        }
    }
}

/// A registered account
///
/// `password_hash` is skipped by serde; use [`Principal::view`] for anything
/// leaving the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    pub fn view(&self) -> PrincipalView {
        PrincipalView {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Outward-facing projection of a principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalView {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: "user-123".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Privileged,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
        assert_eq!("privileged".parse::<Role>().unwrap(), Role::Privileged);
        assert!("admin".parse::<Role>().is_err());
        assert!("Client".parse::<Role>().is_err());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_string(&principal()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"role\":\"privileged\""));
    }

    #[test]
    fn test_view_projection() {
        let p = principal();
        let view = p.view();
        assert_eq!(view.id, p.id);
        assert_eq!(view.email, p.email);
        assert_eq!(view.role, Role::Privileged);
    }
}
