use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::crypto::{Keypair, PublicKey};

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Details supplied when signing somebody up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

impl Registration {
    pub fn new(
        email: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            firstname: firstname.into(),
            lastname: lastname.into(),
        }
    }
}

/// Normalized form used for uniqueness checks and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A user that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: Role,
    pub keypair: Keypair,
    pub registered_on: OffsetDateTime,
}

impl NewUser {
    pub fn new(registration: Registration, role: Role, keypair: Keypair) -> Self {
        Self {
            email: normalize_email(&registration.email),
            firstname: registration.firstname.trim().to_string(),
            lastname: registration.lastname.trim().to_string(),
            role,
            keypair,
            registered_on: OffsetDateTime::now_utc(),
        }
    }

    pub fn persisted(self, id: UserId) -> User {
        User {
            id,
            email: self.email,
            firstname: self.firstname,
            lastname: self.lastname,
            role: self.role,
            keypair: self.keypair,
            registered_on: self.registered_on,
        }
    }
}

/// A persisted user together with their draw keypair
///
/// Also serves as the acting identity handed to lottery operations.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: Role,
    pub keypair: Keypair,
    pub registered_on: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public()
    }
}
