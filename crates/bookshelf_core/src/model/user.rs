//! User record; has no relationships.

use crate::error::IntegrityViolation;
use serde::{Deserialize, Serialize};

pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Insert payload for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), IntegrityViolation> {
        if self.username.trim().is_empty() {
            return Err(IntegrityViolation::RequiredField {
                entity: "user",
                field: "username",
            });
        }
        if self.email.trim().is_empty() {
            return Err(IntegrityViolation::RequiredField {
                entity: "user",
                field: "email",
            });
        }
        Ok(())
    }
}
