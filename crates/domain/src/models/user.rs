//! Player identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A player. Signed users carry the digests of their e-mail and token;
/// anonymous users carry only a synthetic e-mail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub uid: i64,
    pub email: String,
    pub email_digest: Option<String>,
    pub token_digest: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_signed(&self) -> bool {
        self.email_digest.is_some() && self.token_digest.is_some()
    }
}

/// Data for inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub email_digest: Option<String>,
    pub token_digest: Option<String>,
}
