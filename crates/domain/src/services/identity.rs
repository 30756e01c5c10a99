//! Identity issuance for players.
//!
//! Anonymous players get a random synthetic e-mail. Signed players are known
//! only by keyed digests of their e-mail and token; the plaintext e-mail is
//! never stored.

use shared::crypto::SignedKey;
use tracing::info;
use uuid::Uuid;

use super::store::{PlayStore, StoreError};
use crate::models::{NewUser, User};

pub const DEFAULT_EMAIL_DOMAIN: &str = "progame.io";

#[derive(Debug, Clone)]
pub struct Identity {
    key: SignedKey,
    email_domain: String,
}

impl Identity {
    pub fn new(key: SignedKey, email_domain: impl Into<String>) -> Self {
        Self {
            key,
            email_domain: email_domain.into(),
        }
    }

    /// Keyed digest of an e-mail or token.
    pub fn digest(&self, value: &str) -> String {
        self.key.digest(value)
    }

    /// Synthetic e-mail for an anonymous player: `uns-<uuid4 hex>@<domain>`.
    pub fn anonymous_email(&self) -> String {
        format!("uns-{}@{}", Uuid::new_v4().simple(), self.email_domain)
    }

    /// Synthetic e-mail for a signed player.
    ///
    /// The token digest is carried as a `+` tag so that the same e-mail signed
    /// with different tokens yields distinct users under a unique e-mail column.
    pub fn signed_email(&self, email_digest: &str, token_digest: &str) -> String {
        format!("{}+{}@{}", email_digest, token_digest, self.email_domain)
    }

    /// Creates a fresh anonymous user.
    pub async fn anonymous<S>(&self, store: &mut S) -> Result<User, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let user = store
            .insert_user(NewUser {
                email: self.anonymous_email(),
                email_digest: None,
                token_digest: None,
            })
            .await?;
        info!(user_uid = user.uid, "Anonymous user created");
        Ok(user)
    }

    /// Looks up the signed user for an (e-mail, token) pair.
    pub async fn find_signed<S>(
        &self,
        store: &mut S,
        email: &str,
        token: &str,
    ) -> Result<Option<User>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let email_digest = self.digest(email);
        let token_digest = self.digest(token);
        store
            .find_user_by_digests(&email_digest, &token_digest)
            .await
    }

    /// Returns the signed user for an (e-mail, token) pair, creating it on first use.
    pub async fn signed<S>(&self, store: &mut S, email: &str, token: &str) -> Result<User, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let email_digest = self.digest(email);
        let token_digest = self.digest(token);

        if let Some(user) = store
            .find_user_by_digests(&email_digest, &token_digest)
            .await?
        {
            return Ok(user);
        }

        let user = store
            .insert_user(NewUser {
                email: self.signed_email(&email_digest, &token_digest),
                email_digest: Some(email_digest),
                token_digest: Some(token_digest),
            })
            .await?;
        info!(user_uid = user.uid, "Signed user created");
        Ok(user)
    }
}
