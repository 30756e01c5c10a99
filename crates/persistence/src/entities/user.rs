//! Player entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub uid: i64,
    pub email: String,
    pub email_digest: Option<String>,
    pub token_digest: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            uid: entity.uid,
            email: entity.email,
            email_digest: entity.email_digest,
            token_digest: entity.token_digest,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_entity_to_domain() {
        let entity = UserEntity {
            uid: 1,
            email: "uns-0f0f@progame.io".to_string(),
            email_digest: None,
            token_digest: None,
            created_at: Utc::now(),
        };
        let user: domain::models::User = entity.clone().into();
        assert_eq!(user.uid, entity.uid);
        assert_eq!(user.email, entity.email);
        assert!(!user.is_signed());
    }
}
