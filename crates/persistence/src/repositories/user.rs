//! User repository for database operations.

use domain::models::NewUser;
use sqlx::PgConnection;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for player rows. Queries run on the caller's connection or transaction.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by uid.
    pub async fn find_by_uid(
        conn: &mut PgConnection,
        uid: i64,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_uid");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT uid, email, email_digest, token_digest, created_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Lock a user row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, uid: i64) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("lock_user");
        let result = sqlx::query_scalar::<_, i64>("SELECT uid FROM users WHERE uid = $1 FOR UPDATE")
            .bind(uid)
            .fetch_optional(conn)
            .await;
        timer.record();
        result
    }

    /// Find the signed user owning both digests.
    pub async fn find_by_digests(
        conn: &mut PgConnection,
        email_digest: &str,
        token_digest: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_digests");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT uid, email, email_digest, token_digest, created_at
            FROM users
            WHERE email_digest = $1 AND token_digest = $2
            "#,
        )
        .bind(email_digest)
        .bind(token_digest)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Insert a user.
    pub async fn insert(conn: &mut PgConnection, user: &NewUser) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, email_digest, token_digest)
            VALUES ($1, $2, $3)
            RETURNING uid, email, email_digest, token_digest, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.email_digest)
        .bind(&user.token_digest)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }
}
