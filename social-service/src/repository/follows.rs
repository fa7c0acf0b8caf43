use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::UserAccount;

/// Repository for the follow graph. The edge table is the relation; the
/// per-user counters on `users` are materialised views of it and change
/// only in the same transaction as the edge they describe.
#[derive(Clone)]
pub struct FollowRepository {
    pool: PgPool,
}

impl FollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a user mirror row (fed by identity-service sync).
    pub async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, "Upserted user mirror");
        Ok(())
    }

    /// Flip the activity flag off; the graph itself is left untouched.
    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING id",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<UserAccount>, sqlx::Error> {
        sqlx::query_as::<_, UserAccount>(
            "SELECT id, username, is_active, following_count, followers_count, \
             created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Idempotent edge insert; both user counters move in the same
    /// transaction, and only when a new row was actually inserted.
    /// Returns true if a new edge was created.
    pub async fn create_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        ensure_user_exists(&mut tx, follower_id).await?;
        ensure_user_exists(&mut tx, following_id).await?;

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO follows (follower_id, following_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, following_id) DO NOTHING
            RETURNING follower_id
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() {
            sqlx::query(
                "UPDATE users SET following_count = GREATEST(following_count + 1, 0), \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE users SET followers_count = GREATEST(followers_count + 1, 0), \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(following_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            follower_id = %follower_id,
            following_id = %following_id,
            inserted = inserted.is_some(),
            "Follow edge upsert"
        );

        Ok(inserted.is_some())
    }

    /// Idempotent edge delete, counters floored at zero in the same
    /// transaction. Returns true if an edge was removed.
    pub async fn delete_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM follows WHERE follower_id = $1 AND following_id = $2 \
             RETURNING follower_id",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_optional(&mut *tx)
        .await?;

        if removed.is_some() {
            sqlx::query(
                "UPDATE users SET following_count = GREATEST(following_count - 1, 0), \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE users SET followers_count = GREATEST(followers_count - 1, 0), \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(following_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            follower_id = %follower_id,
            following_id = %following_id,
            removed = removed.is_some(),
            "Follow edge delete"
        );

        Ok(removed.is_some())
    }

    pub async fn is_following(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Paginated ids this user follows, newest edge first.
    /// Returns (ids, total_count).
    pub async fn following_ids(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Uuid>, i64), sqlx::Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT following_id FROM follows WHERE follower_id = $1 \
             ORDER BY created_at DESC, following_id ASC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((ids, total))
    }

    /// Paginated ids following this user, newest edge first.
    /// Returns (ids, total_count).
    pub async fn follower_ids(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Uuid>, i64), sqlx::Error> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT follower_id FROM follows WHERE following_id = $1 \
             ORDER BY created_at DESC, follower_id ASC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((ids, total))
    }

    /// Complete following set, used to resolve the feed's author set.
    pub async fn all_following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT following_id FROM follows WHERE follower_id = $1 \
             ORDER BY created_at DESC, following_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

async fn ensure_user_exists(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id, username) VALUES ($1, $1::text) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
