use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::models::Comment;
use crate::domain::query::{CommentSortKey, SortOrder};

const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.author_id, c.parent_comment_id, c.body, c.likes_count, \
     c.is_deleted, c.created_at, c.updated_at";

/// Repository for Comment rows. Reads join the owning post so that a
/// soft-deleted post hides its whole comment tree; writes that change the
/// tree size also maintain the post's `comments_count` in one transaction.
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a comment and bump the post's comment counter together.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Comment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        ensure_author_exists(&mut tx, author_id).await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, body, parent_comment_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, author_id, parent_comment_id, body, likes_count,
                      is_deleted, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(body)
        .bind(parent_comment_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE posts SET comments_count = GREATEST(comments_count + 1, 0), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(comment)
    }

    /// Find a live comment on a live post.
    pub async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN posts p ON p.id = c.post_id AND p.is_deleted = FALSE
            WHERE c.id = $1 AND c.is_deleted = FALSE
            "#
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find a comment row regardless of its own deletion flag, as long as
    /// the owning post is live. A deleted comment still anchors its reply
    /// thread.
    pub async fn find_comment_any(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN posts p ON p.id = c.post_id AND p.is_deleted = FALSE
            WHERE c.id = $1
            "#
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Replace the body. Returns `None` when the row is missing, deleted, or
    /// owned by someone else.
    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET body = $3, updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND is_deleted = FALSE
            RETURNING id, post_id, author_id, parent_comment_id, body, likes_count,
                      is_deleted, created_at, updated_at
            "#,
        )
        .bind(comment_id)
        .bind(author_id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
    }

    /// Soft delete and decrement the post's comment counter together.
    /// Replies stay visible. Returns the owning post id when a row changed.
    pub async fn soft_delete_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let post_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE comments
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND is_deleted = FALSE
            RETURNING post_id
            "#,
        )
        .bind(comment_id)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(post_id) = post_id {
            sqlx::query(
                "UPDATE posts SET comments_count = GREATEST(comments_count - 1, 0), \
                 updated_at = NOW() WHERE id = $1",
            )
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(post_id)
    }

    /// Paginated top-level comments for a post.
    pub async fn comments_by_post(
        &self,
        post_id: Uuid,
        limit: i64,
        offset: i64,
        sort_by: CommentSortKey,
        order: SortOrder,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            WHERE c.post_id = $1 AND c.parent_comment_id IS NULL AND c.is_deleted = FALSE
            ORDER BY c.{} {}, c.id ASC
            LIMIT $2 OFFSET $3
            "#,
            sort_by.column(),
            order.as_sql()
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_by_post(&self, post_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments \
             WHERE post_id = $1 AND parent_comment_id IS NULL AND is_deleted = FALSE",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Paginated replies under a top-level comment.
    pub async fn replies(
        &self,
        parent_comment_id: Uuid,
        limit: i64,
        offset: i64,
        sort_by: CommentSortKey,
        order: SortOrder,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            WHERE c.parent_comment_id = $1 AND c.is_deleted = FALSE
            ORDER BY c.{} {}, c.id ASC
            LIMIT $2 OFFSET $3
            "#,
            sort_by.column(),
            order.as_sql()
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(parent_comment_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_replies(&self, parent_comment_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments \
             WHERE parent_comment_id = $1 AND is_deleted = FALSE",
        )
        .bind(parent_comment_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Atomic like-counter adjustment, floored at zero in SQL. `None` when
    /// the comment is missing, deleted, or its post is gone.
    pub async fn adjust_likes(
        &self,
        comment_id: Uuid,
        delta: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE comments
            SET likes_count = GREATEST(likes_count + $2, 0), updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
              AND EXISTS (SELECT 1 FROM posts WHERE id = comments.post_id AND is_deleted = FALSE)
            RETURNING likes_count
            "#,
        )
        .bind(comment_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
    }
}

async fn ensure_author_exists(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id, username) VALUES ($1, $1::text) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
