use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::domain::query::CounterField;
use crate::error::{comment_not_found, post_not_found, ServiceError, ServiceResult};
use crate::repository::{CommentRepository, PostRepository};

/// Engagement counter service. Every adjustment is a single SQL statement
/// with the floor applied store-side, so concurrent callers never lose
/// updates and a decrement on a zero counter is a safe no-op.
///
/// There is no per-user like ledger: repeated likes from one caller keep
/// incrementing.
#[derive(Clone)]
pub struct CounterService {
    posts: PostRepository,
    comments: CommentRepository,
}

impl CounterService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            posts: PostRepository::new(pool.clone()),
            comments: CommentRepository::new(pool),
        }
    }

    /// Apply `delta` to one of the post's engagement counters.
    /// Returns the new value.
    pub async fn adjust_post(
        &self,
        post_id: Uuid,
        field: CounterField,
        delta: i64,
    ) -> ServiceResult<i64> {
        validate_delta(delta)?;

        match self.posts.adjust_counter(post_id, field, delta).await? {
            Some(value) => {
                debug!(post_id = %post_id, field = field.column(), delta, value, "Post counter adjusted");
                Ok(value)
            }
            None => Err(post_not_found(post_id)),
        }
    }

    /// Apply `delta` to a comment's like counter. Returns the new value.
    pub async fn adjust_comment_likes(&self, comment_id: Uuid, delta: i64) -> ServiceResult<i64> {
        validate_delta(delta)?;

        match self.comments.adjust_likes(comment_id, delta).await? {
            Some(value) => {
                debug!(comment_id = %comment_id, delta, value, "Comment like counter adjusted");
                Ok(value)
            }
            None => Err(comment_not_found(comment_id)),
        }
    }
}

fn validate_delta(delta: i64) -> ServiceResult<()> {
    if delta == 1 || delta == -1 {
        Ok(())
    } else {
        Err(ServiceError::InvalidArgument(format!(
            "counter delta must be +1 or -1, got {}",
            delta
        )))
    }
}
