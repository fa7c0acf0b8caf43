use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::models::{Comment, Page};
use crate::domain::query::{CommentSortKey, PageOptions};
use crate::error::{comment_not_found, post_not_found, ServiceError, ServiceResult};
use crate::repository::{CommentRepository, PostRepository};

use super::counters::CounterService;

/// Threaded comment service. Threads are one level deep: a reply to a reply
/// is attached to the thread's top-level comment.
#[derive(Clone)]
pub struct CommentService {
    comments: CommentRepository,
    posts: PostRepository,
    counters: CounterService,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            comments: CommentRepository::new(pool.clone()),
            posts: PostRepository::new(pool.clone()),
            counters: CounterService::new(pool),
        }
    }

    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: &str,
        parent_comment_id: Option<Uuid>,
    ) -> ServiceResult<Comment> {
        if body.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "comment body is required".to_string(),
            ));
        }

        self.posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        let anchor = match parent_comment_id {
            None => None,
            Some(parent_id) => {
                let parent = self.comments.find_comment_any(parent_id).await?.ok_or_else(|| {
                    ServiceError::InvalidReference(format!(
                        "parent comment {} does not exist",
                        parent_id
                    ))
                })?;

                if parent.post_id != post_id {
                    return Err(ServiceError::InvalidReference(format!(
                        "parent comment {} belongs to another post",
                        parent_id
                    )));
                }

                // replies to replies land under the thread's top-level comment
                Some(parent.parent_comment_id.unwrap_or(parent.id))
            }
        };

        let comment = self
            .comments
            .create_comment(post_id, author_id, body, anchor)
            .await?;

        info!(comment_id = %comment.id, post_id = %post_id, author_id = %author_id, "Comment created");
        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: Uuid) -> ServiceResult<Comment> {
        self.comments
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))
    }

    /// Top-level comments of a post, paginated. Default order is oldest
    /// first.
    pub async fn get_by_post(
        &self,
        post_id: Uuid,
        options: PageOptions<CommentSortKey>,
    ) -> ServiceResult<Page<Comment>> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        let (page, limit, offset) = options.normalized();
        let comments = self
            .comments
            .comments_by_post(post_id, limit, offset, options.sort_by, options.order)
            .await?;
        let total = self.comments.count_by_post(post_id).await?;

        Ok(Page::new(comments, total, page, limit))
    }

    /// Replies under a top-level comment, paginated. Replies stay reachable
    /// even after their parent was soft-deleted.
    pub async fn get_replies(
        &self,
        comment_id: Uuid,
        options: PageOptions<CommentSortKey>,
    ) -> ServiceResult<Page<Comment>> {
        self.comments
            .find_comment_any(comment_id)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))?;

        let (page, limit, offset) = options.normalized();
        let replies = self
            .comments
            .replies(comment_id, limit, offset, options.sort_by, options.order)
            .await?;
        let total = self.comments.count_replies(comment_id).await?;

        Ok(Page::new(replies, total, page, limit))
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        if body.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "comment body is required".to_string(),
            ));
        }

        let current = self
            .comments
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))?;

        if current.author_id != author_id {
            return Err(ServiceError::Forbidden(
                "only the author can update a comment".to_string(),
            ));
        }

        let updated = self
            .comments
            .update_comment(comment_id, author_id, body)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))?;

        debug!(comment_id = %comment_id, author_id = %author_id, "Comment updated");
        Ok(updated)
    }

    /// Soft delete. Replies stay independently visible; the owning post's
    /// comment counter is decremented alongside.
    pub async fn delete_comment(&self, comment_id: Uuid, author_id: Uuid) -> ServiceResult<()> {
        let current = self
            .comments
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))?;

        if current.author_id != author_id {
            return Err(ServiceError::Forbidden(
                "only the author can delete a comment".to_string(),
            ));
        }

        self.comments
            .soft_delete_comment(comment_id, author_id)
            .await?;

        info!(comment_id = %comment_id, author_id = %author_id, "Comment deleted");
        Ok(())
    }

    /// Any caller may like a comment; no ownership check.
    pub async fn like_comment(&self, comment_id: Uuid) -> ServiceResult<i64> {
        self.counters.adjust_comment_likes(comment_id, 1).await
    }

    /// Safe to call on an unliked comment; the counter floors at zero.
    pub async fn unlike_comment(&self, comment_id: Uuid) -> ServiceResult<i64> {
        self.counters.adjust_comment_likes(comment_id, -1).await
    }
}
