use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::{Page, Post, PostDraft, PostPatch, PostType, Visibility};
use crate::domain::query::{CounterField, PageOptions, PostFilters, PostSortKey, TopCriteria};
use crate::error::{post_not_found, ServiceError, ServiceResult};
use crate::repository::{FollowRepository, PostRepository};

use super::counters::CounterService;

/// Post service: lifecycle plus the filtered/sorted/paginated query surface.
#[derive(Clone)]
pub struct PostService {
    repo: PostRepository,
    follows: FollowRepository,
    counters: CounterService,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: PostRepository::new(pool.clone()),
            follows: FollowRepository::new(pool.clone()),
            counters: CounterService::new(pool),
        }
    }

    pub async fn create_post(&self, author_id: Uuid, draft: PostDraft) -> ServiceResult<Post> {
        validate_draft(&draft)?;

        let post = self.repo.create_post(author_id, &draft).await?;
        info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// Single-post read with the visibility rule applied. Posts the viewer
    /// may not see surface as `NotFound` rather than leaking existence.
    pub async fn get_post(&self, post_id: Uuid, viewer: Option<Uuid>) -> ServiceResult<Post> {
        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        let viewer_follows_author = match (viewer, post.visibility) {
            (Some(viewer_id), Visibility::Followers) if viewer_id != post.author_id => {
                self.follows.is_following(viewer_id, post.author_id).await?
            }
            _ => false,
        };

        if post.visible_to(viewer, viewer_follows_author) {
            Ok(post)
        } else {
            Err(post_not_found(post_id))
        }
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        patch: PostPatch,
    ) -> ServiceResult<Post> {
        let current = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        if current.author_id != author_id {
            return Err(ServiceError::Forbidden(
                "only the author can update a post".to_string(),
            ));
        }

        if let Some(content) = &patch.content {
            if content.trim().is_empty() {
                return Err(ServiceError::InvalidArgument(
                    "post content cannot be empty".to_string(),
                ));
            }
        }
        if let Some(rating) = patch.rating {
            if current.post_type != PostType::FoodReview {
                return Err(ServiceError::InvalidArgument(
                    "rating is only valid for food review posts".to_string(),
                ));
            }
            validate_rating(rating)?;
        }

        let updated = self
            .repo
            .update_post(post_id, author_id, &patch)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        info!(post_id = %post_id, author_id = %author_id, "Post updated");
        Ok(updated)
    }

    pub async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> ServiceResult<()> {
        let current = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        if current.author_id != author_id {
            return Err(ServiceError::Forbidden(
                "only the author can delete a post".to_string(),
            ));
        }

        self.repo.soft_delete_post(post_id, author_id).await?;
        info!(post_id = %post_id, author_id = %author_id, "Post deleted");
        Ok(())
    }

    /// Filtered, visibility-aware page of posts.
    pub async fn get_posts(
        &self,
        filters: PostFilters,
        options: PageOptions<PostSortKey>,
    ) -> ServiceResult<Page<Post>> {
        let filters = filters.normalized();
        let (page, limit, _) = options.normalized();

        let (posts, total) = self.repo.query_posts(&filters, &options).await?;
        Ok(Page::new(posts, total, page, limit))
    }

    /// Posts by one author, as seen by `viewer`.
    pub async fn get_user_posts(
        &self,
        author_id: Uuid,
        viewer: Option<Uuid>,
        options: PageOptions<PostSortKey>,
    ) -> ServiceResult<Page<Post>> {
        self.get_posts(
            PostFilters {
                authors: Some(vec![author_id]),
                viewer,
                ..Default::default()
            },
            options,
        )
        .await
    }

    /// Text search across content, recipe title, ingredients, and food name.
    pub async fn search_posts(
        &self,
        search: &str,
        viewer: Option<Uuid>,
        options: PageOptions<PostSortKey>,
    ) -> ServiceResult<Page<Post>> {
        if search.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "search text is required".to_string(),
            ));
        }

        self.get_posts(
            PostFilters {
                search: Some(search.to_string()),
                viewer,
                ..Default::default()
            },
            options,
        )
        .await
    }

    /// Posts carrying at least one of `tags`.
    pub async fn get_posts_by_tags(
        &self,
        tags: Vec<String>,
        viewer: Option<Uuid>,
        options: PageOptions<PostSortKey>,
    ) -> ServiceResult<Page<Post>> {
        if tags.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "at least one tag is required".to_string(),
            ));
        }

        self.get_posts(
            PostFilters {
                tags: Some(tags),
                viewer,
                ..Default::default()
            },
            options,
        )
        .await
    }

    /// Food reviews within a rating range; `max_rating` defaults to 5.
    pub async fn get_food_reviews_by_rating(
        &self,
        min_rating: f64,
        max_rating: Option<f64>,
        viewer: Option<Uuid>,
        options: PageOptions<PostSortKey>,
    ) -> ServiceResult<Page<Post>> {
        validate_rating(min_rating)?;
        let max_rating = max_rating.unwrap_or(5.0);
        validate_rating(max_rating)?;
        if min_rating > max_rating {
            return Err(ServiceError::InvalidArgument(
                "minRating cannot exceed maxRating".to_string(),
            ));
        }

        self.get_posts(
            PostFilters {
                post_type: Some(PostType::FoodReview),
                min_rating: Some(min_rating),
                max_rating: Some(max_rating),
                viewer,
                ..Default::default()
            },
            options,
        )
        .await
    }

    /// Most-engaged posts by the given counter.
    pub async fn get_top_posts(
        &self,
        criteria: TopCriteria,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> ServiceResult<Vec<Post>> {
        Ok(self.repo.top_posts(criteria, limit, viewer).await?)
    }

    /// Adjust an engagement counter (like/unlike/share paths).
    pub async fn update_engagement(
        &self,
        post_id: Uuid,
        field: CounterField,
        delta: i64,
    ) -> ServiceResult<i64> {
        self.counters.adjust_post(post_id, field, delta).await
    }
}

fn validate_rating(rating: f64) -> ServiceResult<()> {
    if (0.0..=5.0).contains(&rating) {
        Ok(())
    } else {
        Err(ServiceError::InvalidArgument(format!(
            "rating must be between 0 and 5, got {}",
            rating
        )))
    }
}

fn validate_draft(draft: &PostDraft) -> ServiceResult<()> {
    if draft.content.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(
            "post content is required".to_string(),
        ));
    }

    match draft.post_type {
        PostType::FoodReview => {
            if let Some(rating) = draft.rating {
                validate_rating(rating)?;
            }
        }
        PostType::Recipe | PostType::General => {
            if draft.rating.is_some() {
                return Err(ServiceError::InvalidArgument(
                    "rating is only valid for food review posts".to_string(),
                ));
            }
        }
    }

    Ok(())
}
