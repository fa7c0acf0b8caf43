use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::{Page, Post};
use crate::domain::query::{PageOptions, PostFilters, PostSortKey};
use crate::error::ServiceResult;
use crate::repository::FollowRepository;

use super::posts::PostService;

/// Feed composition: the viewer's own posts merged with posts from everyone
/// they follow, ordered and paginated through the post query engine so
/// consecutive pages never overlap or skip absent concurrent writes.
#[derive(Clone)]
pub struct FeedService {
    follows: FollowRepository,
    posts: PostService,
}

impl FeedService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            follows: FollowRepository::new(pool.clone()),
            posts: PostService::new(pool),
        }
    }

    /// Personalized feed for `user_id`. A user with zero follows still sees
    /// their own posts.
    pub async fn get_feed(
        &self,
        user_id: Uuid,
        options: PageOptions<PostSortKey>,
    ) -> ServiceResult<Page<Post>> {
        let mut authors = self.follows.all_following_ids(user_id).await?;
        authors.push(user_id);

        debug!(user_id = %user_id, author_count = authors.len(), "Composing feed");

        self.posts
            .get_posts(
                PostFilters {
                    authors: Some(authors),
                    viewer: Some(user_id),
                    ..Default::default()
                },
                options,
            )
            .await
    }
}
