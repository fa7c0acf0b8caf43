use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::{Page, UserAccount};
use crate::domain::query::MAX_PAGE_SIZE;
use crate::error::{user_not_found, ServiceError, ServiceResult};
use crate::repository::FollowRepository;

/// Follow-graph service. Edges and the per-user counters always move
/// together; follow/unfollow are idempotent and report whether state
/// actually changed.
#[derive(Clone)]
pub struct FollowService {
    repo: FollowRepository,
}

impl FollowService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: FollowRepository::new(pool),
        }
    }

    /// Create the edge follower -> following. Following an already-followed
    /// user is a no-op success. Returns true when a new edge was created.
    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> ServiceResult<bool> {
        if follower_id == following_id {
            return Err(ServiceError::InvalidOperation(
                "users cannot follow themselves".to_string(),
            ));
        }

        let created = self.repo.create_follow(follower_id, following_id).await?;
        if created {
            info!(follower_id = %follower_id, following_id = %following_id, "Follow created");
        }
        Ok(created)
    }

    /// Remove the edge follower -> following. Unfollowing a non-followed
    /// user is a no-op success. Returns true when an edge was removed.
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> ServiceResult<bool> {
        let removed = self.repo.delete_follow(follower_id, following_id).await?;
        if removed {
            info!(follower_id = %follower_id, following_id = %following_id, "Follow removed");
        }
        Ok(removed)
    }

    pub async fn is_following(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> ServiceResult<bool> {
        Ok(self.repo.is_following(follower_id, following_id).await?)
    }

    /// Page of ids this user follows.
    pub async fn following(&self, user_id: Uuid, page: i64, limit: i64) -> ServiceResult<Page<Uuid>> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let (ids, total) = self
            .repo
            .following_ids(user_id, limit, (page - 1) * limit)
            .await?;
        Ok(Page::new(ids, total, page, limit))
    }

    /// Page of ids following this user.
    pub async fn followers(&self, user_id: Uuid, page: i64, limit: i64) -> ServiceResult<Page<Uuid>> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let (ids, total) = self
            .repo
            .follower_ids(user_id, limit, (page - 1) * limit)
            .await?;
        Ok(Page::new(ids, total, page, limit))
    }

    /// Complete following set (feed author-set resolution).
    pub async fn following_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        Ok(self.repo.all_following_ids(user_id).await?)
    }

    /// User mirror row with the materialised graph counters.
    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<UserAccount> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Mirror an identity-service user into the local table.
    pub async fn sync_user(&self, user_id: Uuid, username: &str) -> ServiceResult<()> {
        Ok(self.repo.upsert_user(user_id, username).await?)
    }

    /// Deactivate an account; the follow graph is left intact.
    pub async fn deactivate_user(&self, user_id: Uuid) -> ServiceResult<()> {
        match self.repo.deactivate_user(user_id).await? {
            Some(_) => {
                info!(user_id = %user_id, "User deactivated");
                Ok(())
            }
            None => Err(user_not_found(user_id)),
        }
    }
}
