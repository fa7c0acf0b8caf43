use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of post. `food_review` posts carry a rating; `recipe` posts carry
/// recipe fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    FoodReview,
    Recipe,
    General,
}

/// Post-level access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_visibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Followers,
}

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_type: PostType,
    pub content: String,
    pub recipe_title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub food_name: Option<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub rating: Option<f64>,
    pub difficulty: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Whether `viewer` may read this post. `viewer_follows_author` is the
    /// outcome of a follow-graph lookup and only matters for
    /// followers-visibility posts.
    pub fn visible_to(&self, viewer: Option<Uuid>, viewer_follows_author: bool) -> bool {
        match self.visibility {
            Visibility::Public => true,
            Visibility::Private => viewer == Some(self.author_id),
            Visibility::Followers => {
                viewer == Some(self.author_id) || (viewer.is_some() && viewer_follows_author)
            }
        }
    }
}

/// Comment entity. Replies reference a top-level comment via
/// `parent_comment_id`; threads are one level deep.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub body: String,
    pub likes_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Local mirror of an identity-service user: activity flag plus the
/// materialised follow-graph counters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub is_active: bool,
    pub following_count: i64,
    pub followers_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDraft {
    pub post_type: PostType,
    pub content: String,
    pub recipe_title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub food_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub rating: Option<f64>,
    pub difficulty: Option<String>,
}

/// Author-editable fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub content: Option<String>,
    pub recipe_title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub food_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub rating: Option<f64>,
    pub difficulty: Option<String>,
}

/// One page of results plus paging metadata, the uniform success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total_count: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };
        Self {
            data,
            total_count,
            page,
            limit,
            total_pages,
        }
    }
}
