use uuid::Uuid;

use super::models::{PostType, Visibility};

/// Hard cap on page size; requests above it are clamped, not rejected.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page size applied when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Whitelisted sort keys for post queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    LikesCount,
    CommentsCount,
    Rating,
}

impl PostSortKey {
    pub fn column(self) -> &'static str {
        match self {
            PostSortKey::CreatedAt => "created_at",
            PostSortKey::UpdatedAt => "updated_at",
            PostSortKey::LikesCount => "likes_count",
            PostSortKey::CommentsCount => "comments_count",
            PostSortKey::Rating => "rating",
        }
    }

    /// Unrecognised keys fall back to `created_at`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "updated_at" | "updatedat" => PostSortKey::UpdatedAt,
            "likes_count" => PostSortKey::LikesCount,
            "comments_count" => PostSortKey::CommentsCount,
            "rating" => PostSortKey::Rating,
            _ => PostSortKey::CreatedAt,
        }
    }
}

/// Whitelisted sort keys for comment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSortKey {
    #[default]
    CreatedAt,
    LikesCount,
}

impl CommentSortKey {
    pub fn column(self) -> &'static str {
        match self {
            CommentSortKey::CreatedAt => "created_at",
            CommentSortKey::LikesCount => "likes_count",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "likes_count" => CommentSortKey::LikesCount,
            _ => CommentSortKey::CreatedAt,
        }
    }
}

/// Ranking criteria for top-post queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopCriteria {
    LikesCount,
    CommentsCount,
    SharesCount,
}

impl TopCriteria {
    pub fn column(self) -> &'static str {
        match self {
            TopCriteria::LikesCount => "likes_count",
            TopCriteria::CommentsCount => "comments_count",
            TopCriteria::SharesCount => "shares_count",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "comments_count" => TopCriteria::CommentsCount,
            "shares_count" => TopCriteria::SharesCount,
            _ => TopCriteria::LikesCount,
        }
    }
}

/// Engagement counter columns on posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    Likes,
    Comments,
    Shares,
}

impl CounterField {
    pub fn column(self) -> &'static str {
        match self {
            CounterField::Likes => "likes_count",
            CounterField::Comments => "comments_count",
            CounterField::Shares => "shares_count",
        }
    }
}

/// Pagination and ordering for a listing query.
#[derive(Debug, Clone)]
pub struct PageOptions<S> {
    pub page: i64,
    pub limit: i64,
    pub sort_by: S,
    pub order: SortOrder,
}

impl Default for PageOptions<PostSortKey> {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: PostSortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl Default for PageOptions<CommentSortKey> {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: CommentSortKey::CreatedAt,
            order: SortOrder::Asc,
        }
    }
}

impl<S: Copy> PageOptions<S> {
    /// Clamp to sane bounds and derive the row offset.
    /// Returns (page, limit, offset).
    pub fn normalized(&self) -> (i64, i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        (page, limit, (page - 1) * limit)
    }
}

/// Filter set for post queries. `authors` restricts to an author set (the
/// feed passes the viewer plus everyone they follow; a profile listing
/// passes a single id). `viewer` drives the visibility predicate.
#[derive(Debug, Clone, Default)]
pub struct PostFilters {
    pub post_type: Option<PostType>,
    pub authors: Option<Vec<Uuid>>,
    pub visibility: Option<Visibility>,
    pub tags: Option<Vec<String>>,
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub difficulty: Option<String>,
    pub viewer: Option<Uuid>,
}

impl PostFilters {
    /// Apply defaulting rules: a lone `min_rating` implies `max_rating = 5`.
    pub fn normalized(mut self) -> Self {
        if self.min_rating.is_some() && self.max_rating.is_none() {
            self.max_rating = Some(5.0);
        }
        self
    }
}
