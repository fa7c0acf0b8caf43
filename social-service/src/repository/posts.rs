use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::domain::models::{Post, PostDraft, PostPatch};
use crate::domain::query::{
    CounterField, PageOptions, PostFilters, PostSortKey, TopCriteria, MAX_PAGE_SIZE,
};

const POST_COLUMNS: &str = "id, author_id, post_type, content, recipe_title, ingredients, \
     food_name, tags, visibility, rating, difficulty, likes_count, comments_count, \
     shares_count, is_deleted, created_at, updated_at";

/// Repository for Post rows: lifecycle, filtered queries, counter updates.
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_post(&self, author_id: Uuid, draft: &PostDraft) -> Result<Post, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        ensure_author_exists(&mut tx, author_id).await?;

        let query = format!(
            r#"
            INSERT INTO posts (author_id, post_type, content, recipe_title, ingredients,
                               food_name, tags, visibility, rating, difficulty)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {POST_COLUMNS}
            "#
        );

        let post = sqlx::query_as::<_, Post>(&query)
            .bind(author_id)
            .bind(draft.post_type)
            .bind(&draft.content)
            .bind(&draft.recipe_title)
            .bind(&draft.ingredients)
            .bind(&draft.food_name)
            .bind(&draft.tags)
            .bind(draft.visibility)
            .bind(draft.rating)
            .bind(&draft.difficulty)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(post)
    }

    /// Find a post by id, excluding soft-deleted rows.
    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND is_deleted = FALSE");

        sqlx::query_as::<_, Post>(&query)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Apply an author edit; `None` fields keep their stored value.
    /// Returns `None` when the row is missing, deleted, or owned by someone else.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        patch: &PostPatch,
    ) -> Result<Option<Post>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE posts SET
                content = COALESCE($3, content),
                recipe_title = COALESCE($4, recipe_title),
                ingredients = COALESCE($5, ingredients),
                food_name = COALESCE($6, food_name),
                tags = COALESCE($7, tags),
                visibility = COALESCE($8, visibility),
                rating = COALESCE($9, rating),
                difficulty = COALESCE($10, difficulty),
                updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND is_deleted = FALSE
            RETURNING {POST_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(post_id)
            .bind(author_id)
            .bind(&patch.content)
            .bind(&patch.recipe_title)
            .bind(&patch.ingredients)
            .bind(&patch.food_name)
            .bind(&patch.tags)
            .bind(patch.visibility)
            .bind(patch.rating)
            .bind(&patch.difficulty)
            .fetch_optional(&self.pool)
            .await
    }

    /// Soft delete; the comment tree becomes unreachable because all comment
    /// reads check post liveness.
    pub async fn soft_delete_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE posts
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND is_deleted = FALSE
            RETURNING id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Filtered, visibility-aware page of posts plus the total match count.
    pub async fn query_posts(
        &self,
        filters: &PostFilters,
        options: &PageOptions<PostSortKey>,
    ) -> Result<(Vec<Post>, i64), sqlx::Error> {
        let (_, limit, offset) = options.normalized();

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts WHERE is_deleted = FALSE");
        push_filters(&mut count_query, filters);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE is_deleted = FALSE"
        ));
        push_filters(&mut query, filters);
        query.push(format!(
            " ORDER BY {} {}, id ASC",
            options.sort_by.column(),
            options.order.as_sql()
        ));
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let posts = query.build_query_as::<Post>().fetch_all(&self.pool).await?;

        Ok((posts, total))
    }

    /// Top-N posts by an engagement counter, visibility respected.
    pub async fn top_posts(
        &self,
        criteria: TopCriteria,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE is_deleted = FALSE"
        ));
        push_visibility(&mut query, viewer);
        query.push(format!(
            " ORDER BY {} DESC, created_at DESC, id ASC",
            criteria.column()
        ));
        query.push(" LIMIT ");
        query.push_bind(limit.clamp(1, MAX_PAGE_SIZE));

        query.build_query_as::<Post>().fetch_all(&self.pool).await
    }

    /// Atomic counter adjustment, floored at zero in SQL. Returns the new
    /// value, or `None` when the post is missing or deleted.
    pub async fn adjust_counter(
        &self,
        post_id: Uuid,
        field: CounterField,
        delta: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let column = field.column();
        let query = format!(
            "UPDATE posts SET {column} = GREATEST({column} + $2, 0), updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {column}"
        );

        sqlx::query_scalar(&query)
            .bind(post_id)
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

/// Append WHERE clauses for every present filter. The builder arrives with
/// an open WHERE chain (`... WHERE is_deleted = FALSE`).
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &PostFilters) {
    if let Some(post_type) = filters.post_type {
        query.push(" AND post_type = ");
        query.push_bind(post_type);
    }
    if let Some(authors) = &filters.authors {
        query.push(" AND author_id = ANY(");
        query.push_bind(authors.clone());
        query.push(")");
    }
    if let Some(visibility) = filters.visibility {
        query.push(" AND visibility = ");
        query.push_bind(visibility);
    }
    if let Some(tags) = &filters.tags {
        // overlap, not containment: any shared tag matches
        query.push(" AND tags && ");
        query.push_bind(tags.clone());
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (content ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR recipe_title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR food_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR array_to_string(ingredients, ' ') ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(min_rating) = filters.min_rating {
        query.push(" AND rating >= ");
        query.push_bind(min_rating);
    }
    if let Some(max_rating) = filters.max_rating {
        query.push(" AND rating <= ");
        query.push_bind(max_rating);
    }
    if let Some(difficulty) = &filters.difficulty {
        query.push(" AND difficulty = ");
        query.push_bind(difficulty.clone());
    }
    push_visibility(query, filters.viewer);
}

/// Visibility predicate: public, own, or followers-only with an edge from
/// the viewer to the author.
fn push_visibility(query: &mut QueryBuilder<'_, Postgres>, viewer: Option<Uuid>) {
    match viewer {
        None => {
            query.push(" AND visibility = 'public'");
        }
        Some(viewer_id) => {
            query.push(" AND (visibility = 'public' OR author_id = ");
            query.push_bind(viewer_id);
            query.push(
                " OR (visibility = 'followers' AND EXISTS (SELECT 1 FROM follows \
                 WHERE follower_id = ",
            );
            query.push_bind(viewer_id);
            query.push(" AND following_id = posts.author_id)))");
        }
    }
}
