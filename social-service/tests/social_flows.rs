//! End-to-end flows against a real PostgreSQL instance.
//!
//! Set TEST_DATABASE_URL to run; without it every test skips.

use sqlx::PgPool;
use uuid::Uuid;

use social_service::db::MIGRATOR;
use social_service::domain::models::{PostDraft, PostType, Visibility};
use social_service::domain::query::{CounterField, PageOptions, TopCriteria};
use social_service::error::ServiceError;
use social_service::services::{CommentService, FeedService, FollowService, PostService};

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    MIGRATOR.run(&pool).await.expect("apply migrations");
    Some(pool)
}

async fn new_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    FollowService::new(pool.clone())
        .sync_user(id, "tester")
        .await
        .expect("sync user");
    id
}

fn public_post(content: &str) -> PostDraft {
    PostDraft {
        post_type: PostType::General,
        content: content.to_string(),
        recipe_title: None,
        ingredients: None,
        food_name: None,
        tags: vec![],
        visibility: Visibility::Public,
        rating: None,
        difficulty: None,
    }
}

#[tokio::test]
async fn follow_is_symmetric_idempotent_and_counted() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let follows = FollowService::new(pool.clone());
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;

    assert!(follows.follow(a, b).await.unwrap());

    let following = follows.following(a, 1, 10).await.unwrap();
    assert!(following.data.contains(&b));
    let followers = follows.followers(b, 1, 10).await.unwrap();
    assert!(followers.data.contains(&a));

    let a_row = follows.get_user(a).await.unwrap();
    let b_row = follows.get_user(b).await.unwrap();
    assert_eq!(a_row.following_count, 1);
    assert_eq!(b_row.followers_count, 1);

    // second follow is a no-op and must not double-count
    assert!(!follows.follow(a, b).await.unwrap());
    assert_eq!(follows.get_user(a).await.unwrap().following_count, 1);
    assert_eq!(follows.get_user(b).await.unwrap().followers_count, 1);

    assert!(follows.unfollow(a, b).await.unwrap());
    assert!(!follows.unfollow(a, b).await.unwrap());
    assert_eq!(follows.get_user(a).await.unwrap().following_count, 0);
    assert_eq!(follows.get_user(b).await.unwrap().followers_count, 0);
    assert!(!follows.is_following(a, b).await.unwrap());
}

#[tokio::test]
async fn self_follow_is_an_invalid_operation() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let follows = FollowService::new(pool.clone());
    let a = new_user(&pool).await;

    let err = follows.follow(a, a).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn unlike_on_zero_counter_is_clamped() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let author = new_user(&pool).await;
    let post = posts
        .create_post(author, public_post("fresh spring rolls"))
        .await
        .unwrap();

    for _ in 0..3 {
        let value = posts
            .update_engagement(post.id, CounterField::Likes, -1)
            .await
            .unwrap();
        assert_eq!(value, 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_likes_are_all_reflected() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let author = new_user(&pool).await;
    let post = posts
        .create_post(author, public_post("lemongrass chicken"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = posts.clone();
        let post_id = post.id;
        handles.push(tokio::spawn(async move {
            service
                .update_engagement(post_id, CounterField::Likes, 1)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let refreshed = posts.get_post(post.id, Some(author)).await.unwrap();
    assert_eq!(refreshed.likes_count, 10);
}

#[tokio::test]
async fn feed_pages_have_no_overlap_and_no_gap() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let follows = FollowService::new(pool.clone());
    let feed = FeedService::new(pool.clone());

    let reader = new_user(&pool).await;
    let writer = new_user(&pool).await;
    follows.follow(reader, writer).await.unwrap();

    let mut created = Vec::new();
    for i in 0..8 {
        let post = posts
            .create_post(reader, public_post(&format!("own post {}", i)))
            .await
            .unwrap();
        created.push(post.id);
    }
    for i in 0..7 {
        let post = posts
            .create_post(writer, public_post(&format!("followed post {}", i)))
            .await
            .unwrap();
        created.push(post.id);
    }

    let first = feed
        .get_feed(
            reader,
            PageOptions {
                page: 1,
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = feed
        .get_feed(
            reader,
            PageOptions {
                page: 2,
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(first.data.len(), 10);
    assert_eq!(second.data.len(), 5);
    assert_eq!(first.total_count, 15);
    assert_eq!(first.total_pages, 2);

    let mut seen: Vec<Uuid> = first.data.iter().chain(second.data.iter()).map(|p| p.id).collect();
    assert_eq!(seen.len(), 15);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 15, "pages must not overlap");
    for id in &created {
        assert!(seen.contains(id), "pages must not skip items");
    }

    // newest first across the page boundary
    let ordered: Vec<_> = first.data.iter().chain(second.data.iter()).collect();
    for pair in ordered.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    // a page past the end is empty, not an error
    let third = feed
        .get_feed(
            reader,
            PageOptions {
                page: 3,
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(third.data.is_empty());
}

#[tokio::test]
async fn feed_without_follows_still_shows_own_posts() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let feed = FeedService::new(pool.clone());

    let loner = new_user(&pool).await;
    let post = posts
        .create_post(loner, public_post("cooking for one"))
        .await
        .unwrap();

    let page = feed.get_feed(loner, PageOptions::default()).await.unwrap();
    assert!(page.data.iter().any(|p| p.id == post.id));
}

#[tokio::test]
async fn visibility_governs_query_results() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let follows = FollowService::new(pool.clone());

    let author = new_user(&pool).await;
    let follower = new_user(&pool).await;
    let stranger = new_user(&pool).await;
    follows.follow(follower, author).await.unwrap();

    let mut draft = public_post("open kitchen");
    let public = posts.create_post(author, draft.clone()).await.unwrap();
    draft.visibility = Visibility::Followers;
    let followers_only = posts.create_post(author, draft.clone()).await.unwrap();
    draft.visibility = Visibility::Private;
    let private = posts.create_post(author, draft).await.unwrap();

    async fn visible_ids(posts: &PostService, author: Uuid, viewer: Option<Uuid>) -> Vec<Uuid> {
        posts
            .get_user_posts(author, viewer, PageOptions::default())
            .await
            .unwrap()
            .data
            .iter()
            .map(|p| p.id)
            .collect()
    }

    let anonymous = visible_ids(&posts, author, None).await;
    assert!(anonymous.contains(&public.id));
    assert!(!anonymous.contains(&followers_only.id));
    assert!(!anonymous.contains(&private.id));

    let stranger_view = visible_ids(&posts, author, Some(stranger)).await;
    assert!(stranger_view.contains(&public.id));
    assert!(!stranger_view.contains(&followers_only.id));
    assert!(!stranger_view.contains(&private.id));

    let follower_view = visible_ids(&posts, author, Some(follower)).await;
    assert!(follower_view.contains(&public.id));
    assert!(follower_view.contains(&followers_only.id));
    assert!(!follower_view.contains(&private.id));

    let own_view = visible_ids(&posts, author, Some(author)).await;
    assert!(own_view.contains(&public.id));
    assert!(own_view.contains(&followers_only.id));
    assert!(own_view.contains(&private.id));

    // single-post reads apply the same rule, hiding as NotFound
    assert!(posts.get_post(followers_only.id, Some(follower)).await.is_ok());
    assert!(matches!(
        posts.get_post(followers_only.id, Some(stranger)).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        posts.get_post(private.id, None).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn comment_thread_lifecycle() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let comments = CommentService::new(pool.clone());

    let author = new_user(&pool).await;
    let commenter = new_user(&pool).await;
    let post = posts
        .create_post(author, public_post("claypot rice"))
        .await
        .unwrap();
    let other_post = posts
        .create_post(author, public_post("beef noodle soup"))
        .await
        .unwrap();

    let top = comments
        .create_comment(post.id, commenter, "looks amazing", None)
        .await
        .unwrap();
    assert_eq!(top.parent_comment_id, None);

    let reply = comments
        .create_comment(post.id, author, "thank you!", Some(top.id))
        .await
        .unwrap();
    assert_eq!(reply.parent_comment_id, Some(top.id));

    // a reply to a reply is flattened onto the thread root
    let nested = comments
        .create_comment(post.id, commenter, "seconding this", Some(reply.id))
        .await
        .unwrap();
    assert_eq!(nested.parent_comment_id, Some(top.id));

    // a parent from another post is an invalid reference
    let err = comments
        .create_comment(other_post.id, commenter, "wrong thread", Some(top.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));

    // a missing post is NotFound
    let err = comments
        .create_comment(Uuid::new_v4(), commenter, "ghost post", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // three comments landed on the post
    let refreshed = posts.get_post(post.id, None).await.unwrap();
    assert_eq!(refreshed.comments_count, 3);

    // top-level listing excludes replies; replies listing is exact
    let top_level = comments
        .get_by_post(post.id, PageOptions::default())
        .await
        .unwrap();
    assert_eq!(top_level.data.iter().map(|c| c.id).collect::<Vec<_>>(), vec![top.id]);

    let thread = comments
        .get_replies(top.id, PageOptions::default())
        .await
        .unwrap();
    let thread_ids: Vec<Uuid> = thread.data.iter().map(|c| c.id).collect();
    assert_eq!(thread_ids, vec![reply.id, nested.id]);

    // only the author may edit or delete
    let err = comments
        .update_comment(top.id, author, "hijacked")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = comments.delete_comment(top.id, author).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // soft delete hides the comment but not its replies
    comments.delete_comment(top.id, commenter).await.unwrap();
    assert!(matches!(
        comments.get_comment(top.id).await,
        Err(ServiceError::NotFound(_))
    ));
    let top_level = comments
        .get_by_post(post.id, PageOptions::default())
        .await
        .unwrap();
    assert!(top_level.data.is_empty());
    let thread = comments
        .get_replies(top.id, PageOptions::default())
        .await
        .unwrap();
    assert_eq!(thread.data.len(), 2);
    let refreshed = posts.get_post(post.id, None).await.unwrap();
    assert_eq!(refreshed.comments_count, 2);

    // deleting the post takes the whole tree with it
    posts.delete_post(post.id, author).await.unwrap();
    assert!(matches!(
        posts.get_post(post.id, Some(author)).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        comments.get_by_post(post.id, PageOptions::default()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        comments.get_replies(top.id, PageOptions::default()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        comments.get_comment(reply.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        comments.like_comment(reply.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn comment_likes_floor_at_zero() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let comments = CommentService::new(pool.clone());

    let author = new_user(&pool).await;
    let post = posts
        .create_post(author, public_post("grilled eggplant"))
        .await
        .unwrap();
    let comment = comments
        .create_comment(post.id, author, "so smoky", None)
        .await
        .unwrap();

    assert_eq!(comments.unlike_comment(comment.id).await.unwrap(), 0);
    assert_eq!(comments.like_comment(comment.id).await.unwrap(), 1);
    assert_eq!(comments.like_comment(comment.id).await.unwrap(), 2);
    assert_eq!(comments.unlike_comment(comment.id).await.unwrap(), 1);
}

#[tokio::test]
async fn tag_overlap_and_like_unlike_scenario() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let author = new_user(&pool).await;

    let marker = Uuid::new_v4().simple().to_string();
    let vegan = format!("vegan-{}", marker);
    let dinner = format!("dinner-{}", marker);
    let keto = format!("keto-{}", marker);

    let mut draft = public_post("tofu larb");
    draft.tags = vec![vegan.clone(), dinner.clone()];
    let post = posts.create_post(author, draft).await.unwrap();

    let hit = posts
        .get_posts_by_tags(vec![vegan], None, PageOptions::default())
        .await
        .unwrap();
    assert!(hit.data.iter().any(|p| p.id == post.id));

    let miss = posts
        .get_posts_by_tags(vec![keto], None, PageOptions::default())
        .await
        .unwrap();
    assert!(!miss.data.iter().any(|p| p.id == post.id));

    assert_eq!(
        posts
            .update_engagement(post.id, CounterField::Likes, 1)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        posts
            .update_engagement(post.id, CounterField::Likes, 1)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        posts
            .update_engagement(post.id, CounterField::Likes, -1)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        posts.get_post(post.id, None).await.unwrap().likes_count,
        1
    );
}

#[tokio::test]
async fn search_and_rating_queries() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let author = new_user(&pool).await;

    let token = format!("pho{}", Uuid::new_v4().simple());

    let mut review = public_post("rich broth, perfect noodles");
    review.post_type = PostType::FoodReview;
    review.food_name = Some(token.clone());
    review.rating = Some(4.5);
    let high = posts.create_post(author, review).await.unwrap();

    let mut weak_review = public_post("bland and watery");
    weak_review.post_type = PostType::FoodReview;
    weak_review.food_name = Some(token.clone());
    weak_review.rating = Some(2.0);
    let low = posts.create_post(author, weak_review).await.unwrap();

    // case-insensitive match on the food name
    let found = posts
        .search_posts(&token.to_uppercase(), None, PageOptions::default())
        .await
        .unwrap();
    assert!(found.data.iter().any(|p| p.id == high.id));
    assert!(found.data.iter().any(|p| p.id == low.id));

    // rating range with defaulted maximum
    let top_rated = posts
        .get_food_reviews_by_rating(
            4.0,
            None,
            None,
            PageOptions {
                page: 1,
                limit: 100,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(top_rated.data.iter().any(|p| p.id == high.id));
    assert!(!top_rated.data.iter().any(|p| p.id == low.id));
}

#[tokio::test]
async fn post_mutations_are_author_only() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let author = new_user(&pool).await;
    let stranger = new_user(&pool).await;

    let post = posts
        .create_post(author, public_post("test kitchen notes"))
        .await
        .unwrap();

    let patch = social_service::domain::models::PostPatch {
        content: Some("rewritten".to_string()),
        ..Default::default()
    };
    let err = posts.update_post(post.id, stranger, patch).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = posts.delete_post(post.id, stranger).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // rating patches are rejected on non-review posts
    let patch = social_service::domain::models::PostPatch {
        rating: Some(4.0),
        ..Default::default()
    };
    let err = posts.update_post(post.id, author, patch).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn top_posts_rank_by_requested_counter() {
    let Some(pool) = test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let posts = PostService::new(pool.clone());
    let author = new_user(&pool).await;

    let popular = posts
        .create_post(author, public_post("crispy pork belly"))
        .await
        .unwrap();
    let quiet = posts
        .create_post(author, public_post("plain congee"))
        .await
        .unwrap();

    for _ in 0..3 {
        posts
            .update_engagement(popular.id, CounterField::Likes, 1)
            .await
            .unwrap();
    }
    posts
        .update_engagement(quiet.id, CounterField::Likes, 1)
        .await
        .unwrap();

    let ranked = posts
        .get_top_posts(TopCriteria::LikesCount, 100, None)
        .await
        .unwrap();
    let popular_rank = ranked.iter().position(|p| p.id == popular.id);
    let quiet_rank = ranked.iter().position(|p| p.id == quiet.id);
    assert!(popular_rank.is_some());
    assert!(quiet_rank.is_some());
    assert!(popular_rank < quiet_rank);
}
