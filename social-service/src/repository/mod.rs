pub mod comments;
pub mod follows;
pub mod posts;

pub use comments::CommentRepository;
pub use follows::FollowRepository;
pub use posts::PostRepository;
