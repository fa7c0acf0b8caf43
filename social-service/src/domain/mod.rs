pub mod models;
pub mod query;

pub use models::{Comment, Page, Post, PostDraft, PostPatch, PostType, UserAccount, Visibility};
pub use query::{
    CommentSortKey, CounterField, PageOptions, PostFilters, PostSortKey, SortOrder, TopCriteria,
};
