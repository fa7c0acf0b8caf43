/// Error types for the social core.
///
/// The taxonomy lives in the shared `error-types` crate so the gateway can
/// map it to wire responses without depending on this crate.
use uuid::Uuid;

pub use error_types::{ErrorResponse, ServiceError, ServiceResult};

pub(crate) fn post_not_found(post_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("post {} not found", post_id))
}

pub(crate) fn comment_not_found(comment_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("comment {} not found", comment_id))
}

pub(crate) fn user_not_found(user_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("user {} not found", user_id))
}
