use thiserror::Error;

use crate::client::ApiError;
use crate::workflow::TransitionError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Workflow(#[from] TransitionError),

    #[error("job card not found: {0}")]
    NotFound(String),

    #[error("invalid job card: {0}")]
    Invalid(String),
}

impl ServiceError {
    /// Map a backend 404 for `id` onto [`ServiceError::NotFound`]
    pub(crate) fn from_api(id: &str, err: ApiError) -> Self {
        if err.is_not_found() {
            ServiceError::NotFound(id.to_string())
        } else {
            ServiceError::Api(err)
        }
    }
}
