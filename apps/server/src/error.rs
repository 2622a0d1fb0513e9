use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cowchips_core::errors::{DatabaseError, Error as CoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    Unauthorized(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                CoreError::AlreadyFinalized(_)
                | CoreError::GameNotActive(_)
                | CoreError::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
                CoreError::NotFound(_) | CoreError::Database(DatabaseError::NotFound(_)) => {
                    StatusCode::NOT_FOUND
                }
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
                CoreError::Database(_)
                | CoreError::InvalidConfigValue(_)
                | CoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cowchips_core::errors::ValidationError;

    #[test]
    fn test_core_errors_map_to_statuses() {
        let cases = [
            (
                CoreError::AlreadyFinalized("g1".to_string()),
                StatusCode::CONFLICT,
            ),
            (CoreError::NotFound("Game g1".to_string()), StatusCode::NOT_FOUND),
            (
                ValidationError::MissingField("name".to_string()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Payment("declined".to_string()),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                DatabaseError::QueryFailed("locked".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
