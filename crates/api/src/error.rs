use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{PlayError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Business-rule violation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payload failed the syntactic schema.
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PlayError> for ApiError {
    fn from(err: PlayError) -> Self {
        match err {
            PlayError::NotFound(msg) => ApiError::NotFound(msg),
            PlayError::Validate(msg) | PlayError::Match(msg) => ApiError::Validation(msg),
            PlayError::MatchNotPlayable(msg) => ApiError::Validation(msg),
            PlayError::Store(StoreError::Frozen(uid)) => {
                ApiError::Validation(format!("Match {} can no longer be modified", uid))
            }
            // Only `start` can surface this: the match has nothing left to show.
            PlayError::GameOver => ApiError::Validation("No questions to play".into()),
            // The play service turns these into 200 responses.
            other @ (PlayError::MatchOver | PlayError::HuntOver) => {
                ApiError::Internal(format!("Unhandled play signal: {}", other))
            }
            PlayError::Store(other) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::from(PlayError::from(StoreError::from(err)))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();

        messages.sort();

        let message = if messages.len() == 1 {
            messages.remove(0)
        } else {
            format!("{} validation errors: {}", messages.len(), messages.join("; "))
        };

        ApiError::Unprocessable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::error::{DUPLICATE_REACTIONS, EXPIRED_MATCH};
    use validator::Validate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unprocessable("x".into()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::ServiceUnavailable("x".into())
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_body_carries_detail() {
        let response = ApiError::Validation(DUPLICATE_REACTIONS.into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["detail"], DUPLICATE_REACTIONS);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = ApiError::Internal("connection refused".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["detail"], "An internal error occurred");
    }

    #[test]
    fn test_from_play_error() {
        assert!(matches!(
            ApiError::from(PlayError::not_found("Match")),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(PlayError::Match(EXPIRED_MATCH.into())),
            ApiError::Validation(msg) if msg == EXPIRED_MATCH
        ));
        assert!(matches!(
            ApiError::from(PlayError::MatchNotPlayable("no attempts".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(PlayError::GameOver),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(PlayError::MatchOver),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_from_unique_violation_store_error() {
        let err = ApiError::from(PlayError::from(StoreError::UniqueViolation(
            "reactions_unique".into(),
        )));
        assert!(matches!(err, ApiError::Validation(msg) if msg == DUPLICATE_REACTIONS));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_from_validation_errors() {
        let request = domain::models::play::CodeRequest {
            match_code: "12a4".into(),
        };
        let err = ApiError::from(request.validate().unwrap_err());
        assert!(matches!(err, ApiError::Unprocessable(_)));
    }
}
