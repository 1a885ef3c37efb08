use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use giftgrab_core::Rejection;

use crate::message::ErrorView;
use crate::session::SessionError;

/// Boundary-level request failures plus reducer rejections surfaced over
/// HTTP. Rejections keep their taxonomy code on the wire.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("game not found")]
    SessionNotFound,
    #[error("invalid admin password")]
    BadAdminPassword,
    #[error("host token required")]
    MissingHostToken,
    #[error("invalid host token")]
    BadHostToken,
    #[error("{0}")]
    BadRequest(String),
    #[error("session closed")]
    SessionClosed,
    #[error("internal error")]
    Internal,
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::BadAdminPassword | ApiError::MissingHostToken | ApiError::BadHostToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionClosed => StatusCode::GONE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected(rejection) => match rejection {
                Rejection::UnknownGift | Rejection::UnknownPlayer => StatusCode::NOT_FOUND,
                Rejection::MissingGifts | Rejection::NoPlayers | Rejection::InvalidName => {
                    StatusCode::BAD_REQUEST
                }
                Rejection::NotHost => StatusCode::UNAUTHORIZED,
                Rejection::NotActivePlayer => StatusCode::FORBIDDEN,
                _ => StatusCode::CONFLICT,
            },
        }
    }

    fn reason(&self) -> &str {
        match self {
            ApiError::Rejected(rejection) => rejection.code(),
            ApiError::SessionNotFound => "unknown_session",
            ApiError::BadAdminPassword => "bad_admin_password",
            ApiError::MissingHostToken | ApiError::BadHostToken => "bad_host_token",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::SessionClosed => "session_closed",
            ApiError::Internal => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorView::new(self.reason(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Closed => ApiError::SessionClosed,
            SessionError::Rejected(rejection) => ApiError::Rejected(rejection),
        }
    }
}
