use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type UserResult<T> = Result<T, UserError>;

/// Failures reported by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Unavailable(e.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("User not found")]
    NotFound,

    #[error("Invalid user id")]
    InvalidIdentifier(String),

    /// The message is what clients see; `source` is only logged.
    #[error("{context}")]
    StoreUnavailable {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl UserError {
    /// Wraps a store failure, keeping duplicate-email as its own variant.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> UserError {
        move |e| match e {
            StoreError::DuplicateEmail => UserError::DuplicateEmail,
            StoreError::Unavailable(source) => UserError::StoreUnavailable { context, source },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UserError::Validation(_)
            | UserError::DuplicateEmail
            | UserError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            UserError::NotFound => StatusCode::NOT_FOUND,
            UserError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match &self {
            UserError::StoreUnavailable { context, source } => {
                error!(error = %format!("{source:#}"), "{context}");
            }
            UserError::InvalidIdentifier(token) => warn!(id = %token, "malformed user id"),
            _ => {}
        }
        let status = self.status_code();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
