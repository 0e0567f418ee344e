use thiserror::Error;
use tonic::Status;

/// Stable, transport-independent error kinds for the compliance core.
///
/// Names mirror spec section 7 so that behavior (and log greps) stay
/// stable across the gRPC boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("tenant context is required for this operation")]
    TenantUnbound,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed on {field}: {detail}")]
    Validation { field: String, detail: String },

    #[error("entity is immutable in its current status: {0}")]
    Immutable(String),

    #[error("overlapping active record: {0}")]
    Overlap(String),

    #[error("payment incomplete: verified amount is below premium")]
    PaymentIncomplete,

    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("account locked until {0}")]
    Locked(chrono::DateTime<chrono::Utc>),

    #[error("concurrent modification detected: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(e) => Status::internal(format!("database error: {e}")),
            AppError::TenantUnbound => Status::failed_precondition("tenant context is required"),
            AppError::Forbidden(msg) => Status::permission_denied(msg),
            AppError::NotFound(msg) => Status::not_found(msg),
            AppError::Validation { field, detail } => {
                Status::invalid_argument(format!("{field}: {detail}"))
            }
            AppError::Immutable(msg) => Status::failed_precondition(msg),
            AppError::Overlap(msg) => Status::failed_precondition(msg),
            AppError::PaymentIncomplete => {
                Status::failed_precondition("activation requires full verified payment")
            }
            AppError::InvalidTransition(msg) => Status::failed_precondition(msg),
            AppError::Locked(until) => {
                Status::unauthenticated(format!("account locked until {until}"))
            }
            AppError::Conflict(msg) => Status::aborted(msg),
            AppError::Internal(msg) => Status::internal(msg),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
