//! # Admin Errors
//!
//! The error taxonomy every admin action reports in.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::resource::ResourceError;
use crate::store::StoreError;
use crate::validation::{FormError, ValidationErrors};

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

/// Admin action errors
#[derive(Debug, Clone, Error)]
pub enum AdminError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Field-level input errors, raised before persistence
    #[error("The given data was invalid.")]
    Validation(#[from] ValidationErrors),

    /// Caller lacks the named permission; nothing was changed
    #[error("This action is unauthorized.")]
    Authorization { permission: String },

    /// No visible record with this key
    #[error("No {resource} found for id {id}")]
    NotFound { resource: String, id: String },

    /// No resource registered under this name
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// The store failed; any bulk transaction was rolled back
    #[error("Persistence failed: {0}")]
    Persistence(StoreError),

    /// Inconsistent resource catalog
    #[error("Resource configuration error: {0}")]
    Configuration(ResourceError),

    /// The view layer could not render a page
    #[error("Render failed: {0}")]
    Render(String),
}

impl AdminError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        AdminError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AdminError::Authorization { .. } => StatusCode::FORBIDDEN,
            AdminError::NotFound { .. } | AdminError::UnknownResource(_) => StatusCode::NOT_FOUND,
            AdminError::Persistence(_) | AdminError::Configuration(_) | AdminError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, id } => AdminError::not_found(&resource, id),
            other => AdminError::Persistence(other),
        }
    }
}

impl From<FormError> for AdminError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Invalid(errors) => AdminError::Validation(errors),
            FormError::Lookup(err) => err.into(),
        }
    }
}

impl From<ResourceError> for AdminError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::UnknownResource(name) => AdminError::UnknownResource(name),
            other => AdminError::Configuration(other),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl From<AdminError> for ErrorResponse {
    fn from(err: AdminError) -> Self {
        let message = err.to_string();
        match err {
            AdminError::Validation(errors) => Self {
                message,
                errors: Some(errors),
            },
            _ => Self {
                message,
                errors: None,
            },
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "admin request failed");
        }
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}
