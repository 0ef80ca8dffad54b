use std::time::Duration;

use common_errors::{AppError, Classified, ErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PostError {
    #[error("Post not found: {post_id}")]
    NotFound { post_id: i64 },
    #[error("Invalid post: {}", describe(.violations))]
    Validation { violations: Vec<FieldViolation> },
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Remote(#[from] AppError),
}

impl PostError {
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(field, message)],
        }
    }
}

impl Classified for PostError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Timeout(_) => ErrorKind::Network,
            Self::Remote(err) => err.kind(),
        }
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<PostError> for AppError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::NotFound { post_id } => {
                AppError::not_found(&format!("Post {post_id} does not exist"))
                    .with_details(serde_json::json!({ "id": post_id }))
            }
            PostError::Validation { violations } => {
                let message = format!("Invalid post: {}", describe(&violations));
                match serde_json::to_value(&violations) {
                    Ok(details) => {
                        AppError::validation_with_details(&message, details)
                    }
                    Err(_) => AppError::validation(&message),
                }
            }
            PostError::Timeout(after) => {
                AppError::network(&format!(
                    "Operation timed out after {after:?}"
                ))
            }
            PostError::Remote(err) => err,
        }
    }
}
