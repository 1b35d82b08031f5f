//! Input validation for request payloads.

pub mod user;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
