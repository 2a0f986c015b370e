use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Field name to first error message, shared by local validation and backend rejections.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
    Unexpected,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::Internal,
            _ => Self::Unexpected,
        }
    }
}

/// A non-success backend response, passed through untouched.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code:?} ({status}): {payload}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: u16,
    pub payload: Value,
}

impl ApiError {
    pub fn new(status: u16, payload: Value) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            payload,
        }
    }

    /// Extracts per-field messages from a validation-shaped body.
    ///
    /// Accepts `{"field": ["msg", ...]}` and `{"field": "msg"}`; `detail` and
    /// `non_field_errors` are not field errors and are skipped.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        if self.code != ErrorCode::Validation {
            return None;
        }
        let Value::Object(map) = &self.payload else {
            return None;
        };

        let mut errors = FieldErrors::new();
        for (field, value) in map {
            if field == "detail" || field == "non_field_errors" {
                continue;
            }
            let message = match value {
                Value::String(message) => Some(message.clone()),
                Value::Array(items) => items.iter().find_map(|item| item.as_str()).map(str::to_owned),
                _ => None,
            };
            if let Some(message) = message {
                errors.insert(field.clone(), message);
            }
        }

        (!errors.is_empty()).then_some(errors)
    }
}
