use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Pagination query parameters with sane defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Parse a `true`/`false` path segment, rejecting anything else at the
/// boundary.
pub fn parse_bool_flag(raw: &str) -> Result<bool, ServiceError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ServiceError::ValidationError(format!(
            "invalid boolean flag '{other}', expected 'true' or 'false'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bool_flag_parsing() {
        assert!(parse_bool_flag("true").unwrap());
        assert!(!parse_bool_flag("false").unwrap());
        assert_matches!(
            parse_bool_flag("TRUE"),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(parse_bool_flag("1"), Err(ServiceError::ValidationError(_)));
    }
}
