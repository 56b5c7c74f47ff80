//! Request extractors whose rejections use the same JSON error body as every
//! other failure.

use axum::extract::{
    rejection::{JsonRejection, PathRejection, QueryRejection},
    FromRequest, FromRequestParts,
};
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "json body rejected");
        match rejection {
            JsonRejection::JsonDataError(e) => {
                let detail = strip_prefix(&e.body_text());
                AppError::validation(&field_of(&detail, "body"), &detail)
            }
            JsonRejection::MissingJsonContentType(_) => {
                AppError::validation("body", "Expected a JSON body")
            }
            other => AppError::validation("body", &strip_prefix(&other.body_text())),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let detail = strip_prefix(&rejection.body_text());
        debug!(error = %detail, "query string rejected");
        AppError::validation(&field_of(&detail, "query"), &detail)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                AppError::validation("id", &strip_prefix(&e.body_text()))
            }
            other => AppError::Internal(anyhow::anyhow!("path extraction: {}", other.body_text())),
        }
    }
}

/// Drops axum's "Failed to deserialize ...:" lead-in and serde's position suffix.
fn strip_prefix(text: &str) -> String {
    let detail = text
        .split_once("target type: ")
        .or_else(|| text.split_once("query string: "))
        .or_else(|| text.split_once("path params: "))
        .map_or(text, |(_, rest)| rest);
    let detail = detail
        .rsplit_once(" at line ")
        .map_or(detail, |(head, _)| head);
    detail.trim().to_string()
}

/// Names the offending field from a serde message, or `fallback` when it doesn't say.
fn field_of(detail: &str, fallback: &str) -> String {
    if let Some(rest) = detail.split_once("missing field `").map(|(_, rest)| rest) {
        if let Some((name, _)) = rest.split_once('`') {
            return name.to_string();
        }
    }
    // serde_path_to_error renders nested failures as `path: message`.
    if let Some((path, _)) = detail.split_once(": ") {
        let is_path = !path.is_empty()
            && path
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
        if is_path {
            return path.to_string();
        }
    }
    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_named() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    missing field `categoryId` at line 1 column 59";
        let detail = strip_prefix(text);
        assert_eq!(detail, "missing field `categoryId`");
        assert_eq!(field_of(&detail, "body"), "categoryId");
    }

    #[test]
    fn nested_path_is_named() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    amount: invalid type: string \"lots\", expected a Decimal at line 1 column 20";
        let detail = strip_prefix(text);
        assert_eq!(field_of(&detail, "body"), "amount");
    }

    #[test]
    fn unattributed_errors_fall_back() {
        let detail = strip_prefix("Failed to deserialize query string: invalid digit found in string");
        assert_eq!(detail, "invalid digit found in string");
        assert_eq!(field_of(&detail, "query"), "query");
    }
}
