//! Request extractors whose rejections use the API's error format.
//!
//! A body or query string that does not fit the target type becomes a 400
//! with `{"field": ["message"]}`, keyed by the top-level field serde was
//! reading when it failed.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use serde_path_to_error::Segment;
use std::error::Error as StdError;
use std::fmt::Display;

use crate::validation::FieldErrors;
use crate::web::error::AppError;

/// Errors that belong to no single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                AppError::Validation(field_errors::<serde_json::Error>(&err, err.body_text()))
            }
            other => AppError::InvalidInput(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        match rejection {
            QueryRejection::FailedToDeserializeQueryString(err) => {
                AppError::Validation(field_errors::<serde::de::value::Error>(&err, err.body_text()))
            }
            other => AppError::InvalidInput(other.body_text()),
        }
    }
}

/// Walks the rejection's sources to the serde path error, if there is one.
fn field_errors<E>(rejection: &(dyn StdError + 'static), fallback: String) -> FieldErrors
where
    E: StdError + 'static,
{
    let mut source = Some(rejection);
    while let Some(err) = source {
        if let Some(path_err) = err.downcast_ref::<serde_path_to_error::Error<E>>() {
            return path_field_errors(path_err);
        }
        source = err.source();
    }
    FieldErrors::single(NON_FIELD_ERRORS, fallback)
}

fn path_field_errors<E: Display>(err: &serde_path_to_error::Error<E>) -> FieldErrors {
    let message = err.inner().to_string();
    let field = err
        .path()
        .iter()
        .find_map(|segment| match segment {
            Segment::Map { key } => Some(key.clone()),
            _ => None,
        })
        .or_else(|| missing_field(&message))
        .unwrap_or_else(|| NON_FIELD_ERRORS.to_string());
    FieldErrors::single(&field, message)
}

// serde reports an absent top-level field on the parent, with an empty path.
fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split_once('`').map(|(name, _)| name.to_string())
}
