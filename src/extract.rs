//! Request extractors whose rejections go through `ApiError`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// ValidJson
///
/// `axum::Json`, but a missing field, a wrong type or a syntax error is a 400
/// with the usual `{"error": ..}` body instead of axum's plain-text 400/422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);

/// ValidPath
///
/// `axum::extract::Path` with the same rejection treatment.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ValidPath<T>(pub T);
