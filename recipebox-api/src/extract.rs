/// Request extractors
///
/// [`ApiJson`] behaves like `axum::Json` but rejects with [`ApiError`], so a
/// malformed body gets the same JSON error shape as every other failure.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor rejecting with [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
