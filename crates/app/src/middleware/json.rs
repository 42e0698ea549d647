//! JSON body extractor whose rejections use the app's error envelope.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` for request bodies, rejecting with a 400 [`AppError`]
/// instead of axum's plain-text 415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
