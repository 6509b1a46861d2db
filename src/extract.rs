// =============================================================================
// EXTRACTORS MODULE
// =============================================================================
// Thin wrappers over axum's Json, Query and Path extractors whose rejections
// are AppError, so a bad request gets the standard JSON error body.
//
// LEARNING NOTE:
// `via(...)` delegates the actual parsing to the wrapped extractor;
// `rejection(...)` converts its failure with the From impls in error.rs.
// =============================================================================

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

/// Query string parameters
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameters
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);
