//! Error types for the citerd CLI application.
//!
//! This module provides a single error type wrapping the failure modes of
//! a CLI run: resolution and rendering errors from the underlying citer
//! library, and JSON serialization of the output record. The errors use
//! the `transparent` pattern so the underlying messages reach the user
//! unchanged.

use thiserror::Error;

/// Errors that can occur during CLI operations.
#[derive(Error, Debug)]
pub enum CiterdError {
  /// Errors from the underlying citer library
  #[error(transparent)]
  Citer(#[from] citer::errors::CiterError),

  /// Output record serialization errors
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
