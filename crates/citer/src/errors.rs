//! Error types for the citer library.
//!
//! This module provides a single error type covering every failure mode of
//! the resolution pipeline:
//! - Network and API errors
//! - Input classification
//! - Embedded citation parsing
//! - Style lookup and rendering
//!
//! Note that most of these never reach a caller of the high-level pipeline:
//! resolution treats failing sources as "no contribution" and falls through
//! to the next strategy, so errors here surface mainly through logs and in
//! the few operations (input parsing, rendering without a fallback) that
//! have no weaker strategy to fall back on.

use thiserror::Error;

/// Errors that can occur when resolving or rendering a citation.
///
/// Wraps the error types of the underlying transport and parsing crates
/// with the `transparent` pattern so that original messages are preserved,
/// and adds domain-specific variants for the pipeline itself.
#[derive(Error, Debug)]
pub enum CiterError {
  /// The input string is neither a URL nor a DOI.
  ///
  /// This is the only hard failure of the resolution pipeline: every
  /// downstream error degrades to a weaker metadata strategy instead.
  #[error("Input is neither a URL nor a DOI")]
  InvalidIdentifier,

  /// The requested citation style is not in the bundled style archive.
  ///
  /// The string parameter carries the requested style name.
  #[error("Unknown citation style: {0}")]
  InvalidStyle(String),

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  /// - TLS/SSL errors occur
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A metadata endpoint answered with a non-success status.
  #[error("Metadata not found")]
  NotFound,

  /// An API returned a response we could not use.
  ///
  /// The string parameter contains the underlying message for debugging.
  #[error("API error: {0}")]
  ApiError(String),

  /// Failed to parse a URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// An embedded citation block could not be parsed as bibtex.
  #[error("Bibtex parse error: {0}")]
  Bibtex(String),

  /// The citation style grammar failed to render the record.
  ///
  /// Callers with a captured raw citation block fall back to it instead
  /// of propagating this.
  #[error("Render error: {0}")]
  Render(String),
}
