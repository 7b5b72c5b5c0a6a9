//! Error taxonomy for the remote transactions API.

use thiserror::Error;

/// Errors surfaced by the API client and the query layer on top of it.
///
/// Every variant is terminal for the call that produced it: nothing in this
/// crate retries automatically. A retry is a fresh consumer-triggered read.
/// The type is `Clone` because an in-flight fetch result may be delivered to
/// several subscribed consumers of the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// Credential missing, invalid, or expired. The query stays disabled
  /// until an external flow refreshes the token.
  #[error("authentication failed: {0}")]
  Auth(String),

  /// Transport-level failure (connection, timeout, 5xx).
  #[error("network error: {0}")]
  Network(String),

  /// The requested entity does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// The server rejected the input (malformed import file, unsupported
  /// institution, bad payload).
  #[error("validation failed: {0}")]
  Validation(String),

  /// The response arrived but could not be decoded into the expected shape.
  #[error("malformed response: {0}")]
  Decode(String),
}
