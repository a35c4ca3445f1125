//! Remote client for the content API.
//!
//! A thin `reqwest` wrapper with a fixed base URL, bearer-token injection
//! from the persisted store, and typed decoding of the `{status, message,
//! data}` response envelope. There is no retry or backoff here: one failed
//! call fails once and the calling service decides the fallback.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{Envelope, Paginated, PaginationInfo};

use thiserror::Error;

/// Failure surfaced by the remote client.
#[derive(Debug, Error)]
pub enum ApiError {
  /// 401: the stored session was rejected and has been cleared.
  #[error("session expired, sign in again")]
  Unauthorized,

  /// 403: the current user may not perform this action.
  #[error("permission denied")]
  Forbidden,

  /// Any other non-2xx response, with the server's message when decodable.
  #[error("server returned {code}: {message}")]
  Status { code: u16, message: String },

  /// Transport-level failure (DNS, TLS, connection refused, timeout).
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// 2xx response whose body did not match the expected shape.
  #[error("malformed response: {0}")]
  Decode(String),
}

impl ApiError {
  /// Whether the server explicitly refused the request. These are surfaced
  /// to the caller on writes instead of being papered over by the cache
  /// fallback.
  pub fn denies_access(&self) -> bool {
    matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
  }
}
