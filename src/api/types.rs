//! Wire types for the content API.

use serde::Deserialize;

/// Standard success wrapper: `{ status, message, data }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  #[serde(default)]
  pub status: bool,
  #[serde(default)]
  pub message: String,
  pub data: T,
}

/// A page of results plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Paginated<T> {
  pub data: Vec<T>,
  pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaginationInfo {
  pub current_page: u32,
  pub total_pages: u32,
  pub total: u32,
  pub per_page: u32,
}

/// Minimal shape we try to salvage a message from on error responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
  #[serde(default)]
  pub message: String,
}
