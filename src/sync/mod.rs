//! Client-side data synchronization with cache fallback.
//!
//! Each service follows the same control flow for every operation: reload
//! the persisted snapshot, attempt the remote call, merge-and-persist on
//! success, and degrade to filtering/paginating the snapshot on failure.
//! Filtering and pagination live here so the cache-only path and the
//! fallback path run the exact same code.

pub mod articles;
pub mod categories;

use chrono::{SecondsFormat, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::api::{ApiError, Paginated, PaginationInfo};

/// Failure surfaced by a sync service after the fallback path has been tried.
#[derive(Debug, Error)]
pub enum SyncError {
  /// The entity is absent from both the remote API and the local snapshot.
  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  /// A remote failure with no fallback path (auth endpoints, and writes the
  /// caller asked to treat as strict).
  #[error(transparent)]
  Api(#[from] ApiError),
}

impl SyncError {
  pub fn not_found(kind: &'static str, id: &str) -> Self {
    SyncError::NotFound {
      kind,
      id: id.to_string(),
    }
  }
}

/// Current instant as the ISO-8601 string the API uses on the wire.
pub fn now_timestamp() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Case-insensitive substring match.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Slice a filtered list into the standard pagination envelope.
///
/// `total` is always the pre-pagination count and `total_pages` is
/// `ceil(total / per_page)`. A page past the end yields an empty `data`;
/// clamping `page` into range is the caller's job.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Paginated<T> {
  let page = page.max(1);
  let total = items.len() as u32;
  let total_pages = total.div_ceil(per_page);
  // Widen and saturate so an absurd page number cannot overflow; skipping
  // past the end already yields an empty page.
  let start = (page as usize - 1).saturating_mul(per_page as usize);

  let data: Vec<T> = items
    .into_iter()
    .skip(start)
    .take(per_page as usize)
    .collect();

  Paginated {
    data,
    pagination: PaginationInfo {
      current_page: page,
      total_pages,
      total,
      per_page,
    },
  }
}

/// Synthesize a client-side id for an entity created while offline.
///
/// Ids are `new-<unix-millis>`, bumped with a suffix until they collide with
/// nothing the caller already holds, so rapid successive creates within the
/// same millisecond still get distinct ids.
pub fn synthesize_id(is_taken: impl Fn(&str) -> bool) -> String {
  let base = Utc::now().timestamp_millis();
  let mut candidate = format!("new-{base}");
  let mut bump = 1u32;
  while is_taken(&candidate) {
    candidate = format!("new-{base}-{bump}");
    bump += 1;
  }
  candidate
}

/// Monotonic sequence guarding cache writes against stale responses.
///
/// Issue a ticket before awaiting a remote list call; only apply the
/// response to the snapshot if no newer ticket was issued meanwhile. This
/// keeps an out-of-order response from overwriting fresher state.
#[derive(Debug, Default)]
pub struct RequestSeq(AtomicU64);

impl RequestSeq {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserve the next ticket.
  pub fn issue(&self) -> u64 {
    self.0.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Whether `ticket` is still the most recently issued one.
  pub fn is_latest(&self, ticket: u64) -> bool {
    self.0.load(Ordering::SeqCst) == ticket
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_paginate_math() {
    let items: Vec<u32> = (0..10).collect();

    let first = paginate(items.clone(), 1, 9);
    assert_eq!(first.data.len(), 9);
    assert_eq!(first.pagination.total, 10);
    assert_eq!(first.pagination.total_pages, 2);
    assert_eq!(first.pagination.per_page, 9);
    assert_eq!(first.pagination.current_page, 1);

    let second = paginate(items, 2, 9);
    assert_eq!(second.data, vec![9]);
    assert_eq!(second.pagination.current_page, 2);
  }

  #[test]
  fn test_paginate_exact_multiple() {
    let items: Vec<u32> = (0..20).collect();
    let page = paginate(items, 1, 10);
    assert_eq!(page.pagination.total_pages, 2);
  }

  #[test]
  fn test_paginate_empty_and_past_end() {
    let empty: Paginated<u32> = paginate(vec![], 1, 9);
    assert_eq!(empty.pagination.total, 0);
    assert_eq!(empty.pagination.total_pages, 0);
    assert!(empty.data.is_empty());

    let past = paginate(vec![1, 2, 3], 5, 9);
    assert!(past.data.is_empty());
    assert_eq!(past.pagination.current_page, 5);
    assert_eq!(past.pagination.total, 3);
  }

  #[test]
  fn test_paginate_huge_page_number() {
    let past = paginate(vec![1, 2, 3], u32::MAX, 9);
    assert!(past.data.is_empty());
    assert_eq!(past.pagination.current_page, u32::MAX);
    assert_eq!(past.pagination.total, 3);
  }

  #[test]
  fn test_contains_ci() {
    assert!(contains_ci("Getting Started with React", "rEaCt"));
    assert!(!contains_ci("Getting Started", "vue"));
  }

  #[test]
  fn test_synthesize_id_avoids_collisions() {
    let first = synthesize_id(|_| false);
    assert!(first.starts_with("new-"));

    let second = synthesize_id(|candidate| candidate == first);
    assert_ne!(first, second);
  }

  #[test]
  fn test_request_seq_latest_only() {
    let seq = RequestSeq::new();
    let a = seq.issue();
    assert!(seq.is_latest(a));

    let b = seq.issue();
    assert!(!seq.is_latest(a));
    assert!(seq.is_latest(b));
  }
}
