//! Category sync service: CRUD and list/all with cache fallback.
//!
//! Same refresh / attempt-remote / fallback pattern as the article service,
//! without search-by-content or related-entity queries.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{ApiError, Paginated};
use crate::model::{Category, CategoryDraft};
use crate::store::Store;

use super::{contains_ci, now_timestamp, paginate, synthesize_id, RequestSeq, SyncError};

/// Fixed page size for category listings.
pub const CATEGORIES_PER_PAGE: u32 = 10;

/// Remote side of the category service.
#[async_trait]
pub trait CategoryRemote: Send + Sync {
  async fn list(&self, page: u32, search: Option<&str>) -> Result<Paginated<Category>, ApiError>;

  /// The "get all" call: one page sized large enough to hold everything.
  async fn get_all(&self) -> Result<Vec<Category>, ApiError>;

  async fn get(&self, id: &str) -> Result<Category, ApiError>;

  async fn create(&self, draft: &CategoryDraft) -> Result<Category, ApiError>;

  async fn update(&self, id: &str, draft: &CategoryDraft) -> Result<Category, ApiError>;

  async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// Category sync service over an injected remote and cache store.
pub struct CategoryService<R, S> {
  remote: R,
  store: Arc<S>,
  seq: RequestSeq,
}

impl<R: CategoryRemote, S: Store> CategoryService<R, S> {
  pub fn new(remote: R, store: Arc<S>) -> Self {
    Self {
      remote,
      store,
      seq: RequestSeq::new(),
    }
  }

  /// List categories; search matches the name only.
  pub async fn list(&self, page: u32, search: Option<&str>) -> Result<Paginated<Category>, SyncError> {
    let snapshot = self.store.load::<Category>();

    let ticket = self.seq.issue();
    match self.remote.list(page, search).await {
      Ok(result) => {
        if self.seq.is_latest(ticket) && !result.data.is_empty() {
          self.store.save(&result.data);
        }
        Ok(result)
      }
      Err(err) => {
        warn!(error = %err, "category list fetch failed, serving cached snapshot");
        Ok(Self::filter_page(&snapshot, page, search))
      }
    }
  }

  /// The full unpaginated collection, used to populate forms and filters.
  ///
  /// This is the hottest call in the client: with `force_refresh == false`
  /// and a non-empty snapshot it never touches the network. A remote failure
  /// or an empty remote result also falls back to the snapshot.
  pub async fn get_all(&self, force_refresh: bool) -> Result<Vec<Category>, SyncError> {
    let snapshot = self.store.load::<Category>();

    if !force_refresh && !snapshot.is_empty() {
      return Ok(snapshot);
    }

    let ticket = self.seq.issue();
    match self.remote.get_all().await {
      Ok(all) if !all.is_empty() => {
        if self.seq.is_latest(ticket) {
          self.store.save(&all);
        }
        Ok(all)
      }
      Ok(_) => Ok(snapshot),
      Err(err) => {
        warn!(error = %err, "category fetch failed, serving cached snapshot");
        Ok(snapshot)
      }
    }
  }

  /// Fetch a single category, falling back to the snapshot.
  pub async fn get_by_id(&self, id: &str) -> Result<Category, SyncError> {
    let mut snapshot = self.store.load::<Category>();

    match self.remote.get(id).await {
      Ok(category) => {
        match snapshot.iter_mut().find(|c| c.id == category.id) {
          Some(slot) => *slot = category.clone(),
          None => snapshot.push(category.clone()),
        }
        self.store.save(&snapshot);
        Ok(category)
      }
      Err(err) => {
        debug!(id, error = %err, "category fetch failed, checking cached snapshot");
        snapshot
          .iter()
          .find(|c| c.id == id)
          .cloned()
          .ok_or_else(|| SyncError::not_found("category", id))
      }
    }
  }

  /// Create a category, synthesizing it locally when the remote is down.
  /// An explicit 401/403 refusal is not worked around locally.
  pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, SyncError> {
    match self.remote.create(draft).await {
      Ok(category) => {
        let mut snapshot = self.store.load::<Category>();
        snapshot.insert(0, category.clone());
        self.store.save(&snapshot);
        Ok(category)
      }
      Err(err) if err.denies_access() => Err(err.into()),
      Err(err) => {
        warn!(error = %err, "category create failed, synthesizing locally");
        let mut snapshot = self.store.load::<Category>();
        let now = now_timestamp();
        let category = Category {
          id: synthesize_id(|candidate| snapshot.iter().any(|c| c.id == candidate)),
          name: draft.name.clone(),
          created_at: now.clone(),
          updated_at: now,
        };
        snapshot.insert(0, category.clone());
        self.store.save(&snapshot);
        Ok(category)
      }
    }
  }

  /// Update a category. The offline path requires the entity to exist and
  /// preserves `created_at`.
  pub async fn update(&self, id: &str, draft: &CategoryDraft) -> Result<Category, SyncError> {
    match self.remote.update(id, draft).await {
      Ok(category) => {
        let mut snapshot = self.store.load::<Category>();
        if let Some(slot) = snapshot.iter_mut().find(|c| c.id == id) {
          *slot = category.clone();
          self.store.save(&snapshot);
        }
        Ok(category)
      }
      Err(err) if err.denies_access() => Err(err.into()),
      Err(err) => {
        warn!(error = %err, "category update failed, applying locally");
        let mut snapshot = self.store.load::<Category>();
        let Some(slot) = snapshot.iter_mut().find(|c| c.id == id) else {
          return Err(SyncError::not_found("category", id));
        };
        slot.name = draft.name.clone();
        slot.updated_at = now_timestamp();
        let category = slot.clone();
        self.store.save(&snapshot);
        Ok(category)
      }
    }
  }

  /// Delete a category. Idempotent on both paths.
  pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
    match self.remote.delete(id).await {
      Ok(()) => {}
      Err(err) if err.denies_access() => return Err(err.into()),
      Err(err) => {
        warn!(error = %err, "category delete failed remotely, removing locally");
      }
    }

    let mut snapshot = self.store.load::<Category>();
    snapshot.retain(|c| c.id != id);
    self.store.save(&snapshot);
    Ok(())
  }

  fn filter_page(snapshot: &[Category], page: u32, search: Option<&str>) -> Paginated<Category> {
    let filtered: Vec<Category> = snapshot
      .iter()
      .filter(|category| match search {
        Some(search) if !search.is_empty() => contains_ci(&category.name, search),
        _ => true,
      })
      .cloned()
      .collect();

    paginate(filtered, page, CATEGORIES_PER_PAGE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  struct OfflineRemote;

  fn unreachable() -> ApiError {
    ApiError::Status {
      code: 503,
      message: "unreachable".to_string(),
    }
  }

  #[async_trait]
  impl CategoryRemote for OfflineRemote {
    async fn list(
      &self,
      _page: u32,
      _search: Option<&str>,
    ) -> Result<Paginated<Category>, ApiError> {
      Err(unreachable())
    }

    async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
      Err(unreachable())
    }

    async fn get(&self, _id: &str) -> Result<Category, ApiError> {
      Err(unreachable())
    }

    async fn create(&self, _draft: &CategoryDraft) -> Result<Category, ApiError> {
      Err(unreachable())
    }

    async fn update(&self, _id: &str, _draft: &CategoryDraft) -> Result<Category, ApiError> {
      Err(unreachable())
    }

    async fn delete(&self, _id: &str) -> Result<(), ApiError> {
      Err(unreachable())
    }
  }

  /// Remote that counts get_all calls.
  struct CountingRemote {
    calls: std::sync::atomic::AtomicUsize,
    all: Vec<Category>,
  }

  #[async_trait]
  impl CategoryRemote for CountingRemote {
    async fn list(
      &self,
      _page: u32,
      _search: Option<&str>,
    ) -> Result<Paginated<Category>, ApiError> {
      Err(unreachable())
    }

    async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
      self
        .calls
        .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
      Ok(self.all.clone())
    }

    async fn get(&self, _id: &str) -> Result<Category, ApiError> {
      Err(unreachable())
    }

    async fn create(&self, _draft: &CategoryDraft) -> Result<Category, ApiError> {
      Err(unreachable())
    }

    async fn update(&self, _id: &str, _draft: &CategoryDraft) -> Result<Category, ApiError> {
      Err(unreachable())
    }

    async fn delete(&self, _id: &str) -> Result<(), ApiError> {
      Err(unreachable())
    }
  }

  fn category(id: &str, name: &str) -> Category {
    Category {
      id: id.to_string(),
      name: name.to_string(),
      created_at: "2023-01-01T00:00:00Z".to_string(),
      updated_at: "2023-01-01T00:00:00Z".to_string(),
    }
  }

  fn many_categories(n: usize) -> Vec<Category> {
    (1..=n)
      .map(|i| category(&format!("cat-{i}"), &format!("Topic {i}")))
      .collect()
  }

  fn seeded_store(categories: &[Category]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.save(categories);
    store
  }

  #[tokio::test]
  async fn test_fallback_list_searches_name_only() {
    let store = seeded_store(&[
      category("cat-1", "Frontend"),
      category("cat-2", "Backend"),
      category("cat-3", "Infra"),
    ]);
    let service = CategoryService::new(OfflineRemote, store);

    let page = service.list(1, Some("end")).await.unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.per_page, CATEGORIES_PER_PAGE);
  }

  #[tokio::test]
  async fn test_fallback_list_paginates_at_ten() {
    let service = CategoryService::new(OfflineRemote, seeded_store(&many_categories(13)));

    let first = service.list(1, None).await.unwrap();
    assert_eq!(first.data.len(), 10);
    assert_eq!(first.pagination.total, 13);
    assert_eq!(first.pagination.total_pages, 2);

    let second = service.list(2, None).await.unwrap();
    assert_eq!(second.data.len(), 3);
  }

  #[tokio::test]
  async fn test_get_all_fallback_returns_snapshot() {
    let categories = many_categories(4);
    let service = CategoryService::new(OfflineRemote, seeded_store(&categories));

    assert_eq!(service.get_all(true).await.unwrap(), categories);
  }

  #[tokio::test]
  async fn test_get_all_cached_skips_remote() {
    let remote = CountingRemote {
      calls: std::sync::atomic::AtomicUsize::new(0),
      all: many_categories(2),
    };
    let service = CategoryService::new(remote, seeded_store(&many_categories(4)));

    let all = service.get_all(false).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(
      service
        .remote
        .calls
        .load(std::sync::atomic::Ordering::SeqCst),
      0
    );

    // force_refresh goes to the network and replaces the snapshot
    let refreshed = service.get_all(true).await.unwrap();
    assert_eq!(refreshed.len(), 2);
    assert_eq!(
      service
        .remote
        .calls
        .load(std::sync::atomic::Ordering::SeqCst),
      1
    );
    assert_eq!(service.store.load::<Category>().len(), 2);
  }

  #[tokio::test]
  async fn test_get_all_empty_remote_keeps_snapshot() {
    let remote = CountingRemote {
      calls: std::sync::atomic::AtomicUsize::new(0),
      all: vec![],
    };
    let snapshot = many_categories(3);
    let service = CategoryService::new(remote, seeded_store(&snapshot));

    assert_eq!(service.get_all(true).await.unwrap(), snapshot);
  }

  #[tokio::test]
  async fn test_create_offline_prepends() {
    let service = CategoryService::new(OfflineRemote, seeded_store(&many_categories(2)));

    let created = service
      .create(&CategoryDraft {
        name: "Brand New".to_string(),
      })
      .await
      .unwrap();

    assert!(created.id.starts_with("new-"));
    assert_eq!(created.created_at, created.updated_at);

    let all = service.get_all(false).await.unwrap();
    assert_eq!(all[0].id, created.id);
  }

  #[tokio::test]
  async fn test_update_offline_preserves_created_at() {
    let service = CategoryService::new(OfflineRemote, seeded_store(&many_categories(2)));

    let updated = service
      .update(
        "cat-1",
        &CategoryDraft {
          name: "Renamed".to_string(),
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.created_at, "2023-01-01T00:00:00Z");
    assert_ne!(updated.updated_at, updated.created_at);
  }

  #[tokio::test]
  async fn test_update_missing_is_not_found() {
    let snapshot = many_categories(2);
    let store = seeded_store(&snapshot);
    let service = CategoryService::new(OfflineRemote, Arc::clone(&store));

    let result = service
      .update(
        "ghost",
        &CategoryDraft {
          name: "Ghost".to_string(),
        },
      )
      .await;
    assert!(matches!(
      result,
      Err(SyncError::NotFound { kind: "category", .. })
    ));
    assert_eq!(store.load::<Category>(), snapshot);
  }

  #[tokio::test]
  async fn test_delete_is_idempotent() {
    let store = seeded_store(&many_categories(3));
    let service = CategoryService::new(OfflineRemote, Arc::clone(&store));

    service.delete("cat-2").await.unwrap();
    service.delete("cat-2").await.unwrap();

    let remaining = store.load::<Category>();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|c| c.id != "cat-2"));
  }
}
