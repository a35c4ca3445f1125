//! Article sync service: CRUD, search and pagination with cache fallback.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{ApiError, Paginated};
use crate::model::{Article, ArticleDraft, Category};
use crate::store::Store;

use super::{contains_ci, now_timestamp, paginate, synthesize_id, RequestSeq, SyncError};

/// Fixed page size for article listings.
pub const ARTICLES_PER_PAGE: u32 = 9;

/// Maximum number of related articles returned by the fallback path.
const RELATED_LIMIT: usize = 3;

/// Image applied when a draft leaves the field empty.
const DEFAULT_IMAGE: &str = "https://picsum.photos/seed/article/800/450";

/// Remote side of the article service. Implemented by
/// [`crate::api::ApiClient`]; tests substitute failing or counting fakes.
#[async_trait]
pub trait ArticleRemote: Send + Sync {
  async fn list(
    &self,
    page: u32,
    search: Option<&str>,
    category_id: Option<&str>,
  ) -> Result<Paginated<Article>, ApiError>;

  async fn get(&self, id: &str) -> Result<Article, ApiError>;

  async fn related(&self, category_id: &str, exclude_id: &str) -> Result<Vec<Article>, ApiError>;

  async fn create(&self, draft: &ArticleDraft) -> Result<Article, ApiError>;

  async fn update(&self, id: &str, draft: &ArticleDraft) -> Result<Article, ApiError>;

  async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// Parameters for a list call.
///
/// `category_id: None` means all categories; the empty-string sentinel the
/// wire format uses never appears on this side of the boundary.
#[derive(Debug, Clone)]
pub struct ArticleQuery {
  pub page: u32,
  pub search: Option<String>,
  pub category_id: Option<String>,
  /// When false and a snapshot exists, skip the remote attempt entirely and
  /// serve cache-only filtering.
  pub force_refresh: bool,
}

impl Default for ArticleQuery {
  fn default() -> Self {
    Self {
      page: 1,
      search: None,
      category_id: None,
      force_refresh: true,
    }
  }
}

/// Article sync service over an injected remote and cache store.
pub struct ArticleService<R, S> {
  remote: R,
  store: Arc<S>,
  seq: RequestSeq,
}

impl<R: ArticleRemote, S: Store> ArticleService<R, S> {
  pub fn new(remote: R, store: Arc<S>) -> Self {
    Self {
      remote,
      store,
      seq: RequestSeq::new(),
    }
  }

  /// List articles, filtered and paginated.
  ///
  /// The remote answers with server-side filtering when reachable; otherwise
  /// the cached snapshot is filtered and paginated locally into an envelope
  /// of the same shape. `pagination.total` is always the pre-pagination
  /// count of matches.
  pub async fn list(&self, query: &ArticleQuery) -> Result<Paginated<Article>, SyncError> {
    let snapshot = self.store.load::<Article>();

    if !query.force_refresh && !snapshot.is_empty() {
      return Ok(Self::filter_page(&snapshot, query));
    }

    let ticket = self.seq.issue();
    match self
      .remote
      .list(
        query.page,
        query.search.as_deref(),
        query.category_id.as_deref(),
      )
      .await
    {
      Ok(page) => {
        // Only the latest in-flight response may overwrite the snapshot,
        // and an empty page never clobbers known-good data.
        if self.seq.is_latest(ticket) && !page.data.is_empty() {
          self.store.save(&page.data);
        }
        Ok(page)
      }
      Err(err) => {
        warn!(error = %err, "article list fetch failed, serving cached snapshot");
        Ok(Self::filter_page(&snapshot, query))
      }
    }
  }

  /// Fetch a single article, falling back to the snapshot.
  pub async fn get_by_id(&self, id: &str) -> Result<Article, SyncError> {
    let mut snapshot = self.store.load::<Article>();

    match self.remote.get(id).await {
      Ok(article) => {
        match snapshot.iter_mut().find(|a| a.id == article.id) {
          Some(slot) => *slot = article.clone(),
          None => snapshot.push(article.clone()),
        }
        self.store.save(&snapshot);
        Ok(article)
      }
      Err(err) => {
        debug!(id, error = %err, "article fetch failed, checking cached snapshot");
        snapshot
          .iter()
          .find(|a| a.id == id)
          .cloned()
          .ok_or_else(|| SyncError::not_found("article", id))
      }
    }
  }

  /// Up to three articles sharing `category_id`, excluding `exclude_id`.
  /// Fallback order is the snapshot's insertion order, not relevance.
  pub async fn get_related(
    &self,
    category_id: &str,
    exclude_id: &str,
  ) -> Result<Vec<Article>, SyncError> {
    let snapshot = self.store.load::<Article>();

    match self.remote.related(category_id, exclude_id).await {
      Ok(articles) => Ok(articles),
      Err(err) => {
        warn!(error = %err, "related articles fetch failed, serving cached snapshot");
        Ok(
          snapshot
            .iter()
            .filter(|a| a.category_id == category_id && a.id != exclude_id)
            .take(RELATED_LIMIT)
            .cloned()
            .collect(),
        )
      }
    }
  }

  /// Create an article. Offline, the entity is synthesized locally with a
  /// generated id and `created_at == updated_at`, then prepended so it shows
  /// first in subsequent unfiltered lists. An explicit 401/403 refusal is
  /// not worked around locally.
  pub async fn create(&self, draft: &ArticleDraft) -> Result<Article, SyncError> {
    match self.remote.create(draft).await {
      Ok(article) => {
        let mut snapshot = self.store.load::<Article>();
        snapshot.insert(0, article.clone());
        self.store.save(&snapshot);
        Ok(article)
      }
      Err(err) if err.denies_access() => Err(err.into()),
      Err(err) => {
        warn!(error = %err, "article create failed, synthesizing locally");
        let mut snapshot = self.store.load::<Article>();
        let now = now_timestamp();
        let article = Article {
          id: synthesize_id(|candidate| snapshot.iter().any(|a| a.id == candidate)),
          title: draft.title.clone(),
          content: draft.content.clone(),
          image: Self::draft_image(draft, None),
          category_id: draft.category_id.clone(),
          category_name: self.lookup_category_name(&draft.category_id),
          created_at: now.clone(),
          updated_at: now,
        };
        snapshot.insert(0, article.clone());
        self.store.save(&snapshot);
        Ok(article)
      }
    }
  }

  /// Update an article. Offline, the entity must already exist in the
  /// snapshot (else `NotFound`, cache untouched); `created_at` is preserved
  /// and an empty draft image keeps the old one.
  pub async fn update(&self, id: &str, draft: &ArticleDraft) -> Result<Article, SyncError> {
    match self.remote.update(id, draft).await {
      Ok(article) => {
        let mut snapshot = self.store.load::<Article>();
        if let Some(slot) = snapshot.iter_mut().find(|a| a.id == id) {
          *slot = article.clone();
          self.store.save(&snapshot);
        }
        Ok(article)
      }
      Err(err) if err.denies_access() => Err(err.into()),
      Err(err) => {
        warn!(error = %err, "article update failed, applying locally");
        let mut snapshot = self.store.load::<Article>();
        let Some(pos) = snapshot.iter().position(|a| a.id == id) else {
          return Err(SyncError::not_found("article", id));
        };

        let previous = &snapshot[pos];
        let article = Article {
          id: id.to_string(),
          title: draft.title.clone(),
          content: draft.content.clone(),
          image: Self::draft_image(draft, Some(&previous.image)),
          category_id: draft.category_id.clone(),
          category_name: self.lookup_category_name(&draft.category_id),
          created_at: previous.created_at.clone(),
          updated_at: now_timestamp(),
        };
        snapshot[pos] = article.clone();
        self.store.save(&snapshot);
        Ok(article)
      }
    }
  }

  /// Delete an article. Idempotent: a missing id is not an error, and both
  /// the remote and fallback paths remove the cache entry.
  pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
    match self.remote.delete(id).await {
      Ok(()) => {}
      Err(err) if err.denies_access() => return Err(err.into()),
      Err(err) => {
        warn!(error = %err, "article delete failed remotely, removing locally");
      }
    }

    let mut snapshot = self.store.load::<Article>();
    snapshot.retain(|a| a.id != id);
    self.store.save(&snapshot);
    Ok(())
  }

  fn filter_page(snapshot: &[Article], query: &ArticleQuery) -> Paginated<Article> {
    let filtered: Vec<Article> = snapshot
      .iter()
      .filter(|article| {
        let matches_category = match query.category_id.as_deref() {
          Some(category_id) => article.category_id == category_id,
          None => true,
        };
        let matches_search = match query.search.as_deref() {
          Some(search) if !search.is_empty() => {
            contains_ci(&article.title, search) || contains_ci(&article.content, search)
          }
          _ => true,
        };
        matches_category && matches_search
      })
      .cloned()
      .collect();

    paginate(filtered, query.page, ARTICLES_PER_PAGE)
  }

  fn lookup_category_name(&self, category_id: &str) -> Option<String> {
    self
      .store
      .load::<Category>()
      .iter()
      .find(|c| c.id == category_id)
      .map(|c| c.name.clone())
  }

  fn draft_image(draft: &ArticleDraft, previous: Option<&str>) -> String {
    if !draft.image.is_empty() {
      draft.image.clone()
    } else if let Some(previous) = previous {
      previous.to_string()
    } else {
      DEFAULT_IMAGE.to_string()
    }
  }
}
