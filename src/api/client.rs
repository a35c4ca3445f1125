//! HTTP client for the content API.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::model::{Article, ArticleDraft, Category, CategoryDraft};
use crate::store::{Store, TOKEN_KEY, USER_KEY};
use crate::sync::articles::ArticleRemote;
use crate::sync::categories::CategoryRemote;

use super::types::ErrorBody;
use super::{ApiError, Envelope, Paginated};

/// Page size used to fetch the whole category collection in one call.
const ALL_CATEGORIES_PAGE: u32 = 100;

/// Shared client for the content API.
///
/// Holds the base URL and the persisted store it reads the bearer token
/// from. A 401 response tears the stored session down before surfacing
/// [`ApiError::Unauthorized`].
pub struct ApiClient<S> {
  http: reqwest::Client,
  base: Url,
  store: Arc<S>,
}

impl<S> Clone for ApiClient<S> {
  fn clone(&self) -> Self {
    Self {
      http: self.http.clone(),
      base: self.base.clone(),
      store: Arc::clone(&self.store),
    }
  }
}

impl<S: Store> ApiClient<S> {
  pub fn new(base_url: &str, store: Arc<S>) -> Result<Self> {
    let base = Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL {}: {}", base_url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base,
      store,
    })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
  }

  pub async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiError> {
    let req = self.http.get(self.endpoint(path)).query(query);
    self.send(req).await
  }

  pub async fn post_json<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let req = self.http.post(self.endpoint(path)).json(body);
    self.send(req).await
  }

  pub async fn put_json<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let req = self.http.put(self.endpoint(path)).json(body);
    self.send(req).await
  }

  pub async fn delete_empty(&self, path: &str) -> Result<(), ApiError> {
    let req = self.http.delete(self.endpoint(path));
    self.execute(req).await?;
    Ok(())
  }

  async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
    let body = self.execute(req).await?;
    let envelope: Envelope<T> =
      serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(envelope.data)
  }

  /// Attach the bearer token, run the request, and intercept the status.
  /// Returns the raw body text of a 2xx response.
  async fn execute(&self, req: RequestBuilder) -> Result<String, ApiError> {
    let req = match self.store.get_raw(TOKEN_KEY) {
      Ok(Some(token)) => req.bearer_auth(token),
      Ok(None) => req,
      Err(err) => {
        debug!(error = %err, "token read failed, sending unauthenticated");
        req
      }
    };

    let response = req.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
      // Session teardown: the stored token is dead, drop it with the user.
      if let Err(err) = self.store.remove_raw(TOKEN_KEY) {
        warn!(error = %err, "failed to clear stored token");
      }
      if let Err(err) = self.store.remove_raw(USER_KEY) {
        warn!(error = %err, "failed to clear stored user");
      }
      return Err(ApiError::Unauthorized);
    }

    if status == StatusCode::FORBIDDEN {
      return Err(ApiError::Forbidden);
    }

    let body = response.text().await?;

    if !status.is_success() {
      let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "server error".to_string());
      return Err(ApiError::Status {
        code: status.as_u16(),
        message,
      });
    }

    Ok(body)
  }
}

#[async_trait]
impl<S: Store> ArticleRemote for ApiClient<S> {
  async fn list(
    &self,
    page: u32,
    search: Option<&str>,
    category_id: Option<&str>,
  ) -> Result<Paginated<Article>, ApiError> {
    let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
    if let Some(search) = search {
      if !search.is_empty() {
        query.push(("search", search.to_string()));
      }
    }
    if let Some(category_id) = category_id {
      query.push(("category_id", category_id.to_string()));
    }
    self.get_json("/articles", &query).await
  }

  async fn get(&self, id: &str) -> Result<Article, ApiError> {
    self.get_json(&format!("/articles/{id}"), &[]).await
  }

  async fn related(&self, category_id: &str, exclude_id: &str) -> Result<Vec<Article>, ApiError> {
    self
      .get_json(
        &format!("/articles/related/{category_id}"),
        &[("exclude", exclude_id.to_string())],
      )
      .await
  }

  async fn create(&self, draft: &ArticleDraft) -> Result<Article, ApiError> {
    self.post_json("/articles", draft).await
  }

  async fn update(&self, id: &str, draft: &ArticleDraft) -> Result<Article, ApiError> {
    self.put_json(&format!("/articles/{id}"), draft).await
  }

  async fn delete(&self, id: &str) -> Result<(), ApiError> {
    self.delete_empty(&format!("/articles/{id}")).await
  }
}

#[async_trait]
impl<S: Store> CategoryRemote for ApiClient<S> {
  async fn list(&self, page: u32, search: Option<&str>) -> Result<Paginated<Category>, ApiError> {
    let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
    if let Some(search) = search {
      if !search.is_empty() {
        query.push(("search", search.to_string()));
      }
    }
    self.get_json("/categories", &query).await
  }

  async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
    let page: Paginated<Category> = self
      .get_json(
        "/categories",
        &[("per_page", ALL_CATEGORIES_PAGE.to_string())],
      )
      .await?;
    Ok(page.data)
  }

  async fn get(&self, id: &str) -> Result<Category, ApiError> {
    self.get_json(&format!("/categories/{id}"), &[]).await
  }

  async fn create(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
    self.post_json("/categories", draft).await
  }

  async fn update(&self, id: &str, draft: &CategoryDraft) -> Result<Category, ApiError> {
    self.put_json(&format!("/categories/{id}"), draft).await
  }

  async fn delete(&self, id: &str) -> Result<(), ApiError> {
    self.delete_empty(&format!("/categories/{id}")).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client_with_store(base: &str) -> (ApiClient<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = ApiClient::new(base, Arc::clone(&store)).unwrap();
    (client, store)
  }

  fn sign_in(store: &MemoryStore) {
    store.put_raw(TOKEN_KEY, "tok").unwrap();
    store
      .put_raw(
        USER_KEY,
        r#"{"id":"u1","name":"Dana","email":"dana@example.com","role":"admin"}"#,
      )
      .unwrap();
  }

  #[test]
  fn test_endpoint_joins_without_double_slash() {
    let store = Arc::new(MemoryStore::new());
    let client = ApiClient::new("https://cms.example.com/api/", store).unwrap();
    assert_eq!(
      client.endpoint("/articles"),
      "https://cms.example.com/api/articles"
    );
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    let store = Arc::new(MemoryStore::new());
    assert!(ApiClient::new("not a url", store).is_err());
  }

  #[tokio::test]
  async fn test_success_sends_bearer_and_decodes_envelope() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
      "status": true,
      "message": "ok",
      "data": {
        "id": "7",
        "title": "Profiling async Rust",
        "content": "body",
        "image": "https://cdn.example.com/7.png",
        "category_id": "2",
        "created_at": "2024-05-01T00:00:00Z",
        "updated_at": "2024-05-02T00:00:00Z"
      }
    });

    Mock::given(method("GET"))
      .and(path("/articles/7"))
      .and(header("authorization", "Bearer tok"))
      .respond_with(ResponseTemplate::new(200).set_body_json(&body))
      .mount(&server)
      .await;

    let (client, store) = client_with_store(&server.uri());
    sign_in(&store);

    let article = ArticleRemote::get(&client, "7").await.unwrap();
    assert_eq!(article.id, "7");
    assert_eq!(article.title, "Profiling async Rust");
    assert_eq!(article.category_name, None);
  }

  #[tokio::test]
  async fn test_unauthorized_clears_stored_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/articles/7"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;

    let (client, store) = client_with_store(&server.uri());
    sign_in(&store);

    let result = ArticleRemote::get(&client, "7").await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));

    // Both session slots are gone, not just the token.
    assert_eq!(store.get_raw(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get_raw(USER_KEY).unwrap(), None);
  }

  #[tokio::test]
  async fn test_forbidden_leaves_session_intact() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
      .and(path("/articles/7"))
      .respond_with(ResponseTemplate::new(403))
      .mount(&server)
      .await;

    let (client, store) = client_with_store(&server.uri());
    sign_in(&store);

    let result = ArticleRemote::delete(&client, "7").await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
    assert_eq!(store.get_raw(TOKEN_KEY).unwrap(), Some("tok".to_string()));
  }

  #[tokio::test]
  async fn test_server_error_surfaces_envelope_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/articles/7"))
      .respond_with(
        ResponseTemplate::new(500).set_body_json(&serde_json::json!({"message": "boom"})),
      )
      .mount(&server)
      .await;

    let (client, _store) = client_with_store(&server.uri());

    match ArticleRemote::get(&client, "7").await {
      Err(ApiError::Status { code, message }) => {
        assert_eq!(code, 500);
        assert_eq!(message, "boom");
      }
      other => panic!("expected status error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/articles/7"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let (client, _store) = client_with_store(&server.uri());
    let result = ArticleRemote::get(&client, "7").await;
    assert!(matches!(result, Err(ApiError::Decode(_))));
  }

  #[tokio::test]
  async fn test_list_query_omits_empty_filters() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
      "status": true,
      "message": "ok",
      "data": {
        "data": [],
        "pagination": {"current_page": 3, "total_pages": 0, "total": 0, "per_page": 9}
      }
    });

    Mock::given(method("GET"))
      .and(path("/articles"))
      .and(query_param("page", "3"))
      .and(query_param("category_id", "2"))
      .and(query_param_is_missing("search"))
      .respond_with(ResponseTemplate::new(200).set_body_json(&body))
      .mount(&server)
      .await;

    let (client, _store) = client_with_store(&server.uri());
    let page = ArticleRemote::list(&client, 3, Some(""), Some("2"))
      .await
      .unwrap();
    assert_eq!(page.pagination.current_page, 3);
    assert!(page.data.is_empty());
  }
}
