//! Auth session wrapper: bearer token plus user record in the store.
//!
//! Conventional session handling, no offline fallback: a failed login is an
//! error. The token itself is attached to outgoing requests by
//! [`crate::api::ApiClient`], which also clears the session on a 401.

use std::sync::Arc;
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::model::{AuthResponse, LoginRequest, RegisterRequest, Role, User};
use crate::store::{Store, TOKEN_KEY, USER_KEY};

pub struct Session<S> {
  api: ApiClient<S>,
  store: Arc<S>,
}

impl<S: Store> Session<S> {
  pub fn new(api: ApiClient<S>, store: Arc<S>) -> Self {
    Self { api, store }
  }

  pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
    let auth: AuthResponse = self
      .api
      .post_json(
        "/auth/login",
        &LoginRequest {
          email: email.to_string(),
          password: password.to_string(),
        },
      )
      .await?;
    self.remember(&auth);
    Ok(auth)
  }

  pub async fn register(
    &self,
    name: &str,
    email: &str,
    password: &str,
    password_confirmation: &str,
  ) -> Result<AuthResponse, ApiError> {
    let auth: AuthResponse = self
      .api
      .post_json(
        "/auth/register",
        &RegisterRequest {
          name: name.to_string(),
          email: email.to_string(),
          password: password.to_string(),
          password_confirmation: password_confirmation.to_string(),
        },
      )
      .await?;
    self.remember(&auth);
    Ok(auth)
  }

  pub fn logout(&self) {
    for key in [TOKEN_KEY, USER_KEY] {
      if let Err(err) = self.store.remove_raw(key) {
        warn!(key, error = %err, "failed to clear session slot");
      }
    }
  }

  /// The stored user record, or None when absent or unreadable.
  pub fn current_user(&self) -> Option<User> {
    let raw = self.store.get_raw(USER_KEY).ok().flatten()?;
    serde_json::from_str(&raw).ok()
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self.store.get_raw(TOKEN_KEY), Ok(Some(_)))
  }

  pub fn is_admin(&self) -> bool {
    self
      .current_user()
      .map(|u| u.role == Role::Admin)
      .unwrap_or(false)
  }

  fn remember(&self, auth: &AuthResponse) {
    if let Err(err) = self.store.put_raw(TOKEN_KEY, &auth.token) {
      warn!(error = %err, "failed to persist session token");
    }
    match serde_json::to_string(&auth.user) {
      Ok(raw) => {
        if let Err(err) = self.store.put_raw(USER_KEY, &raw) {
          warn!(error = %err, "failed to persist user record");
        }
      }
      Err(err) => warn!(error = %err, "failed to serialize user record"),
    }
  }
}
