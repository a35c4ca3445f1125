//! Domain entities shared by the sync services, the API client and the CLI.

use serde::{Deserialize, Serialize};

/// Placeholder label shown when an article's category cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A published article.
///
/// Timestamps are ISO-8601 strings, exactly as the API serves them.
/// `category_name` is a denormalized copy of the category's name kept for
/// display only; it is never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
  pub id: String,
  pub title: String,
  pub content: String,
  pub image: String,
  pub category_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_name: Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl Article {
  /// Category label for display, tolerating dangling `category_id` references.
  pub fn display_category(&self) -> &str {
    self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
  }
}

/// An article category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id: String,
  pub name: String,
  pub created_at: String,
  pub updated_at: String,
}

/// Form payload for creating or updating an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDraft {
  pub title: String,
  pub content: String,
  pub image: String,
  pub category_id: String,
}

/// Form payload for creating or updating a category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDraft {
  pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[serde(other)]
  User,
}

/// Authenticated user record, persisted alongside the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: Role,
}

/// Response from the auth endpoints: the user plus a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
  pub user: User,
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
  pub name: String,
  pub email: String,
  pub password: String,
  pub password_confirmation: String,
}
