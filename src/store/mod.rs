//! Persisted key-value cache backing the sync services.
//!
//! Two collections (articles, categories) are stored as whole-list JSON
//! snapshots under fixed keys, next to the session token and user record.
//! `load` never fails: a missing key or an unparseable snapshot yields the
//! bundled seed set. `save` failures are logged and swallowed so a full disk
//! or a poisoned lock can never take down the caller.

mod memory;
mod seed;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Storage slot for the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage slot for the serialized user record.
pub const USER_KEY: &str = "user";

/// An entity collection that can be cached as a whole-list snapshot.
pub trait Collection: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Storage key the snapshot lives under (e.g. "articles").
  const KEY: &'static str;

  /// Bundled default list used when no snapshot exists yet.
  fn seed() -> Vec<Self>;
}

/// Trait for cache storage backends.
///
/// Backends only implement the raw string slots; the typed snapshot
/// operations are provided on top and follow the never-throw contract.
pub trait Store: Send + Sync {
  fn get_raw(&self, key: &str) -> Result<Option<String>>;
  fn put_raw(&self, key: &str, value: &str) -> Result<()>;
  fn remove_raw(&self, key: &str) -> Result<()>;

  /// Load the snapshot for a collection, falling back to the seed set on a
  /// missing key, a parse failure, or a storage error.
  fn load<T: Collection>(&self) -> Vec<T> {
    match self.get_raw(T::KEY) {
      Ok(Some(raw)) => match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(err) => {
          warn!(key = T::KEY, error = %err, "unreadable cache snapshot, using seed data");
          T::seed()
        }
      },
      Ok(None) => T::seed(),
      Err(err) => {
        warn!(key = T::KEY, error = %err, "cache read failed, using seed data");
        T::seed()
      }
    }
  }

  /// Persist the whole snapshot for a collection. Failures are logged, not
  /// propagated: in-memory state stays correct for the current session.
  fn save<T: Collection>(&self, items: &[T]) {
    match serde_json::to_string(items) {
      Ok(raw) => {
        if let Err(err) = self.put_raw(T::KEY, &raw) {
          warn!(key = T::KEY, error = %err, "cache write failed, continuing without persistence");
        }
      }
      Err(err) => {
        warn!(key = T::KEY, error = %err, "snapshot serialization failed");
      }
    }
  }
}
