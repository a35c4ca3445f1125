//! In-memory store backend for tests and throwaway sessions.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use super::Store;

/// Store backend that keeps everything in a process-local map.
///
/// Shares the exact `Store` contract with [`super::SqliteStore`] so services
/// can be exercised without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
  map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Store for MemoryStore {
  fn get_raw(&self, key: &str) -> Result<Option<String>> {
    let map = self.map.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(map.get(key).cloned())
  }

  fn put_raw(&self, key: &str, value: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_raw(&self, key: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    map.remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Category;

  #[test]
  fn test_raw_round_trip() {
    let store = MemoryStore::new();
    store.put_raw("user", "{}").unwrap();
    assert_eq!(store.get_raw("user").unwrap(), Some("{}".to_string()));
    store.remove_raw("user").unwrap();
    assert_eq!(store.get_raw("user").unwrap(), None);
  }

  #[test]
  fn test_snapshot_round_trip() {
    let store = MemoryStore::new();
    let categories = vec![Category {
      id: "cat-9".into(),
      name: "Editorial".into(),
      created_at: "2024-01-01T00:00:00Z".into(),
      updated_at: "2024-01-01T00:00:00Z".into(),
    }];
    store.save(&categories);
    assert_eq!(store.load::<Category>(), categories);
  }
}
