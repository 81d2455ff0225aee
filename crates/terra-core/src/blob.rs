//! The `BlobStore` trait: where uploaded map images go.
//!
//! The store hands back a public URL; nothing about the bytes is kept in
//! the relational store except that URL.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  path::Path,
  sync::Mutex,
};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix under which all map images are keyed.
pub const MAP_KEY_PREFIX: &str = "mapas";

/// Abstraction over an object store for uploaded images.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `content` and return a publicly resolvable URL for it.
  /// `original_name` only contributes its extension to the key.
  fn put(
    &self,
    original_name: String,
    content: Bytes,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}

/// Build a collision-resistant object key, e.g.
/// `mapas/mapa-1736500000000-1a2b3c4d.png`.
pub fn object_key(original_name: &str, now: DateTime<Utc>) -> String {
  let ext = Path::new(original_name)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| format!(".{}", e.to_ascii_lowercase()))
    .unwrap_or_default();
  let nonce = Uuid::new_v4().simple().to_string();
  format!(
    "{MAP_KEY_PREFIX}/mapa-{}-{}{ext}",
    now.timestamp_millis(),
    &nonce[..8]
  )
}

/// Keeps blobs in memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
  base_url: String,
  objects:  Mutex<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), objects: Mutex::default() }
  }

  /// Look up a stored object by the URL `put` returned.
  pub fn get(&self, url: &str) -> Option<Bytes> {
    let key = url.strip_prefix(&self.base_url)?.trim_start_matches('/');
    self.objects.lock().ok()?.get(key).cloned()
  }

  pub fn len(&self) -> usize { self.objects.lock().map(|o| o.len()).unwrap_or(0) }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl BlobStore for MemoryBlobStore {
  type Error = Infallible;

  async fn put(&self, original_name: String, content: Bytes) -> Result<String, Infallible> {
    let key = object_key(&original_name, Utc::now());
    if let Ok(mut objects) = self.objects.lock() {
      objects.insert(key.clone(), content);
    }
    Ok(format!("{}/{key}", self.base_url.trim_end_matches('/')))
  }
}
