//! [`FsBlobStore`]: map images on the local filesystem.

use std::{io, path::PathBuf};

use bytes::Bytes;
use chrono::Utc;
use terra_core::blob::{BlobStore, object_key};

/// Writes each upload to `<root>/<key>` and hands back
/// `<public_base_url>/uploads/<key>`, which the server's static `/uploads`
/// route resolves.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root:     PathBuf,
  base_url: String,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
    Self {
      root:     root.into(),
      base_url: format!("{}/uploads", public_base_url.trim_end_matches('/')),
    }
  }
}

impl BlobStore for FsBlobStore {
  type Error = io::Error;

  async fn put(&self, original_name: String, content: Bytes) -> io::Result<String> {
    let key = object_key(&original_name, Utc::now());
    let path = self.root.join(&key);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &content).await?;
    tracing::info!(%key, bytes = content.len(), "stored upload");
    Ok(format!("{}/{key}", self.base_url))
  }
}
