//! HTTP server assembly for the territory assignment tracker.
//!
//! Wraps the [`terra_api`] router with the transport concerns the API leaves
//! to its caller: request tracing, the CORS allow-list, the upload body
//! limit and static serving of uploaded map images.

pub mod blob;

pub use blob::FsBlobStore;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::{HeaderValue, Method, header},
};
use serde::Deserialize;
use terra_core::{blob::BlobStore, store::TerritoryStore};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  services::ServeDir,
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TERRA_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub database_path:    PathBuf,
  pub upload_dir:       PathBuf,
  pub public_base_url:  String,
  pub allowed_origins:  Vec<String>,
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "0.0.0.0".to_owned(),
      port:             3001,
      database_path:    PathBuf::from("territorios.db"),
      upload_dir:       PathBuf::from("uploads"),
      public_base_url:  "http://localhost:3001".to_owned(),
      allowed_origins:  vec!["http://localhost:5173".to_owned()],
      max_upload_bytes: 10 * 1024 * 1024,
    }
  }
}

/// Load configuration from `file` (optional) overlaid with `TERRA_*`
/// environment variables, expanding `~/` in paths.
pub fn load_config(file: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(file).required(false))
    .add_source(
      config::Environment::with_prefix("TERRA")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("allowed_origins"),
    )
    .build()
    .context("failed to read config file")?;

  let mut cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  cfg.database_path = expand_tilde(&cfg.database_path);
  cfg.upload_dir = expand_tilde(&cfg.upload_dir);
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// CORS for the configured browser origins only.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let origins = origins
    .iter()
    .map(|o| {
      o.parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin {o:?}"))
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
      .allow_headers([header::CONTENT_TYPE]),
  )
}

/// Build the complete application router.
pub fn app<S, B>(store: Arc<S>, blobs: Arc<B>, config: &ServerConfig) -> anyhow::Result<Router>
where
  S: TerritoryStore + 'static,
  B: BlobStore + 'static,
{
  Ok(
    terra_api::api_router(store, blobs)
      .nest_service("/uploads", ServeDir::new(&config.upload_dir))
      .layer(DefaultBodyLimit::max(config.max_upload_bytes))
      .layer(cors_layer(&config.allowed_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use bytes::Bytes;
  use terra_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("terra-server-{}", uuid::Uuid::new_v4()))
  }

  async fn test_app(upload_dir: &Path) -> (Router, Arc<FsBlobStore>) {
    let config = ServerConfig { upload_dir: upload_dir.to_path_buf(), ..Default::default() };
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let blobs = Arc::new(FsBlobStore::new(upload_dir, &config.public_base_url));
    (app(store, Arc::clone(&blobs), &config).unwrap(), blobs)
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = load_config(&scratch_dir().join("absent.toml")).unwrap();
    assert_eq!(cfg.port, 3001);
    assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
    assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
  }

  #[test]
  fn file_overrides_defaults() {
    let dir = scratch_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("config.toml");
    std::fs::write(
      &file,
      "port = 8080\ndatabase_path = \"~/terra.db\"\nallowed_origins = [\"https://a.test\"]\n",
    )
    .unwrap();

    let cfg = load_config(&file).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.allowed_origins, vec!["https://a.test".to_owned()]);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(cfg.database_path, PathBuf::from(home).join("terra.db"));
    }
    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn invalid_origin_is_rejected() {
    assert!(cors_layer(&["http://ok.test".to_owned()]).is_ok());
    assert!(cors_layer(&["bad\norigin".to_owned()]).is_err());
  }

  #[tokio::test]
  async fn allowed_origin_gets_cors_headers() {
    let dir = scratch_dir();
    let (router, _) = test_app(&dir).await;
    let req = Request::builder()
      .uri("/")
      .header(header::ORIGIN, "http://localhost:5173")
      .body(Body::empty())
      .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "http://localhost:5173"
    );
  }

  #[tokio::test]
  async fn uploaded_images_are_served() {
    let dir = scratch_dir();
    let (router, blobs) = test_app(&dir).await;
    let url = blobs
      .put("mapa.png".into(), Bytes::from_static(b"png bytes"))
      .await
      .unwrap();
    let path = url.strip_prefix("http://localhost:3001").unwrap();

    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"png bytes");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
  }
}
