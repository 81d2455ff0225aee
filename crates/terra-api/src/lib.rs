//! JSON REST API for the territory assignment tracker.
//!
//! Exposes an axum [`Router`] backed by any [`TerritoryStore`] and
//! [`BlobStore`]. CORS, static file serving and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = terra_api::api_router(Arc::new(store), Arc::new(blobs));
//! ```

pub mod assignments;
pub mod campaigns;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod groups;
pub mod people;
pub mod territories;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::FromRef,
  routing::{get, post, put},
};
use serde_json::{Value, json};
use terra_core::{blob::BlobStore, store::TerritoryStore};

pub use error::ApiError;

/// Shared handler state. Handlers that only need the store extract
/// `State<Arc<S>>` directly.
pub struct ApiState<S, B> {
  pub store: Arc<S>,
  pub blobs: Arc<B>,
}

impl<S, B> Clone for ApiState<S, B> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), blobs: Arc::clone(&self.blobs) }
  }
}

impl<S, B> FromRef<ApiState<S, B>> for Arc<S> {
  fn from_ref(state: &ApiState<S, B>) -> Self { Arc::clone(&state.store) }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(store: Arc<S>, blobs: Arc<B>) -> Router<()>
where
  S: TerritoryStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    .route("/", get(root))
    // People
    .route("/pessoas", get(people::list::<S>).post(people::create::<S>))
    .route("/pessoas/{id}", put(people::update::<S>).delete(people::delete::<S>))
    // Territories
    .route(
      "/territorios",
      get(territories::list::<S>).post(territories::create::<S, B>),
    )
    .route("/territorios/export", get(territories::export::<S>))
    .route(
      "/territorios/{id}",
      put(territories::update::<S>).delete(territories::delete::<S>),
    )
    .route("/historico-completo", get(territories::history::<S>))
    // Assignment lifecycle
    .route("/designacoes", post(assignments::assign::<S>))
    .route("/designacoes/devolver", put(assignments::return_territory::<S>))
    // Reporting
    .route("/dashboard/stats", get(dashboard::stats::<S>))
    // Groups
    .route("/grupos", get(groups::list::<S>).post(groups::create::<S>))
    .route("/grupos/{id}", put(groups::rename::<S>).delete(groups::delete::<S>))
    .route("/grupos/{id}/associar-territorios", put(groups::associate::<S>))
    // Campaigns
    .route("/campanhas", get(campaigns::list::<S>).post(campaigns::create::<S>))
    .route(
      "/campanhas/{id}",
      put(campaigns::update::<S>).delete(campaigns::delete::<S>),
    )
    .with_state(ApiState { store, blobs })
}

/// `GET /`: liveness message.
async fn root() -> Json<Value> {
  Json(json!({ "message": "API do Gerenciador de Territórios está no ar!" }))
}

/// The `{message, data}` envelope returned by delete endpoints.
pub(crate) fn deleted<T: serde::Serialize>(message: &str, data: T) -> Json<Value> {
  Json(json!({ "message": message, "data": data }))
}

#[cfg(test)]
mod tests;
