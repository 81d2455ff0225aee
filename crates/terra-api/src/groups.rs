//! Handlers for `/grupos` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/grupos` | Each group with its `territorio_ids` |
//! | `POST`   | `/grupos` | Body: `{"nome"}`; 400 on a duplicate name |
//! | `PUT`    | `/grupos/{id}` | Rename |
//! | `DELETE` | `/grupos/{id}` | Members are detached first |
//! | `PUT`    | `/grupos/{id}/associar-territorios` | Body: `{"territorio_ids": [..]}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use terra_core::{
  model::{Group, GroupSummary},
  store::TerritoryStore,
};

use crate::{
  deleted,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

#[derive(Debug, Deserialize)]
pub struct GroupBody {
  pub nome: Option<String>,
}

/// `GET /grupos`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<GroupSummary>>, ApiError>
where
  S: TerritoryStore,
{
  let groups = store.list_groups().await.map_err(ApiError::from_store)?;
  Ok(Json(groups))
}

/// `POST /grupos`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<GroupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let group = store
    .create_group(body.nome.unwrap_or_default())
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `PUT /grupos/{id}`
pub async fn rename<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<GroupBody>,
) -> Result<Json<Group>, ApiError>
where
  S: TerritoryStore,
{
  let group = store
    .rename_group(id, body.nome.unwrap_or_default())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(group))
}

/// `DELETE /grupos/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let group = store.delete_group(id).await.map_err(ApiError::from_store)?;
  Ok(deleted("Grupo deletado com sucesso.", group))
}

#[derive(Debug, Deserialize)]
pub struct AssociateBody {
  #[serde(default)]
  pub territorio_ids: Vec<i64>,
}

/// `PUT /grupos/{id}/associar-territorios`: replaces the membership.
pub async fn associate<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<AssociateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  store
    .set_group_territories(id, body.territorio_ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": "Grupo atualizado com sucesso." })))
}
