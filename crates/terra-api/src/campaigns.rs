//! Handlers for `/campanhas` endpoints.
//!
//! `GET /campanhas` returns each campaign with its coverage counts
//! (`trabalhados_count`, `total_territorios`, `faltam_count`).

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use terra_core::{
  Error as DomainError,
  error::require_text,
  model::{Campaign, NewCampaign},
  report::CampaignProgress,
  store::TerritoryStore,
};

use crate::{
  deleted,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

#[derive(Debug, Deserialize)]
pub struct CampaignBody {
  pub titulo:      Option<String>,
  pub data_inicio: Option<NaiveDate>,
  pub data_fim:    Option<NaiveDate>,
}

impl CampaignBody {
  fn into_input(self) -> Result<NewCampaign, ApiError> {
    require_text(self.titulo.as_deref(), "titulo")?;
    match (self.titulo, self.data_inicio, self.data_fim) {
      (Some(title), Some(start_date), Some(end_date)) => {
        Ok(NewCampaign { title, start_date, end_date })
      }
      _ => Err(DomainError::Validation("titulo, data_inicio and data_fim are required".into()).into()),
    }
  }
}

/// `GET /campanhas`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CampaignProgress>>, ApiError>
where
  S: TerritoryStore,
{
  let progress = store.campaign_progress().await.map_err(ApiError::from_store)?;
  Ok(Json(progress))
}

/// `POST /campanhas`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<CampaignBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let campaign = store
    .create_campaign(body.into_input()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(campaign)))
}

/// `PUT /campanhas/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<CampaignBody>,
) -> Result<Json<Campaign>, ApiError>
where
  S: TerritoryStore,
{
  let campaign = store
    .update_campaign(id, body.into_input()?)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("campaign {id} not found")))?;
  Ok(Json(campaign))
}

/// `DELETE /campanhas/{id}`: assignments keep their history.
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let campaign = store.delete_campaign(id).await.map_err(ApiError::from_store)?;
  Ok(deleted("Campanha deletada com sucesso.", campaign))
}
