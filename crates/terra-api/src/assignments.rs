//! Handlers for the assignment lifecycle under `/designacoes`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/designacoes` | Body: [`AssignBody`]; 201, or 400 if not available |
//! | `PUT`  | `/designacoes/devolver` | Body: [`ReturnBody`]; 404 if nothing is open |

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
  model::{Assignment, NewAssignment},
  store::TerritoryStore,
};

use crate::{error::ApiError, extract::ApiJson};

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
  value.ok_or_else(|| DomainError::Validation(format!("the field `{field}` is required")).into())
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub territorio_id: Option<i64>,
  pub pessoa_id:     Option<i64>,
  pub data_saida:    Option<NaiveDate>,
  pub campanha_id:   Option<i64>,
}

/// `POST /designacoes`
pub async fn assign<S>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<AssignBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let input = NewAssignment {
    territory_id:  required(body.territorio_id, "territorio_id")?,
    person_id:     required(body.pessoa_id, "pessoa_id")?,
    checkout_date: required(body.data_saida, "data_saida")?,
    campaign_id:   body.campanha_id,
  };
  let assignment = store.assign(input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

#[derive(Debug, Deserialize)]
pub struct ReturnBody {
  pub territorio_id:  Option<i64>,
  pub data_devolucao: Option<NaiveDate>,
}

/// `PUT /designacoes/devolver`
pub async fn return_territory<S>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<ReturnBody>,
) -> Result<Json<Assignment>, ApiError>
where
  S: TerritoryStore,
{
  let territory_id = required(body.territorio_id, "territorio_id")?;
  let return_date = required(body.data_devolucao, "data_devolucao")?;
  let assignment = store
    .return_territory(territory_id, return_date)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(assignment))
}
