//! Handlers for `/pessoas` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/pessoas` | Ordered by name |
//! | `POST`   | `/pessoas` | Body: `{"nome", "email"?, "telefone"?}` |
//! | `PUT`    | `/pessoas/{id}` | Same body; 404 if absent |
//! | `DELETE` | `/pessoas/{id}` | 400 while holding a territory |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use terra_core::{
  error::require_text,
  model::{NewPerson, Person},
  store::TerritoryStore,
};
use serde::Deserialize;

use crate::{
  deleted,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

#[derive(Debug, Deserialize)]
pub struct PersonBody {
  #[serde(rename = "nome")]
  pub name:  Option<String>,
  pub email: Option<String>,
  #[serde(rename = "telefone")]
  pub phone: Option<String>,
}

impl PersonBody {
  fn into_input(self) -> Result<NewPerson, ApiError> {
    require_text(self.name.as_deref(), "nome")?;
    Ok(NewPerson {
      name:  self.name.unwrap_or_default(),
      email: self.email,
      phone: self.phone,
    })
  }
}

/// `GET /pessoas`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Person>>, ApiError>
where
  S: TerritoryStore,
{
  let people = store.list_people().await.map_err(ApiError::from_store)?;
  Ok(Json(people))
}

/// `POST /pessoas`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<PersonBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let person = store
    .create_person(body.into_input()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `PUT /pessoas/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<PersonBody>,
) -> Result<Json<Person>, ApiError>
where
  S: TerritoryStore,
{
  let person = store
    .update_person(id, body.into_input()?)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

/// `DELETE /pessoas/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let person = store.delete_person(id).await.map_err(ApiError::from_store)?;
  Ok(deleted("Pessoa deletada com sucesso.", person))
}
