//! Handlers for `/territorios` endpoints and the full history.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/territorios` | `?status`, `?search`, `?sort`, `?nao_trabalhado_na_campanha` |
//! | `POST`   | `/territorios` | `multipart/form-data`; optional `imagem` file |
//! | `GET`    | `/territorios/export` | CSV attachment |
//! | `PUT`    | `/territorios/{id}` | Metadata only |
//! | `DELETE` | `/territorios/{id}` | 400 while in the field |
//! | `GET`    | `/historico-completo` | Every territory with its assignments |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use chrono::Local;
use serde::Deserialize;
use terra_core::{
  blob::BlobStore,
  error::require_text,
  export::{CSV_CONTENT_TYPE, export_filename, render_csv},
  model::{NewTerritory, Territory, TerritoryStatus, TerritoryUpdate},
  report::{TerritoryFilter, TerritoryHistory, TerritoryRow, TerritorySort},
  store::TerritoryStore,
};

use crate::{
  ApiState, deleted,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

/// Multipart file field carrying the map image.
const IMAGE_FIELD: &str = "imagem";

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// Query parameters arrive as raw strings so that empty values from HTML
/// forms mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub status:                     Option<String>,
  pub search:                     Option<String>,
  pub sort:                       Option<String>,
  pub nao_trabalhado_na_campanha: Option<String>,
}

impl ListParams {
  fn into_filter(self) -> Result<TerritoryFilter, ApiError> {
    let status = non_empty(self.status)
      .map(|s| {
        s.parse::<TerritoryStatus>()
          .map_err(|_| ApiError::BadRequest(format!("unknown status {s:?}")))
      })
      .transpose()?;
    let not_worked_in_campaign = non_empty(self.nao_trabalhado_na_campanha)
      .map(|c| {
        c.trim()
          .parse::<i64>()
          .map_err(|_| ApiError::BadRequest(format!("invalid campaign id {c:?}")))
      })
      .transpose()?;
    Ok(TerritoryFilter {
      status,
      search: non_empty(self.search),
      not_worked_in_campaign,
      sort: TerritorySort::from_param(self.sort.as_deref()),
    })
  }
}

/// `GET /territorios`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<TerritoryRow>>, ApiError>
where
  S: TerritoryStore,
{
  let filter = params.into_filter()?;
  let rows = store
    .list_territories(&filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct TerritoryForm {
  number:      Option<String>,
  description: Option<String>,
  kind:        Option<String>,
  notes:       Option<String>,
  image:       Option<(String, Bytes)>,
}

async fn read_form(mut multipart: Multipart) -> Result<TerritoryForm, ApiError> {
  let bad_form = |e: axum::extract::multipart::MultipartError| ApiError::BadRequest(e.to_string());

  let mut form = TerritoryForm::default();
  while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
    let name = field.name().unwrap_or_default().to_owned();
    if name == IMAGE_FIELD {
      let file_name = field.file_name().unwrap_or_default().to_owned();
      let content = field.bytes().await.map_err(bad_form)?;
      // Browsers send an empty part when no file was picked.
      if !content.is_empty() {
        form.image = Some((file_name, content));
      }
      continue;
    }
    let text = field.text().await.map_err(bad_form)?;
    match name.as_str() {
      "numero" => form.number = Some(text),
      "descricao" => form.description = Some(text),
      "tipo" => form.kind = Some(text),
      "observacoes" => form.notes = Some(text),
      _ => {}
    }
  }
  Ok(form)
}

/// `POST /territorios` as `multipart/form-data`.
pub async fn create<S, B>(
  State(state): State<ApiState<S, B>>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
  B: BlobStore,
{
  let form = read_form(multipart).await?;
  require_text(form.number.as_deref(), "numero")?;
  require_text(form.description.as_deref(), "descricao")?;

  let image_url = match form.image {
    Some((file_name, content)) => {
      let url = state
        .blobs
        .put(file_name, content)
        .await
        .map_err(ApiError::internal)?;
      tracing::debug!(%url, "stored map image");
      Some(url)
    }
    None => None,
  };

  let territory = state
    .store
    .create_territory(NewTerritory {
      number: form.number.unwrap_or_default(),
      description: form.description.unwrap_or_default(),
      image_url,
      kind: non_empty(form.kind),
      notes: non_empty(form.notes),
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(territory)))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TerritoryBody {
  pub numero:      Option<String>,
  pub descricao:   Option<String>,
  pub tipo:        Option<String>,
  pub observacoes: Option<String>,
}

/// `PUT /territorios/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<TerritoryBody>,
) -> Result<Json<Territory>, ApiError>
where
  S: TerritoryStore,
{
  require_text(body.numero.as_deref(), "numero")?;
  let input = TerritoryUpdate {
    number:      body.numero.unwrap_or_default(),
    description: body.descricao,
    kind:        body.tipo,
    notes:       body.observacoes,
  };
  let territory = store
    .update_territory(id, input)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("territory {id} not found")))?;
  Ok(Json(territory))
}

/// `DELETE /territorios/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let territory = store
    .delete_territory(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(deleted("Território deletado com sucesso.", territory))
}

// ─── Reports ──────────────────────────────────────────────────────────────────

/// `GET /territorios/export`: every territory, by number, as a CSV file.
pub async fn export<S>(State(store): State<Arc<S>>) -> Result<impl IntoResponse, ApiError>
where
  S: TerritoryStore,
{
  let filter = TerritoryFilter::default();
  let rows = store
    .list_territories(&filter)
    .await
    .map_err(ApiError::from_store)?;
  let filename = export_filename(Local::now().date_naive());
  Ok((
    [
      (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ],
    render_csv(&rows),
  ))
}

/// `GET /historico-completo`
pub async fn history<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<TerritoryHistory>>, ApiError>
where
  S: TerritoryStore,
{
  let history = store
    .territory_history()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(history))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_params_mean_no_filter() {
    let params = ListParams {
      status: Some(String::new()),
      search: Some(" ".into()),
      sort: Some("bogus".into()),
      nao_trabalhado_na_campanha: Some(String::new()),
    };
    let filter = params.into_filter().unwrap();
    assert!(filter.status.is_none());
    assert!(filter.search.is_none());
    assert!(filter.not_worked_in_campaign.is_none());
    assert_eq!(filter.sort, TerritorySort::NumberAsc);
  }

  #[test]
  fn status_accepts_label_and_rejects_garbage() {
    let params = ListParams { status: Some("Em campo".into()), ..Default::default() };
    assert_eq!(params.into_filter().unwrap().status, Some(TerritoryStatus::InField));

    let params = ListParams { status: Some("lost".into()), ..Default::default() };
    assert!(matches!(params.into_filter(), Err(ApiError::BadRequest(_))));

    let params =
      ListParams { nao_trabalhado_na_campanha: Some("x".into()), ..Default::default() };
    assert!(matches!(params.into_filter(), Err(ApiError::BadRequest(_))));
  }
}
