//! `GET /dashboard/stats`.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Local;
use terra_core::{
  report::{DashboardStats, SUGGESTION_LIMIT, overdue_threshold},
  store::TerritoryStore,
};

use crate::error::ApiError;

/// Counts, overdue territories and suggestions, queried concurrently.
pub async fn stats<S>(State(store): State<Arc<S>>) -> Result<Json<DashboardStats>, ApiError>
where
  S: TerritoryStore,
{
  let threshold = overdue_threshold(Local::now().date_naive());
  let (counts, overdue_territories, assignment_suggestions) = tokio::try_join!(
    store.status_counts(),
    store.overdue_territories(threshold),
    store.assignment_suggestions(SUGGESTION_LIMIT),
  )
  .map_err(ApiError::from_store)?;

  Ok(Json(DashboardStats { counts, overdue_territories, assignment_suggestions }))
}
