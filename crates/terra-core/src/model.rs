//! Entity types: people, territories, groups, campaigns and assignments.
//!
//! Field names are English in Rust; the serde names are the wire names the
//! HTTP API has always used, so the JSON shape stays stable for clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, error::require_text};

// ─── Person ──────────────────────────────────────────────────────────────────

/// Someone who can check territories out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:    i64,
  #[serde(rename = "nome")]
  pub name:  String,
  pub email: Option<String>,
  #[serde(rename = "telefone")]
  pub phone: Option<String>,
}

/// Input to [`crate::store::TerritoryStore::create_person`] and
/// [`crate::store::TerritoryStore::update_person`].
#[derive(Debug, Clone, Default)]
pub struct NewPerson {
  pub name:  String,
  pub email: Option<String>,
  pub phone: Option<String>,
}

impl NewPerson {
  pub fn validate(&self) -> Result<()> { require_text(Some(&self.name), "nome") }
}

// ─── Territory ───────────────────────────────────────────────────────────────

/// Availability of a territory.
///
/// The value is cached on the territory row and owned by the assignment
/// lifecycle: it is `InField` exactly when an open assignment exists. The
/// string forms are the labels stored in the database and shown to users.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::EnumString,
  strum::AsRefStr,
  strum::IntoStaticStr,
  strum::Display,
)]
pub enum TerritoryStatus {
  #[default]
  #[serde(rename = "Disponível", alias = "available")]
  #[strum(to_string = "Disponível", serialize = "available")]
  Available,
  #[serde(rename = "Em campo", alias = "in_field")]
  #[strum(to_string = "Em campo", serialize = "in_field")]
  InField,
}

/// A unit of geographic assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
  pub id:          i64,
  /// Stored as text but numerically sortable (e.g. `"12"`).
  #[serde(rename = "numero")]
  pub number:      String,
  #[serde(rename = "descricao")]
  pub description: Option<String>,
  #[serde(rename = "url_imagem")]
  pub image_url:   Option<String>,
  #[serde(rename = "tipo")]
  pub kind:        Option<String>,
  #[serde(rename = "observacoes")]
  pub notes:       Option<String>,
  pub status:      TerritoryStatus,
  #[serde(rename = "grupo_id")]
  pub group_id:    Option<i64>,
}

/// Input to [`crate::store::TerritoryStore::create_territory`]. New
/// territories always start [`TerritoryStatus::Available`].
#[derive(Debug, Clone, Default)]
pub struct NewTerritory {
  pub number:      String,
  pub description: String,
  pub image_url:   Option<String>,
  pub kind:        Option<String>,
  pub notes:       Option<String>,
}

impl NewTerritory {
  pub fn validate(&self) -> Result<()> {
    require_text(Some(&self.number), "numero")?;
    require_text(Some(&self.description), "descricao")
  }
}

/// Metadata edit; status and image are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct TerritoryUpdate {
  pub number:      String,
  pub description: Option<String>,
  pub kind:        Option<String>,
  pub notes:       Option<String>,
}

impl TerritoryUpdate {
  pub fn validate(&self) -> Result<()> { require_text(Some(&self.number), "numero") }
}

// ─── Group ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub id:   i64,
  #[serde(rename = "nome")]
  pub name: String,
}

/// A group together with the ids of its member territories, in numeric
/// territory-number order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
  pub id:            i64,
  #[serde(rename = "nome")]
  pub name:          String,
  #[serde(rename = "territorio_ids")]
  pub territory_ids: Vec<i64>,
}

pub fn validate_group_name(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::Validation("the group name must not be empty".into()));
  }
  Ok(())
}

// ─── Campaign ────────────────────────────────────────────────────────────────

/// A time-boxed effort against which territory coverage is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
  pub id:         i64,
  #[serde(rename = "titulo")]
  pub title:      String,
  #[serde(rename = "data_inicio")]
  pub start_date: NaiveDate,
  #[serde(rename = "data_fim")]
  pub end_date:   NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
  pub title:      String,
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
}

impl NewCampaign {
  pub fn validate(&self) -> Result<()> { require_text(Some(&self.title), "titulo") }
}

// ─── Assignment ──────────────────────────────────────────────────────────────

/// One person holding one territory for an interval.
///
/// An assignment without a `return_date` is the open assignment of its
/// territory; at most one exists per territory. Closed rows are never
/// modified again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub id:            i64,
  #[serde(rename = "territorio_id")]
  pub territory_id:  i64,
  #[serde(rename = "pessoa_id")]
  pub person_id:     i64,
  #[serde(rename = "campanha_id")]
  pub campaign_id:   Option<i64>,
  #[serde(rename = "data_saida")]
  pub checkout_date: NaiveDate,
  #[serde(rename = "data_devolucao")]
  pub return_date:   Option<NaiveDate>,
}

impl Assignment {
  pub fn is_open(&self) -> bool { self.return_date.is_none() }
}

/// Input to [`crate::store::TerritoryStore::assign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAssignment {
  pub territory_id:  i64,
  pub person_id:     i64,
  pub checkout_date: NaiveDate,
  pub campaign_id:   Option<i64>,
}
