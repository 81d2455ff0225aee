//! Read models for the reporting layer: the enriched territory list, full
//! history, dashboard statistics and campaign progress.
//!
//! Nothing here mutates state. Backends produce these rows; the few pieces
//! of arithmetic and grouping that do not belong in a query live here so
//! every backend shares them.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Campaign, Territory, TerritoryStatus};

/// How long a territory may stay in the field before it counts as overdue.
pub const OVERDUE_MONTHS: u32 = 4;

/// Number of territories proposed by the dashboard for the next assignment.
pub const SUGGESTION_LIMIT: usize = 5;

// ─── Territory list ──────────────────────────────────────────────────────────

/// Ordering for [`crate::store::TerritoryStore::list_territories`]. The
/// modes are exclusive.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::AsRefStr,
)]
pub enum TerritorySort {
  /// Numeric territory number, ascending.
  #[default]
  #[strum(serialize = "numero_asc")]
  NumberAsc,
  /// Most recent return first; never-returned last, ties by number.
  #[strum(serialize = "devolucao_desc")]
  LastReturnDesc,
  #[strum(serialize = "descricao_asc")]
  DescriptionAsc,
}

impl TerritorySort {
  /// Parse a query-string value; anything unrecognised falls back to the
  /// default ordering.
  pub fn from_param(param: Option<&str>) -> Self {
    param.and_then(|p| p.parse().ok()).unwrap_or_default()
  }
}

/// Filters for the territory list. All set filters must match.
#[derive(Debug, Clone, Default)]
pub struct TerritoryFilter {
  pub status:                 Option<TerritoryStatus>,
  /// Case-insensitive substring over number and description.
  pub search:                 Option<String>,
  /// Keep only territories with no assignment at all under this campaign.
  pub not_worked_in_campaign: Option<i64>,
  pub sort:                   TerritorySort,
}

/// A territory enriched with its current holder and history summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryRow {
  #[serde(flatten)]
  pub territory:        Territory,
  /// Holder of the open assignment, if any.
  #[serde(rename = "pessoa_nome")]
  pub holder_name:      Option<String>,
  /// Checkout date of the open assignment, if any.
  #[serde(rename = "data_saida")]
  pub checkout_date:    Option<NaiveDate>,
  #[serde(rename = "grupo_nome")]
  pub group_name:       Option<String>,
  /// Campaign of the open assignment, if any.
  #[serde(rename = "campanha_titulo")]
  pub campaign_title:   Option<String>,
  /// Latest return date over every assignment the territory ever had.
  #[serde(rename = "ultima_devolucao")]
  pub last_return_date: Option<NaiveDate>,
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  #[serde(rename = "pessoa_nome")]
  pub person_name:    String,
  #[serde(rename = "data_saida")]
  pub checkout_date:  NaiveDate,
  #[serde(rename = "data_devolucao")]
  pub return_date:    Option<NaiveDate>,
  #[serde(rename = "campanha_titulo")]
  pub campaign_title: Option<String>,
}

/// Every assignment a territory has had, newest checkout first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryHistory {
  pub id:          i64,
  #[serde(rename = "numero")]
  pub number:      String,
  #[serde(rename = "descricao")]
  pub description: Option<String>,
  #[serde(rename = "historico")]
  pub history:     Vec<HistoryEntry>,
}

/// One row of the territory ⟕ assignment join. `entry` is `None` for a
/// territory that was never assigned.
#[derive(Debug, Clone)]
pub struct HistoryRow {
  pub territory_id: i64,
  pub number:       String,
  pub description:  Option<String>,
  pub entry:        Option<HistoryEntry>,
}

/// Fold joined rows into one [`TerritoryHistory`] per territory.
///
/// Rows must arrive grouped by territory. Territories and entries keep row
/// order, so the caller's `ORDER BY` decides both.
pub fn group_history(rows: impl IntoIterator<Item = HistoryRow>) -> Vec<TerritoryHistory> {
  let mut out: Vec<TerritoryHistory> = Vec::new();
  for row in rows {
    let same = out.last().is_some_and(|last| last.id == row.territory_id);
    if !same {
      out.push(TerritoryHistory {
        id:          row.territory_id,
        number:      row.number,
        description: row.description,
        history:     Vec::new(),
      });
    }
    if let (Some(entry), Some(current)) = (row.entry, out.last_mut()) {
      current.history.push(entry);
    }
  }
  out
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
  pub total:     i64,
  #[serde(rename = "em_campo")]
  pub in_field:  i64,
  #[serde(rename = "disponivel")]
  pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueTerritory {
  #[serde(rename = "id")]
  pub territory_id:  i64,
  #[serde(rename = "numero")]
  pub number:        String,
  #[serde(rename = "pessoa_nome")]
  pub holder_name:   String,
  #[serde(rename = "data_saida")]
  pub checkout_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSuggestion {
  #[serde(rename = "id")]
  pub territory_id:     i64,
  #[serde(rename = "numero")]
  pub number:           String,
  #[serde(rename = "ultima_devolucao")]
  pub last_return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub counts:                 StatusCounts,
  pub overdue_territories:    Vec<OverdueTerritory>,
  pub assignment_suggestions: Vec<AssignmentSuggestion>,
}

/// Checkouts on or before this date are overdue as of `today`.
pub fn overdue_threshold(today: NaiveDate) -> NaiveDate {
  today
    .checked_sub_months(Months::new(OVERDUE_MONTHS))
    .unwrap_or(NaiveDate::MIN)
}

pub fn is_overdue(checkout_date: NaiveDate, today: NaiveDate) -> bool {
  checkout_date <= overdue_threshold(today)
}

// ─── Campaign progress ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignProgress {
  #[serde(flatten)]
  pub campaign:  Campaign,
  /// Distinct territories with at least one assignment under the campaign.
  #[serde(rename = "trabalhados_count")]
  pub worked:    i64,
  #[serde(rename = "total_territorios")]
  pub total:     i64,
  #[serde(rename = "faltam_count")]
  pub remaining: i64,
}

impl CampaignProgress {
  pub fn new(campaign: Campaign, worked: i64, total: i64) -> Self {
    Self { campaign, worked, total, remaining: (total - worked).max(0) }
  }
}

// ─── Consistency ─────────────────────────────────────────────────────────────

/// A territory whose cached status disagrees with its assignment rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyIssue {
  pub territory_id:     i64,
  pub status:           TerritoryStatus,
  pub open_assignments: i64,
}

/// `InField` iff exactly one open assignment; never more than one.
pub fn status_consistent(status: TerritoryStatus, open_assignments: i64) -> bool {
  match status {
    TerritoryStatus::InField => open_assignments == 1,
    TerritoryStatus::Available => open_assignments == 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn entry(name: &str, out: NaiveDate) -> HistoryEntry {
    HistoryEntry {
      person_name:    name.into(),
      checkout_date:  out,
      return_date:    None,
      campaign_title: None,
    }
  }

  #[test]
  fn unknown_sort_falls_back_to_number() {
    assert_eq!(TerritorySort::from_param(Some("devolucao_desc")), TerritorySort::LastReturnDesc);
    assert_eq!(TerritorySort::from_param(Some("descricao_asc")), TerritorySort::DescriptionAsc);
    assert_eq!(TerritorySort::from_param(Some("bogus")), TerritorySort::NumberAsc);
    assert_eq!(TerritorySort::from_param(None), TerritorySort::NumberAsc);
  }

  #[test]
  fn overdue_threshold_is_four_calendar_months() {
    assert_eq!(overdue_threshold(date(2025, 9, 9)), date(2025, 5, 9));
    // Month-end clamps rather than overflowing.
    assert_eq!(overdue_threshold(date(2025, 6, 30)), date(2025, 2, 28));
    assert!(is_overdue(date(2025, 5, 9), date(2025, 9, 9)));
    assert!(!is_overdue(date(2025, 8, 9), date(2025, 9, 9)));
  }

  #[test]
  fn group_history_keeps_unassigned_territories() {
    let rows = vec![
      HistoryRow {
        territory_id: 1,
        number:       "1".into(),
        description:  None,
        entry:        Some(entry("Maria", date(2025, 2, 1))),
      },
      HistoryRow {
        territory_id: 1,
        number:       "1".into(),
        description:  None,
        entry:        Some(entry("João", date(2025, 1, 1))),
      },
      HistoryRow { territory_id: 2, number: "2".into(), description: None, entry: None },
    ];

    let grouped = group_history(rows);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].history.len(), 2);
    assert_eq!(grouped[0].history[0].person_name, "Maria");
    assert!(grouped[1].history.is_empty());
  }

  #[test]
  fn campaign_remaining_is_total_minus_worked() {
    let c = Campaign {
      id:         1,
      title:      "Especial".into(),
      start_date: date(2025, 3, 1),
      end_date:   date(2025, 3, 31),
    };
    let p = CampaignProgress::new(c, 3, 10);
    assert_eq!(p.remaining, 7);
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["titulo"], "Especial");
    assert_eq!(json["faltam_count"], 7);
  }

  #[test]
  fn consistency_rule() {
    assert!(status_consistent(TerritoryStatus::Available, 0));
    assert!(status_consistent(TerritoryStatus::InField, 1));
    assert!(!status_consistent(TerritoryStatus::InField, 0));
    assert!(!status_consistent(TerritoryStatus::Available, 1));
    assert!(!status_consistent(TerritoryStatus::InField, 2));
  }
}
