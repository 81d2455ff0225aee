//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, which sorts and compares
//! correctly as text. Territory status is stored as its display label.

use chrono::NaiveDate;
use terra_core::{
  model::{Assignment, Campaign, Person, Territory, TerritoryStatus},
  report::{
    AssignmentSuggestion, HistoryEntry, HistoryRow, OverdueTerritory, TerritoryRow,
  },
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: TerritoryStatus) -> &'static str { s.into() }

pub fn decode_status(s: &str) -> Result<TerritoryStatus> {
  s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Case folding shared by the `fold()` SQL function and search input.
pub fn fold(text: &str) -> String { text.to_lowercase() }

/// Wrap free text in a `LIKE` pattern, escaping its wildcards with `\`.
pub fn like_pattern(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() + 2);
  escaped.push('%');
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawTerritory::from_row`], for a `territories t`
/// alias.
pub const TERRITORY_COLUMNS: &str =
  "t.id, t.number, t.description, t.image_url, t.kind, t.notes, t.status, t.group_id";

pub const ASSIGNMENT_COLUMNS: &str =
  "id, territory_id, person_id, campaign_id, checkout_date, return_date";

pub const CAMPAIGN_COLUMNS: &str = "id, title, start_date, end_date";

pub fn read_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
  Ok(Person {
    id:    row.get(0)?,
    name:  row.get(1)?,
    email: row.get(2)?,
    phone: row.get(3)?,
  })
}

/// Raw values read from a `territories` row.
pub struct RawTerritory {
  pub id:          i64,
  pub number:      String,
  pub description: Option<String>,
  pub image_url:   Option<String>,
  pub kind:        Option<String>,
  pub notes:       Option<String>,
  pub status:      String,
  pub group_id:    Option<i64>,
}

impl RawTerritory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      number:      row.get(1)?,
      description: row.get(2)?,
      image_url:   row.get(3)?,
      kind:        row.get(4)?,
      notes:       row.get(5)?,
      status:      row.get(6)?,
      group_id:    row.get(7)?,
    })
  }

  pub fn into_territory(self) -> Result<Territory> {
    Ok(Territory {
      id:          self.id,
      number:      self.number,
      description: self.description,
      image_url:   self.image_url,
      kind:        self.kind,
      notes:       self.notes,
      status:      decode_status(&self.status)?,
      group_id:    self.group_id,
    })
  }
}

/// A territory plus the enrichment columns of the list query.
pub struct RawTerritoryRow {
  pub territory:        RawTerritory,
  pub holder_name:      Option<String>,
  pub checkout_date:    Option<String>,
  pub group_name:       Option<String>,
  pub campaign_title:   Option<String>,
  pub last_return_date: Option<String>,
}

impl RawTerritoryRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      territory:        RawTerritory::from_row(row)?,
      holder_name:      row.get(8)?,
      checkout_date:    row.get(9)?,
      group_name:       row.get(10)?,
      campaign_title:   row.get(11)?,
      last_return_date: row.get(12)?,
    })
  }

  pub fn into_row(self) -> Result<TerritoryRow> {
    Ok(TerritoryRow {
      territory:        self.territory.into_territory()?,
      holder_name:      self.holder_name,
      checkout_date:    decode_opt_date(self.checkout_date.as_deref())?,
      group_name:       self.group_name,
      campaign_title:   self.campaign_title,
      last_return_date: decode_opt_date(self.last_return_date.as_deref())?,
    })
  }
}

pub struct RawAssignment {
  pub id:            i64,
  pub territory_id:  i64,
  pub person_id:     i64,
  pub campaign_id:   Option<i64>,
  pub checkout_date: String,
  pub return_date:   Option<String>,
}

impl RawAssignment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      territory_id:  row.get(1)?,
      person_id:     row.get(2)?,
      campaign_id:   row.get(3)?,
      checkout_date: row.get(4)?,
      return_date:   row.get(5)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      id:            self.id,
      territory_id:  self.territory_id,
      person_id:     self.person_id,
      campaign_id:   self.campaign_id,
      checkout_date: decode_date(&self.checkout_date)?,
      return_date:   decode_opt_date(self.return_date.as_deref())?,
    })
  }
}

pub struct RawCampaign {
  pub id:         i64,
  pub title:      String,
  pub start_date: String,
  pub end_date:   String,
}

impl RawCampaign {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      title:      row.get(1)?,
      start_date: row.get(2)?,
      end_date:   row.get(3)?,
    })
  }

  pub fn into_campaign(self) -> Result<Campaign> {
    Ok(Campaign {
      id:         self.id,
      title:      self.title,
      start_date: decode_date(&self.start_date)?,
      end_date:   decode_date(&self.end_date)?,
    })
  }
}

/// One row of the territory ⟕ assignment history join.
pub struct RawHistoryRow {
  pub territory_id:   i64,
  pub number:         String,
  pub description:    Option<String>,
  pub assignment_id:  Option<i64>,
  pub person_name:    Option<String>,
  pub checkout_date:  Option<String>,
  pub return_date:    Option<String>,
  pub campaign_title: Option<String>,
}

impl RawHistoryRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      territory_id:   row.get(0)?,
      number:         row.get(1)?,
      description:    row.get(2)?,
      assignment_id:  row.get(3)?,
      person_name:    row.get(4)?,
      checkout_date:  row.get(5)?,
      return_date:    row.get(6)?,
      campaign_title: row.get(7)?,
    })
  }

  pub fn into_history_row(self) -> Result<HistoryRow> {
    let entry = match (self.assignment_id, self.checkout_date) {
      (Some(_), Some(checkout)) => Some(HistoryEntry {
        person_name:    self.person_name.unwrap_or_default(),
        checkout_date:  decode_date(&checkout)?,
        return_date:    decode_opt_date(self.return_date.as_deref())?,
        campaign_title: self.campaign_title,
      }),
      _ => None,
    };
    Ok(HistoryRow {
      territory_id: self.territory_id,
      number: self.number,
      description: self.description,
      entry,
    })
  }
}

pub struct RawOverdue {
  pub territory_id:  i64,
  pub number:        String,
  pub holder_name:   String,
  pub checkout_date: String,
}

impl RawOverdue {
  pub fn into_overdue(self) -> Result<OverdueTerritory> {
    Ok(OverdueTerritory {
      territory_id:  self.territory_id,
      number:        self.number,
      holder_name:   self.holder_name,
      checkout_date: decode_date(&self.checkout_date)?,
    })
  }
}

pub struct RawSuggestion {
  pub territory_id:     i64,
  pub number:           String,
  pub last_return_date: Option<String>,
}

impl RawSuggestion {
  pub fn into_suggestion(self) -> Result<AssignmentSuggestion> {
    Ok(AssignmentSuggestion {
      territory_id:     self.territory_id,
      number:           self.number,
      last_return_date: decode_opt_date(self.last_return_date.as_deref())?,
    })
  }
}
