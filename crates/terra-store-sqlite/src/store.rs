//! [`SqliteStore`], the SQLite implementation of [`TerritoryStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{
  OptionalExtension as _, TransactionBehavior, functions::FunctionFlags, types::Value,
};
use terra_core::{
  Error as DomainError,
  model::{
    Assignment, Campaign, Group, GroupSummary, NewAssignment, NewCampaign, NewPerson,
    NewTerritory, Person, Territory, TerritoryStatus, TerritoryUpdate, validate_group_name,
  },
  report::{
    AssignmentSuggestion, CampaignProgress, ConsistencyIssue, OverdueTerritory, StatusCounts,
    TerritoryFilter, TerritoryHistory, TerritoryRow, TerritorySort, group_history,
    status_consistent,
  },
  store::TerritoryStore,
};

use crate::{
  Error, Result,
  encode::{
    ASSIGNMENT_COLUMNS, CAMPAIGN_COLUMNS, RawAssignment, RawCampaign, RawHistoryRow,
    RawOverdue, RawSuggestion, RawTerritory, RawTerritoryRow, TERRITORY_COLUMNS,
    decode_status, encode_date, encode_status, fold, like_pattern, read_person,
  },
  schema::SCHEMA,
};

/// What a `call` closure hands back: the outer error is the driver, the
/// inner one a business rule that rolled the transaction back.
type Call<T> = std::result::Result<T, tokio_rusqlite::Error>;
type Outcome<T> = std::result::Result<T, DomainError>;

const AVAILABLE: &str = "Disponível";
const IN_FIELD: &str = "Em campo";

/// Enriched territory rows: current holder, group, campaign and the latest
/// return date over the whole history. Column order matches
/// [`RawTerritoryRow::from_row`].
const TERRITORY_ROW_SELECT: &str = "
  SELECT
    t.id, t.number, t.description, t.image_url, t.kind, t.notes, t.status, t.group_id,
    p.name          AS holder_name,
    cur.checkout_date,
    g.name          AS group_name,
    c.title         AS campaign_title,
    (SELECT MAX(h.return_date) FROM assignments h WHERE h.territory_id = t.id)
                    AS last_return_date
  FROM territories t
  LEFT JOIN assignments cur    ON cur.territory_id = t.id AND cur.return_date IS NULL
  LEFT JOIN people p           ON p.id = cur.person_id
  LEFT JOIN territory_groups g ON g.id = t.group_id
  LEFT JOIN campaigns c        ON c.id = cur.campaign_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A territory store backed by a single SQLite file.
///
/// Clones share one connection. All calls are serialised on the
/// connection's thread, and every multi-statement operation holds an
/// `IMMEDIATE` transaction for its whole read-check-write sequence.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// `fold(text)`: Unicode lowercase, so `LIKE` ignores case beyond ASCII.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "fold",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| Ok(ctx.get::<Option<String>>(0)?.as_deref().map(fold)),
  )
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

fn duplicate_group(name: &str) -> DomainError {
  DomainError::Conflict(format!("a group named {name:?} already exists"))
}

fn select_territory(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawTerritory>> {
  conn
    .query_row(
      &format!("SELECT {TERRITORY_COLUMNS} FROM territories t WHERE t.id = ?1"),
      rusqlite::params![id],
      RawTerritory::from_row,
    )
    .optional()
}

fn exists(conn: &rusqlite::Connection, table: &'static str, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        &format!("SELECT 1 FROM {table} WHERE id = ?1"),
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

// ─── TerritoryStore impl ─────────────────────────────────────────────────────

impl TerritoryStore for SqliteStore {
  type Error = Error;

  // ── Assignment lifecycle ──────────────────────────────────────────────────

  async fn assign(&self, input: NewAssignment) -> Result<Assignment> {
    let NewAssignment { territory_id, person_id, checkout_date, campaign_id } = input;
    let checkout_str = encode_date(checkout_date);

    let raw = self
      .conn
      .call(move |conn| -> Call<Outcome<RawAssignment>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // The guarded UPDATE is the availability check: zero rows means the
        // territory is missing or already in the field.
        let claimed = tx.execute(
          "UPDATE territories SET status = ?1 WHERE id = ?2 AND status = ?3",
          rusqlite::params![IN_FIELD, territory_id, AVAILABLE],
        )?;
        if claimed == 0 {
          let err = if exists(&tx, "territories", territory_id)? {
            DomainError::InvalidState(format!(
              "territory {territory_id} is not available for assignment"
            ))
          } else {
            DomainError::NotFound(format!("territory {territory_id} not found"))
          };
          return Ok(Err(err));
        }

        if !exists(&tx, "people", person_id)? {
          return Ok(Err(DomainError::NotFound(format!("person {person_id} not found"))));
        }
        if let Some(cid) = campaign_id
          && !exists(&tx, "campaigns", cid)?
        {
          return Ok(Err(DomainError::NotFound(format!("campaign {cid} not found"))));
        }

        tx.execute(
          "INSERT INTO assignments (territory_id, person_id, campaign_id, checkout_date)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![territory_id, person_id, campaign_id, checkout_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(RawAssignment {
          id,
          territory_id,
          person_id,
          campaign_id,
          checkout_date: checkout_str,
          return_date: None,
        }))
      })
      .await??;

    tracing::info!(territory_id, person_id, "territory assigned");
    raw.into_assignment()
  }

  async fn return_territory(&self, territory_id: i64, return_date: NaiveDate) -> Result<Assignment> {
    let return_str = encode_date(return_date);

    let raw = self
      .conn
      .call(move |conn| -> Call<Outcome<RawAssignment>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let open: Option<i64> = tx
          .query_row(
            "SELECT id FROM assignments WHERE territory_id = ?1 AND return_date IS NULL",
            rusqlite::params![territory_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(assignment_id) = open else {
          return Ok(Err(DomainError::NotFound(format!(
            "no open assignment found for territory {territory_id}"
          ))));
        };

        tx.execute(
          "UPDATE assignments SET return_date = ?1 WHERE id = ?2",
          rusqlite::params![return_str, assignment_id],
        )?;
        tx.execute(
          "UPDATE territories SET status = ?1 WHERE id = ?2",
          rusqlite::params![AVAILABLE, territory_id],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ?1"),
          rusqlite::params![assignment_id],
          RawAssignment::from_row,
        )?;
        tx.commit()?;

        Ok(Ok(raw))
      })
      .await??;

    tracing::info!(territory_id, "territory returned");
    raw.into_assignment()
  }

  // ── Reporting ─────────────────────────────────────────────────────────────

  async fn list_territories(&self, filter: &TerritoryFilter) -> Result<Vec<TerritoryRow>> {
    // Only static fragments go into the SQL text; user input is bound.
    let mut conds: Vec<&'static str> = vec![];
    let mut args: Vec<Value> = vec![];

    if let Some(campaign_id) = filter.not_worked_in_campaign {
      conds.push(
        "t.id NOT IN (SELECT territory_id FROM assignments WHERE campaign_id = ?)",
      );
      args.push(Value::Integer(campaign_id));
    }
    if let Some(status) = filter.status {
      conds.push("t.status = ?");
      args.push(Value::Text(encode_status(status).to_owned()));
    }
    if let Some(text) = filter.search.as_deref().filter(|s| !s.is_empty()) {
      conds.push(
        "(fold(t.number) LIKE ? ESCAPE '\\' OR fold(t.description) LIKE ? ESCAPE '\\')",
      );
      let pattern = like_pattern(&fold(text));
      args.push(Value::Text(pattern.clone()));
      args.push(Value::Text(pattern));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let order_clause = match filter.sort {
      TerritorySort::NumberAsc => "CAST(t.number AS INTEGER) ASC, t.id ASC",
      TerritorySort::LastReturnDesc => {
        "last_return_date DESC NULLS LAST, CAST(t.number AS INTEGER) ASC"
      }
      TerritorySort::DescriptionAsc => "t.description ASC, t.id ASC",
    };
    let sql = format!("{TERRITORY_ROW_SELECT} {where_clause} ORDER BY {order_clause}");

    let raws: Vec<RawTerritoryRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawTerritoryRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTerritoryRow::into_row).collect()
  }

  async fn territory_history(&self) -> Result<Vec<TerritoryHistory>> {
    let raws: Vec<RawHistoryRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             t.id, t.number, t.description,
             a.id, p.name, a.checkout_date, a.return_date, c.title
           FROM territories t
           LEFT JOIN assignments a ON a.territory_id = t.id
           LEFT JOIN people p      ON p.id = a.person_id
           LEFT JOIN campaigns c   ON c.id = a.campaign_id
           ORDER BY t.id ASC, a.checkout_date DESC, a.id DESC",
        )?;
        let rows = stmt
          .query_map([], RawHistoryRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let rows = raws
      .into_iter()
      .map(RawHistoryRow::into_history_row)
      .collect::<Result<Vec<_>>>()?;
    Ok(group_history(rows))
  }

  async fn status_counts(&self) -> Result<StatusCounts> {
    let counts = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             COUNT(*),
             COUNT(CASE WHEN status = ?1 THEN 1 END),
             COUNT(CASE WHEN status = ?2 THEN 1 END)
           FROM territories",
          rusqlite::params![IN_FIELD, AVAILABLE],
          |row| {
            Ok(StatusCounts {
              total:     row.get(0)?,
              in_field:  row.get(1)?,
              available: row.get(2)?,
            })
          },
        )?)
      })
      .await?;
    Ok(counts)
  }

  async fn overdue_territories(&self, threshold: NaiveDate) -> Result<Vec<OverdueTerritory>> {
    let threshold_str = encode_date(threshold);

    let raws: Vec<RawOverdue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT t.id, t.number, p.name, a.checkout_date
           FROM territories t
           JOIN assignments a ON a.territory_id = t.id AND a.return_date IS NULL
           JOIN people p      ON p.id = a.person_id
           WHERE t.status = ?1 AND a.checkout_date <= ?2
           ORDER BY a.checkout_date ASC, CAST(t.number AS INTEGER) ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![IN_FIELD, threshold_str], |row| {
            Ok(RawOverdue {
              territory_id:  row.get(0)?,
              number:        row.get(1)?,
              holder_name:   row.get(2)?,
              checkout_date: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOverdue::into_overdue).collect()
  }

  async fn assignment_suggestions(&self, limit: usize) -> Result<Vec<AssignmentSuggestion>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawSuggestion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             t.id, t.number,
             (SELECT MAX(h.return_date) FROM assignments h WHERE h.territory_id = t.id)
               AS last_return_date
           FROM territories t
           WHERE t.status = ?1
           ORDER BY last_return_date ASC NULLS FIRST, CAST(t.number AS INTEGER) ASC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![AVAILABLE, limit_val], |row| {
            Ok(RawSuggestion {
              territory_id:     row.get(0)?,
              number:           row.get(1)?,
              last_return_date: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSuggestion::into_suggestion).collect()
  }

  async fn campaign_progress(&self) -> Result<Vec<CampaignProgress>> {
    let raws: Vec<(RawCampaign, i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             c.id, c.title, c.start_date, c.end_date,
             (SELECT COUNT(DISTINCT a.territory_id) FROM assignments a
               WHERE a.campaign_id = c.id),
             (SELECT COUNT(*) FROM territories)
           FROM campaigns c
           ORDER BY c.start_date DESC, c.id DESC",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((RawCampaign::from_row(row)?, row.get(4)?, row.get(5)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, worked, total)| -> Result<CampaignProgress> {
        Ok(CampaignProgress::new(raw.into_campaign()?, worked, total))
      })
      .collect()
  }

  async fn check_consistency(&self) -> Result<Vec<ConsistencyIssue>> {
    let raws: Vec<(i64, String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             t.id, t.status,
             (SELECT COUNT(*) FROM assignments a
               WHERE a.territory_id = t.id AND a.return_date IS NULL)
           FROM territories t
           ORDER BY t.id",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut issues = Vec::new();
    for (territory_id, status, open_assignments) in raws {
      let status = decode_status(&status)?;
      if !status_consistent(status, open_assignments) {
        issues.push(ConsistencyIssue { territory_id, status, open_assignments });
      }
    }
    Ok(issues)
  }

  // ── People ────────────────────────────────────────────────────────────────

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    input.validate()?;
    let NewPerson { name, email, phone } = input;

    let person = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (name, email, phone) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, email, phone],
        )?;
        Ok(Person { id: conn.last_insert_rowid(), name, email, phone })
      })
      .await?;
    Ok(person)
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    let people = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, name, email, phone FROM people ORDER BY name ASC, id ASC")?;
        let rows = stmt
          .query_map([], read_person)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(people)
  }

  async fn update_person(&self, id: i64, input: NewPerson) -> Result<Option<Person>> {
    input.validate()?;
    let NewPerson { name, email, phone } = input;

    let person = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE people SET name = ?1, email = ?2, phone = ?3 WHERE id = ?4",
          rusqlite::params![name, email, phone, id],
        )?;
        Ok((changed > 0).then_some(Person { id, name, email, phone }))
      })
      .await?;
    Ok(person)
  }

  async fn delete_person(&self, id: i64) -> Result<Person> {
    let person = self
      .conn
      .call(move |conn| -> Call<Outcome<Person>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let open: i64 = tx.query_row(
          "SELECT COUNT(*) FROM assignments WHERE person_id = ?1 AND return_date IS NULL",
          rusqlite::params![id],
          |r| r.get(0),
        )?;
        if open > 0 {
          return Ok(Err(DomainError::Conflict(format!(
            "person {id} still holds a territory in the field"
          ))));
        }

        let person = tx
          .query_row(
            "SELECT id, name, email, phone FROM people WHERE id = ?1",
            rusqlite::params![id],
            read_person,
          )
          .optional()?;
        let Some(person) = person else {
          return Ok(Err(DomainError::NotFound(format!("person {id} not found"))));
        };

        tx.execute("DELETE FROM people WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(Ok(person))
      })
      .await??;
    Ok(person)
  }

  // ── Territories ───────────────────────────────────────────────────────────

  async fn create_territory(&self, input: NewTerritory) -> Result<Territory> {
    input.validate()?;
    let NewTerritory { number, description, image_url, kind, notes } = input;

    let territory = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO territories (number, description, image_url, kind, notes, status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![number, description, image_url, kind, notes, AVAILABLE],
        )?;
        Ok(Territory {
          id: conn.last_insert_rowid(),
          number,
          description: Some(description),
          image_url,
          kind,
          notes,
          status: TerritoryStatus::Available,
          group_id: None,
        })
      })
      .await?;
    Ok(territory)
  }

  async fn get_territory(&self, id: i64) -> Result<Option<Territory>> {
    let raw = self.conn.call(move |conn| Ok(select_territory(conn, id)?)).await?;
    raw.map(RawTerritory::into_territory).transpose()
  }

  async fn update_territory(&self, id: i64, input: TerritoryUpdate) -> Result<Option<Territory>> {
    input.validate()?;
    let TerritoryUpdate { number, description, kind, notes } = input;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE territories SET number = ?1, description = ?2, kind = ?3, notes = ?4
           WHERE id = ?5",
          rusqlite::params![number, description, kind, notes, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_territory(conn, id)?)
      })
      .await?;
    raw.map(RawTerritory::into_territory).transpose()
  }

  async fn delete_territory(&self, id: i64) -> Result<Territory> {
    let raw = self
      .conn
      .call(move |conn| -> Call<Outcome<RawTerritory>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(raw) = select_territory(&tx, id)? else {
          return Ok(Err(DomainError::NotFound(format!("territory {id} not found"))));
        };
        if raw.status == IN_FIELD {
          return Ok(Err(DomainError::Conflict(format!(
            "territory {id} is in the field and cannot be deleted"
          ))));
        }

        tx.execute("DELETE FROM territories WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;
    raw.into_territory()
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn create_group(&self, name: String) -> Result<Group> {
    validate_group_name(&name)?;

    let group = self
      .conn
      .call(move |conn| -> Call<Outcome<Group>> {
        let inserted =
          conn.execute("INSERT INTO territory_groups (name) VALUES (?1)", rusqlite::params![name]);
        match inserted {
          Ok(_) => Ok(Ok(Group { id: conn.last_insert_rowid(), name })),
          Err(e) if is_unique_violation(&e) => Ok(Err(duplicate_group(&name))),
          Err(e) => Err(e.into()),
        }
      })
      .await??;
    Ok(group)
  }

  async fn list_groups(&self) -> Result<Vec<GroupSummary>> {
    let raws: Vec<(i64, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             g.id, g.name,
             json_group_array(t.id ORDER BY CAST(t.number AS INTEGER), t.id)
               FILTER (WHERE t.id IS NOT NULL)
           FROM territory_groups g
           LEFT JOIN territories t ON t.group_id = g.id
           GROUP BY g.id
           ORDER BY g.name ASC",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, name, ids_json)| -> Result<GroupSummary> {
        Ok(GroupSummary { id, name, territory_ids: serde_json::from_str(&ids_json)? })
      })
      .collect()
  }

  async fn rename_group(&self, id: i64, name: String) -> Result<Option<Group>> {
    validate_group_name(&name)?;

    let group = self
      .conn
      .call(move |conn| -> Call<Outcome<Option<Group>>> {
        let updated = conn.execute(
          "UPDATE territory_groups SET name = ?1 WHERE id = ?2",
          rusqlite::params![name, id],
        );
        match updated {
          Ok(changed) => Ok(Ok((changed > 0).then_some(Group { id, name }))),
          Err(e) if is_unique_violation(&e) => Ok(Err(duplicate_group(&name))),
          Err(e) => Err(e.into()),
        }
      })
      .await??;
    Ok(group)
  }

  async fn delete_group(&self, id: i64) -> Result<Group> {
    let group = self
      .conn
      .call(move |conn| -> Call<Outcome<Group>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
          "UPDATE territories SET group_id = NULL WHERE group_id = ?1",
          rusqlite::params![id],
        )?;
        let group = tx
          .query_row(
            "SELECT id, name FROM territory_groups WHERE id = ?1",
            rusqlite::params![id],
            |r| Ok(Group { id: r.get(0)?, name: r.get(1)? }),
          )
          .optional()?;
        let Some(group) = group else {
          return Ok(Err(DomainError::NotFound(format!("group {id} not found"))));
        };

        tx.execute("DELETE FROM territory_groups WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(Ok(group))
      })
      .await??;
    Ok(group)
  }

  async fn set_group_territories(&self, id: i64, territory_ids: Vec<i64>) -> Result<()> {
    self
      .conn
      .call(move |conn| -> Call<Outcome<()>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !exists(&tx, "territory_groups", id)? {
          return Ok(Err(DomainError::NotFound(format!("group {id} not found"))));
        }

        tx.execute(
          "UPDATE territories SET group_id = NULL WHERE group_id = ?1",
          rusqlite::params![id],
        )?;
        {
          let mut stmt = tx.prepare("UPDATE territories SET group_id = ?1 WHERE id = ?2")?;
          for territory_id in &territory_ids {
            stmt.execute(rusqlite::params![id, territory_id])?;
          }
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  async fn create_campaign(&self, input: NewCampaign) -> Result<Campaign> {
    input.validate()?;
    let NewCampaign { title, start_date, end_date } = input;
    let (start_str, end_str) = (encode_date(start_date), encode_date(end_date));

    let campaign = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaigns (title, start_date, end_date) VALUES (?1, ?2, ?3)",
          rusqlite::params![title, start_str, end_str],
        )?;
        Ok(Campaign { id: conn.last_insert_rowid(), title, start_date, end_date })
      })
      .await?;
    Ok(campaign)
  }

  async fn update_campaign(&self, id: i64, input: NewCampaign) -> Result<Option<Campaign>> {
    input.validate()?;
    let NewCampaign { title, start_date, end_date } = input;
    let (start_str, end_str) = (encode_date(start_date), encode_date(end_date));

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE campaigns SET title = ?1, start_date = ?2, end_date = ?3 WHERE id = ?4",
          rusqlite::params![title, start_str, end_str, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"),
              rusqlite::params![id],
              RawCampaign::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCampaign::into_campaign).transpose()
  }

  async fn delete_campaign(&self, id: i64) -> Result<Campaign> {
    let raw = self
      .conn
      .call(move |conn| -> Call<Outcome<RawCampaign>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw = tx
          .query_row(
            &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"),
            rusqlite::params![id],
            RawCampaign::from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(Err(DomainError::NotFound(format!("campaign {id} not found"))));
        };

        tx.execute("DELETE FROM campaigns WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;
    raw.into_campaign()
  }
}
