//! Semicolon-delimited CSV rendering of the territory list (S-13 report).
//!
//! The output opens cleanly in spreadsheet software configured for pt-BR:
//! a UTF-8 byte-order mark, `;` as the delimiter, dates as `dd/mm/yyyy`.

use chrono::NaiveDate;

use crate::report::TerritoryRow;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const BOM: char = '\u{FEFF}';

pub const CSV_HEADER: [&str; 7] = [
  "Número do Território",
  "Descrição/Limites",
  "Grupo",
  "Status Atual",
  "Designado Para",
  "Data de Saída",
  "Última Devolução",
];

/// Attachment filename for an export generated on `today`.
pub fn export_filename(today: NaiveDate) -> String {
  format!("S-13_Relatorio_Territorios_{}.csv", today.format("%Y-%m-%d"))
}

/// Render `rows` in the order given.
pub fn render_csv(rows: &[TerritoryRow]) -> String {
  let mut out = String::new();
  out.push(BOM);
  out.push_str(&CSV_HEADER.join(";"));
  for row in rows {
    out.push('\n');
    out.push_str(&render_row(row));
  }
  out
}

fn render_row(row: &TerritoryRow) -> String {
  let t = &row.territory;
  [
    t.number.clone(),
    quote_description(t.description.as_deref().unwrap_or_default()),
    row.group_name.clone().unwrap_or_default(),
    t.status.to_string(),
    row.holder_name.clone().unwrap_or_default(),
    format_date(row.checkout_date),
    format_date(row.last_return_date),
  ]
  .join(";")
}

/// Always quoted: quotes doubled, line breaks collapsed to spaces.
fn quote_description(description: &str) -> String {
  let flat = description
    .replace("\r\n", " ")
    .replace(['\n', '\r'], " ")
    .replace('"', "\"\"");
  format!("\"{flat}\"")
}

fn format_date(date: Option<NaiveDate>) -> String {
  date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}
