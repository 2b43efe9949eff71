//! Spreadsheet readers.
//!
//! Turns a workbook or CSV export into [`RawRow`]s: the header row sits
//! `skip_rows` rows down from the top of the sheet and every following row is
//! paired with those headers.

use std::{iter, path::Path};

use calamine::{Data, Reader as _};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use vee_core::normalize::{CellValue, RawRow, normalize_scalar};

use crate::{Error, Result};

/// Where to find the table inside a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOptions {
  /// Rows above the header row (title banners, notes).
  pub skip_rows: usize,
  /// Worksheet to read; the first sheet when `None`. Ignored for CSV.
  pub sheet:     Option<String>,
}

impl SourceOptions {
  pub fn skip_rows(mut self, n: usize) -> Self {
    self.skip_rows = n;
    self
  }

  pub fn sheet(mut self, name: impl Into<String>) -> Self {
    self.sheet = Some(name.into());
    self
  }
}

/// Read every data row of the source at `path`.
///
/// Fails with [`Error::SourceNotFound`] before touching the file if it does
/// not exist, and with [`Error::SourceUnreadable`] if it cannot be parsed as
/// a table. Blank rows are returned as-is; the importer decides what they
/// mean.
pub fn read_rows(path: &Path, options: &SourceOptions) -> Result<Vec<RawRow>> {
  if !path.exists() {
    return Err(Error::SourceNotFound(path.to_path_buf()));
  }

  let is_csv = path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

  let grid = if is_csv {
    read_csv_grid(path)?
  } else {
    read_workbook_grid(path, options.sheet.as_deref())?
  };

  Ok(rows_from_grid(grid, options.skip_rows))
}

/// Pair data rows with the header row found after `skip_rows`.
fn rows_from_grid(grid: Vec<Vec<CellValue>>, skip_rows: usize) -> Vec<RawRow> {
  let mut lines = grid.into_iter().skip(skip_rows);
  let Some(header) = lines.next() else {
    return Vec::new();
  };

  let data: Vec<Vec<CellValue>> = lines.collect();
  let width = data.iter().map(Vec::len).fold(header.len(), usize::max);

  // Cells past the header's width still get a column.
  let labels: Vec<String> = header
    .into_iter()
    .chain(iter::repeat(CellValue::Empty))
    .take(width)
    .enumerate()
    .map(|(i, cell)| normalize_scalar(&cell).unwrap_or_else(|| format!("unnamed_{i}")))
    .collect();

  data
    .into_iter()
    .map(|cells| {
      labels
        .iter()
        .cloned()
        .zip(cells.into_iter().chain(iter::repeat(CellValue::Empty)))
        .collect()
    })
    .collect()
}

// ─── CSV ─────────────────────────────────────────────────────────────────────

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<CellValue>>> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_path(path)
    .map_err(|e| Error::unreadable(path, e))?;

  reader
    .records()
    .map(|record| {
      let record = record.map_err(|e| Error::unreadable(path, e))?;
      Ok(
        record
          .iter()
          .map(|field| {
            if field.trim().is_empty() {
              CellValue::Empty
            } else {
              CellValue::Text(field.to_owned())
            }
          })
          .collect(),
      )
    })
    .collect()
}

// ─── Workbooks ───────────────────────────────────────────────────────────────

fn read_workbook_grid(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<CellValue>>> {
  let mut workbook =
    calamine::open_workbook_auto(path).map_err(|e| Error::unreadable(path, e))?;

  let range = match sheet {
    Some(name) => workbook
      .worksheet_range(name)
      .map_err(|e| Error::unreadable(path, e))?,
    None => workbook
      .worksheet_range_at(0)
      .ok_or_else(|| Error::unreadable(path, "workbook has no worksheets"))?
      .map_err(|e| Error::unreadable(path, e))?,
  };

  // Ranges begin at the first used cell; pad back to A1 so `skip_rows`
  // counts from the top of the sheet.
  let (first_row, first_col) = range.start().unwrap_or((0, 0));
  let pad_row = || vec![CellValue::Empty; first_col as usize];

  let mut grid: Vec<Vec<CellValue>> =
    (0..first_row).map(|_| Vec::new()).collect();
  grid.extend(range.rows().map(|row| {
    let mut cells = pad_row();
    cells.extend(row.iter().map(cell_from_data));
    cells
  }));
  Ok(grid)
}

fn cell_from_data(data: &Data) -> CellValue {
  match data {
    Data::Empty | Data::Error(_) => CellValue::Empty,
    Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
      CellValue::Text(s.clone())
    }
    Data::Int(i) => CellValue::Int(*i),
    Data::Float(f) => CellValue::Float(*f),
    Data::Bool(b) => CellValue::Bool(*b),
    Data::DateTime(dt) => match dt.as_datetime() {
      Some(value) if value.time() == NaiveTime::MIN => CellValue::Date(value.date()),
      Some(value) => CellValue::DateTime(value),
      None => CellValue::Float(dt.as_f64()),
    },
  }
}
