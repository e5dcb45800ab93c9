//! Per-date CSV history tables.
//!
//! One row per date (`YYYYMMDD`), rows sorted by date. Writing the same
//! date twice replaces the earlier row, so reruns are idempotent.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{OutputError, Result};
use crate::fs::create;

pub const DATE_COLUMN: &str = "date";

/// Decimal places kept for every value.
const DECIMALS: i32 = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTable {
    columns: Vec<String>,
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl HistoryTable {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: BTreeMap::new(),
        }
    }

    /// Read the table at `path`, or start an empty one with `columns` when
    /// the file does not exist. Columns found in the file come first.
    pub fn load<S: AsRef<str>>(path: impl AsRef<Path>, columns: &[S]) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No history yet");
            return Ok(Self::new(columns));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let date_idx = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| OutputError::MissingColumn(DATE_COLUMN.to_string()))?;

        let mut table = Self::new(
            &headers
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != date_idx)
                .map(|(_, h)| h)
                .collect::<Vec<_>>(),
        );
        for column in columns {
            table.ensure_column(column.as_ref());
        }

        for record in reader.records() {
            let record = record?;
            let Some(date) = record.get(date_idx) else {
                continue;
            };
            let values = headers
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|&(i, _)| i != date_idx)
                .filter_map(|(_, (h, v))| v.trim().parse::<f64>().ok().map(|v| (h.to_string(), v)))
                .collect();
            table.rows.insert(date.to_string(), values);
        }
        Ok(table)
    }

    /// Replace the row for `date` with `values`, rounded to 4 decimals.
    pub fn upsert(&mut self, date: &str, values: &[(&str, f64)]) {
        let scale = 10f64.powi(DECIMALS);
        let mut row = BTreeMap::new();
        for &(column, value) in values.iter().filter(|(c, _)| *c != DATE_COLUMN) {
            self.ensure_column(column);
            if value.is_finite() {
                row.insert(column.to_string(), (value * scale).round() / scale);
            }
        }
        if self.rows.insert(date.to_string(), row).is_some() {
            debug!(date, "Replaced history row");
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn get(&self, date: &str, column: &str) -> Option<f64> {
        self.rows.get(date).and_then(|row| row.get(column)).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table sorted by date. Missing and non-finite values are
    /// written as empty fields.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_writer(create(path)?);

        let mut header = vec![DATE_COLUMN];
        header.extend(self.columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (date, row) in &self.rows {
            let mut record = vec![date.clone()];
            record.extend(
                self.columns
                    .iter()
                    .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = self.rows.len(), "Saved history table");
        Ok(())
    }

    fn ensure_column(&mut self, column: &str) {
        if column != DATE_COLUMN && !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
    }
}
