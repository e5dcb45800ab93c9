//! Ensemble forecast tables: one row per member, one column per lead time.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::fs::create;

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleTable {
    /// Column names are `lead_{hhh}_{suffix}`.
    suffix: String,
    leads: BTreeSet<u32>,
    /// Members in first-recorded order.
    rows: Vec<(String, BTreeMap<u32, f64>)>,
}

impl EnsembleTable {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            leads: BTreeSet::new(),
            rows: Vec::new(),
        }
    }

    pub fn record(&mut self, member: &str, lead_hours: u32, value: f64) {
        self.leads.insert(lead_hours);
        let idx = match self.rows.iter().position(|(m, _)| m == member) {
            Some(idx) => idx,
            None => {
                self.rows.push((member.to_string(), BTreeMap::new()));
                self.rows.len() - 1
            }
        };
        self.rows[idx].1.insert(lead_hours, value);
    }

    pub fn column_name(&self, lead_hours: u32) -> String {
        format!("lead_{:03}_{}", lead_hours, self.suffix)
    }

    pub fn get(&self, member: &str, lead_hours: u32) -> Option<f64> {
        self.rows
            .iter()
            .find(|(m, _)| m == member)
            .and_then(|(_, values)| values.get(&lead_hours))
            .copied()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(m, _)| m.as_str())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_writer(create(path)?);

        let mut header = vec!["ensemble".to_string()];
        header.extend(self.leads.iter().map(|&lead| self.column_name(lead)));
        writer.write_record(&header)?;

        for (member, values) in &self.rows {
            let mut record = vec![member.clone()];
            record.extend(self.leads.iter().map(|lead| {
                values
                    .get(lead)
                    .filter(|v| v.is_finite())
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            }));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!(path = %path.display(), members = self.rows.len(), leads = self.leads.len(), "Saved ensemble table");
        Ok(())
    }
}
