use crate::models::SalesDataset;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const UNKNOWN_RECORD_LABEL: &str = "<unknown>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    pub dataset: String,
    pub record_id: Option<String>,
    pub missing_fields: Vec<String>,
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing data in {} record {}",
            self.dataset,
            self.record_id.as_deref().unwrap_or(UNKNOWN_RECORD_LABEL)
        )
    }
}

/// Scans every collection of the dataset for null fields.
pub fn check_completeness(dataset: &SalesDataset) -> Vec<QualityIssue> {
    let tables = match dataset.raw_tables() {
        Ok(tables) => tables,
        Err(error) => {
            tracing::warn!(error = %error, "could not build raw rows for quality check");
            return Vec::new();
        }
    };

    tables
        .iter()
        .flat_map(|(name, rows)| check_records(name, rows))
        .collect()
}

/// One issue per row holding at least one null field, in row order.
pub fn check_records(dataset_name: &str, rows: &[Value]) -> Vec<QualityIssue> {
    rows.iter()
        .filter_map(|row| inspect_row(dataset_name, row))
        .collect()
}

fn inspect_row(dataset_name: &str, row: &Value) -> Option<QualityIssue> {
    let Some(fields) = row.as_object() else {
        return Some(QualityIssue {
            dataset: dataset_name.to_string(),
            record_id: None,
            missing_fields: vec!["<record>".to_string()],
        });
    };

    let missing_fields = fields
        .iter()
        .filter(|(_, value)| value.is_null())
        .map(|(key, _)| key.clone())
        .collect::<Vec<_>>();
    if missing_fields.is_empty() {
        return None;
    }

    let record_id = fields.get("id").and_then(|id| match id {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    });

    Some(QualityIssue {
        dataset: dataset_name.to_string(),
        record_id,
        missing_fields,
    })
}
