use std::collections::BTreeMap;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Serializes an object to a pretty-printed JSON file.
pub fn object_to_json<T: Serialize>(output_path: &str, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path, j)?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Summary of one batch evaluation run.
#[derive(Debug, serde::Serialize)]
pub struct EvaluationReport {
    pub timestamp: String,
    pub samples: usize,
    pub frequencies: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl EvaluationReport {
    pub fn new(frequencies: BTreeMap<String, usize>, expected: Option<&str>) -> EvaluationReport {
        let samples: usize = frequencies.values().sum();
        let accuracy = expected.filter(|_| samples > 0).map(|label| {
            frequencies.get(label).copied().unwrap_or(0) as f64 / samples as f64
        });
        EvaluationReport {
            timestamp: local_timestamp(),
            samples,
            frequencies,
            expected: expected.map(str::to_string),
            accuracy,
        }
    }
}

fn local_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

pub fn write_report(output_path: &str, report: &EvaluationReport) -> Result<()> {
    object_to_json(output_path, report)
}

/// Human readable frequency table, one `label: count` line per entry.
pub fn format_table(frequencies: &BTreeMap<String, usize>) -> String {
    let mut s = String::new();
    for (label, count) in frequencies {
        s += format!("{:>16}: {}\n", label, count).as_str();
    }
    s
}
