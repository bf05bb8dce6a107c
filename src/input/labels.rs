use std::path::Path;

use crate::input::InputError;
use crate::input::reader::{open_csv, record_line};
use crate::input::table::strip_bom;

#[derive(Debug, Clone)]
pub struct LabelVector {
    pub name: String,
    pub values: Vec<u8>,
}

impl LabelVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn positives(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }
}

/// Reads a one-column label table. The label is taken from the last column so
/// files written together with their index column load unchanged.
pub fn parse_labels(path: &Path) -> Result<LabelVector, InputError> {
    let mut reader = open_csv(path)?;
    let name = reader
        .headers()?
        .iter()
        .last()
        .map(|s| strip_bom(s).to_string())
        .unwrap_or_default();

    let mut values = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        let raw = record.iter().last().unwrap_or("");
        let value = parse_label(raw).ok_or_else(|| {
            InputError::Parse(format!(
                "label line {}: expected a binary label, got {:?}",
                record_line(&record),
                raw
            ))
        })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(InputError::Parse(format!(
            "label file {} has no data rows",
            path.display()
        )));
    }

    Ok(LabelVector { name, values })
}

fn parse_label(raw: &str) -> Option<u8> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(1),
        "0" | "0.0" | "false" => Some(0),
        _ => None,
    }
}
