use std::path::Path;

use crate::input::InputError;
use crate::input::reader::{is_missing_token, open_csv, record_line};

/// Row-major numeric feature table. Missing cells are stored as NaN.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub n_rows: usize,
    values: Vec<f64>,
}

impl FeatureTable {
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, InputError> {
        let n_cols = columns.len();
        let n_rows = rows.len();
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(InputError::InvalidInput(format!(
                    "row {} has {} values, expected {}",
                    idx,
                    row.len(),
                    n_cols
                )));
            }
            values.extend(row);
        }
        Ok(Self {
            columns,
            n_rows,
            values,
        })
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[idx * n_cols..(idx + 1) * n_cols]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

pub fn parse_feature_table(path: &Path) -> Result<FeatureTable, InputError> {
    let mut reader = open_csv(path)?;
    let header: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let name = if i == 0 { strip_bom(name) } else { name };
            name.to_string()
        })
        .collect();
    if header.is_empty() {
        return Err(InputError::Parse(format!(
            "feature table {} is empty",
            path.display()
        )));
    }
    let skip_index = header.len() > 1 && header[0].is_empty();
    if skip_index {
        tracing::debug!("dropping unnamed leading index column from feature table");
    }
    let columns: Vec<String> = header.into_iter().skip(usize::from(skip_index)).collect();
    if columns.iter().any(|c| c.is_empty()) {
        return Err(InputError::Parse(
            "feature table header has empty column names".to_string(),
        ));
    }
    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(InputError::Parse(format!(
                "duplicate feature column: {}",
                name
            )));
        }
    }

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        let mut row = Vec::with_capacity(columns.len());
        for (col, raw) in record.iter().skip(usize::from(skip_index)).enumerate() {
            row.push(parse_cell(raw).ok_or_else(|| {
                InputError::Parse(format!(
                    "feature table line {}: non-numeric value {:?} in column {}",
                    record_line(&record),
                    raw,
                    columns[col]
                ))
            })?);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(InputError::Parse(format!(
            "feature table {} has no data rows",
            path.display()
        )));
    }

    FeatureTable::from_rows(columns, rows)
}

fn parse_cell(raw: &str) -> Option<f64> {
    if is_missing_token(raw) {
        return Some(f64::NAN);
    }
    match raw {
        "True" | "true" => Some(1.0),
        "False" | "false" => Some(0.0),
        _ => raw.parse::<f64>().ok(),
    }
}

pub(crate) fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}').unwrap_or(s)
}
