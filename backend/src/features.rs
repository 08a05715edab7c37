//! Exogenous feature alignment.
//!
//! Models are trained against a fixed, ordered set of lagged regressors. A
//! caller may send any subset of them, in any order, plus unrelated columns.
//! [`align`] conforms such a table to the trained layout: missing features are
//! zero-filled, unknown ones dropped, and rows truncated to the forecast
//! horizon.

use std::collections::BTreeMap;

use log::{info, warn};
use serde_json::Value;

/// Lagged regressors the production models were trained on, in training order.
pub const EXOG_FEATURES: [&str; 40] = [
    "gcv_cal_value_lag_1",
    "gcv_cal_value_lag_7",
    "gcv_cal_value_lag_14",
    "gcv_cal_value_lag_30",
    "gst_rcovery_rate_lag_1",
    "gst_rcovery_rate_lag_7",
    "gst_rcovery_rate_lag_14",
    "gst_rcovery_rate_lag_30",
    "zutf_rate_lag_1",
    "zutf_rate_lag_7",
    "zutf_rate_lag_14",
    "zutf_rate_lag_30",
    "ztu1_rate_lag_1",
    "ztu1_rate_lag_7",
    "ztu1_rate_lag_14",
    "ztu1_rate_lag_30",
    "ztf1_rate_lag_1",
    "ztf1_rate_lag_7",
    "ztf1_rate_lag_14",
    "ztf1_rate_lag_30",
    "exch_rate_lag_1",
    "exch_rate_lag_7",
    "exch_rate_lag_14",
    "exch_rate_lag_30",
    "ncv_cal_value_lag_1",
    "ncv_cal_value_lag_7",
    "ncv_cal_value_lag_14",
    "ncv_cal_value_lag_30",
    "marketing_margn_rate_lag_1",
    "marketing_margn_rate_lag_7",
    "marketing_margn_rate_lag_14",
    "marketing_margn_rate_lag_30",
    "vat_rate_lag_1",
    "vat_rate_lag_7",
    "vat_rate_lag_14",
    "vat_rate_lag_30",
    "gcv_to_ncv_ratio_lag_1",
    "gcv_to_ncv_ratio_lag_7",
    "gcv_to_ncv_ratio_lag_14",
    "gcv_to_ncv_ratio_lag_30",
];

/// Owned copy of [`EXOG_FEATURES`].
pub fn default_exog_features() -> Vec<String> {
    EXOG_FEATURES.iter().map(|s| s.to_string()).collect()
}

/// Number of missing feature names echoed in the zero-fill warning.
const MISSING_PREVIEW: usize = 5;

/// Errors raised when a caller-supplied table cannot be read as columns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExogShapeError {
    #[error("exogenous table has no columns")]
    Empty,

    #[error("exogenous data must be an object of columns")]
    NotATable,

    #[error("column '{column}' is not an array")]
    NotAColumn { column: String },

    #[error("column '{column}' has a non-numeric value at row {row}")]
    NonNumeric { column: String, row: usize },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Column-oriented exogenous input as received from a request.
///
/// All columns have the same number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ExogTable {
    columns: BTreeMap<String, Vec<f64>>,
    n_rows: usize,
}

impl ExogTable {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl TryFrom<BTreeMap<String, Vec<f64>>> for ExogTable {
    type Error = ExogShapeError;

    fn try_from(columns: BTreeMap<String, Vec<f64>>) -> Result<Self, Self::Error> {
        let mut iter = columns.iter();
        let (_, first) = iter.next().ok_or(ExogShapeError::Empty)?;
        let n_rows = first.len();

        for (name, values) in iter {
            if values.len() != n_rows {
                return Err(ExogShapeError::RaggedColumn {
                    column: name.clone(),
                    expected: n_rows,
                    actual: values.len(),
                });
            }
        }

        Ok(Self { columns, n_rows })
    }
}

impl TryFrom<&Value> for ExogTable {
    type Error = ExogShapeError;

    /// Read a JSON `{"feature": [numbers...]}` object.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let object = value.as_object().ok_or(ExogShapeError::NotATable)?;
        let mut columns = BTreeMap::new();
        for (name, cells) in object {
            let cells = cells
                .as_array()
                .ok_or_else(|| ExogShapeError::NotAColumn { column: name.clone() })?;
            let values = cells
                .iter()
                .enumerate()
                .map(|(row, cell)| {
                    cell.as_f64().ok_or_else(|| ExogShapeError::NonNumeric {
                        column: name.clone(),
                        row,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            columns.insert(name.clone(), values);
        }
        Self::try_from(columns)
    }
}

/// Dense row-major matrix of exogenous values in model column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExogMatrix {
    columns: Vec<String>,
    values: Vec<f64>,
    n_rows: usize,
}

impl ExogMatrix {
    /// Build a matrix from rows; every row must have one value per column.
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, ExogShapeError> {
        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ExogShapeError::RaggedColumn {
                    column: format!("row {}", i),
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            columns,
            values,
            n_rows: rows.len(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[index * n_cols..(index + 1) * n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }
}

/// Conform `table` to `required` columns and keep at most `steps` rows.
///
/// The result always carries exactly `required`, in order. When the table
/// holds fewer than `steps` rows the matrix is shorter than requested.
pub fn align(table: &ExogTable, required: &[String], steps: usize) -> ExogMatrix {
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|name| !table.contains(name))
        .collect();

    if !missing.is_empty() {
        let preview = &missing[..missing.len().min(MISSING_PREVIEW)];
        warn!(
            "Missing exogenous features: {:?}... Filling with zeros ({} of {} missing)",
            preview,
            missing.len(),
            required.len()
        );
    }

    let n_rows = table.n_rows().min(steps);
    let mut values = Vec::with_capacity(n_rows * required.len());
    for row in 0..n_rows {
        for name in required {
            values.push(table.column(name).map_or(0.0, |column| column[row]));
        }
    }

    let matrix = ExogMatrix {
        columns: required.to_vec(),
        values,
        n_rows,
    };
    info!(
        "Using exogenous variables: shape ({}, {})",
        matrix.n_rows(),
        matrix.n_cols()
    );
    matrix
}
