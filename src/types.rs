//! Core data model types for mapping.
//!
//! A mapping task declares the [`Field`]s it expects; the searcher resolves each one to a
//! [`FieldIndex`], every data row becomes a [`RowData`] of typed [`Value`]s, and the run ends
//! in a [`MapperResponse`].

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Logical data type for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 64-bit floating point number.
    Double,
    /// UTF-8 string.
    String,
    /// Calendar date.
    Date,
}

/// A single expected logical field, with the alternate labels it may appear under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, also the key the value is stored under in [`RowData`].
    pub name: String,
    /// Alternate header labels.
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Field data type.
    pub data_type: DataType,
    /// Columns between the header cell and the data, for sheets where values sit beside
    /// their label.
    #[serde(default)]
    pub column_offset: i32,
}

impl Field {
    /// Create a new field without synonyms.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            synonyms: Vec::new(),
            data_type,
            column_offset: 0,
        }
    }

    /// Add alternate header labels.
    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms.extend(synonyms.into_iter().map(Into::into));
        self
    }

    /// Shift the data column relative to the matched header cell.
    pub fn with_column_offset(mut self, offset: i32) -> Self {
        self.column_offset = offset;
        self
    }

    /// The field name followed by every synonym.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}

/// Resolved position of a [`Field`] inside a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIndex {
    pub field: Field,
    pub sheet_index: usize,
    /// 0-based row number of the header row.
    pub row_index: u32,
    /// 0-based data column (header column plus the field's offset).
    pub column_index: u32,
}

/// Field indexes keyed by data column.
pub type FieldIndexMap = HashMap<u32, FieldIndex>;

/// A single typed value extracted from a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value, or a cell that failed lenient coercion.
    Null,
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Field values of one data row, keyed by field name.
///
/// Only fields whose column holds a non-blank cell are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    /// 0-based row number in the sheet.
    pub row: u32,
    values: HashMap<String, Value>,
}

impl RowData {
    pub fn new(row: u32) -> Self {
        Self {
            row,
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Returns the value of `field`, or `None` when the field had no cell in this row.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// True when every present field resolved to [`Value::Null`] (or none are present).
    pub fn is_blank(&self) -> bool {
        self.values.values().all(Value::is_null)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        match self.get(field) {
            Some(Value::Long(v)) => Some(*v),
            Some(Value::Int(v)) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        match self.get(field) {
            Some(Value::Double(v)) => Some(*v),
            Some(Value::Long(v)) => Some(*v as f64),
            Some(Value::Int(v)) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn get_date(&self, field: &str) -> Option<NaiveDate> {
        match self.get(field) {
            Some(Value::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// The row as a JSON object (`Null` values become `null`, dates ISO strings).
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .values
            .iter()
            .map(|(k, v)| {
                let json = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
                (k.clone(), json)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Severity of a validated record; a run's level is the maximum over its rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum CorrectnessLevel {
    /// No problem found.
    #[default]
    Ok = 1,
    /// Warnings were found.
    Warn = 2,
    /// Errors were found. Warnings may also have been found.
    Error = 3,
}

impl CorrectnessLevel {
    /// The more severe of the two levels.
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn priority(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CorrectnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CorrectnessLevel::Ok => "OK",
            CorrectnessLevel::Warn => "WARN",
            CorrectnessLevel::Error => "ERROR",
        })
    }
}

/// Outcome of validating one mapped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub message: String,
    pub level: CorrectnessLevel,
}

impl ValidationResult {
    pub fn new(message: impl Into<String>, level: CorrectnessLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn ok() -> Self {
        Self::new("", CorrectnessLevel::Ok)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(message, CorrectnessLevel::Warn)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, CorrectnessLevel::Error)
    }
}

/// Result of mapping one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperResponse<T> {
    /// Records that mapped and validated as OK, in sheet order.
    pub records: Vec<T>,
    /// Highest level reported by the validator.
    pub level: CorrectnessLevel,
    /// Number of records in [`Self::records`].
    pub success_count: usize,
    /// The source document, re-serialized with annotated rows. Present only when
    /// `level != Ok`.
    pub annotated_document: Option<Vec<u8>>,
    /// Addresses of cells that failed lenient coercion and were flagged in the document.
    pub flagged_cells: Vec<String>,
}

impl<T> MapperResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.level == CorrectnessLevel::Ok
    }
}
