//! Record construction and validation seams.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::MappingResult;
use crate::types::{RowData, ValidationResult};

/// Builds a typed record from one non-blank data row.
pub trait Populate<T> {
    fn populate(&self, row: &RowData) -> MappingResult<T>;
}

impl<T, F> Populate<T> for F
where
    F: Fn(&RowData) -> T,
{
    fn populate(&self, row: &RowData) -> MappingResult<T> {
        Ok(self(row))
    }
}

/// Checks a populated record. Anything other than an OK result keeps the record out of the
/// response and annotates its row.
pub trait Validator<T> {
    fn validate(&self, record: &T) -> ValidationResult;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&T) -> ValidationResult,
{
    fn validate(&self, record: &T) -> ValidationResult {
        self(record)
    }
}

/// Populates any `Deserialize` type from the row's JSON object, keyed by field name.
///
/// Absent and null fields deserialize as missing, so record types usually declare them as
/// `Option` or with `#[serde(default)]`.
pub struct SerdePopulate<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> SerdePopulate<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for SerdePopulate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdePopulate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SerdePopulate")
    }
}

impl<T: DeserializeOwned> Populate<T> for SerdePopulate<T> {
    fn populate(&self, row: &RowData) -> MappingResult<T> {
        Ok(serde_json::from_value(row.to_json())?)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::types::{CorrectnessLevel, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Loan {
        contract_id: Option<i64>,
        full_name: Option<String>,
    }

    #[test]
    fn serde_populate_maps_fields_by_name() {
        let mut row = RowData::new(3);
        row.insert("contractId", Value::Long(77));
        row.insert("fullName", Value::Null);

        let loan = SerdePopulate::<Loan>::new().populate(&row).unwrap();
        assert_eq!(
            loan,
            Loan {
                contract_id: Some(77),
                full_name: None
            }
        );
    }

    #[test]
    fn closures_implement_both_seams() {
        let populate = |row: &RowData| row.get_i64("id").unwrap_or_default();
        let validator = |id: &i64| {
            if *id > 0 {
                ValidationResult::ok()
            } else {
                ValidationResult::warn("non-positive id")
            }
        };

        let mut row = RowData::new(0);
        row.insert("id", Value::Long(-4));
        let id = populate.populate(&row).unwrap();
        assert_eq!(validator.validate(&id).level, CorrectnessLevel::Warn);
    }
}
