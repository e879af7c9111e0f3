//! Cell-to-[`Value`] conversion per declared [`DataType`].
//!
//! Numeric cells convert natively; every other cell is parsed from its displayed text.

use crate::format::ValueFormatter;
use crate::sheet::{Cell, CellValue, Workbook};
use crate::types::{DataType, Value};

use super::dates::parse_date_text;

/// Why a cell could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure {
    /// The cell as displayed.
    pub raw: String,
    pub message: String,
}

/// Converts a non-blank cell to `data_type`.
pub fn coerce_cell(
    workbook: &Workbook,
    formatter: &ValueFormatter,
    cell: &Cell,
    data_type: DataType,
) -> Result<Value, CoercionFailure> {
    if let CellValue::Number(v) = cell.value {
        return coerce_number(v, data_type, formatter);
    }

    let text = formatter.format_cell(workbook, cell);
    let fail = |message: String| CoercionFailure {
        raw: text.clone(),
        message,
    };
    match data_type {
        DataType::String => Ok(Value::String(text.clone())),
        DataType::Int => text
            .trim()
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|e| fail(format!("expected integer: {e}"))),
        DataType::Long => text
            .trim()
            .parse::<f64>()
            .map(|v| Value::Long(v as i64))
            .map_err(|e| fail(format!("expected number: {e}"))),
        DataType::Double => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| fail(format!("expected number: {e}"))),
        DataType::Date => parse_date_text(&text)
            .map(Value::Date)
            .ok_or_else(|| fail("unrecognized date".to_string())),
    }
}

fn coerce_number(
    v: f64,
    data_type: DataType,
    formatter: &ValueFormatter,
) -> Result<Value, CoercionFailure> {
    match data_type {
        DataType::Int => Ok(Value::Int(v as i32)),
        DataType::Long => Ok(Value::Long(v as i64)),
        DataType::Double => Ok(Value::Double(v)),
        DataType::String if v.fract() == 0.0 => Ok(Value::String((v as i64).to_string())),
        DataType::String => Ok(Value::String(v.to_string())),
        DataType::Date => formatter
            .date_system()
            .to_date(v)
            .map(Value::Date)
            .ok_or_else(|| CoercionFailure {
                raw: v.to_string(),
                message: "not a valid date serial".to_string(),
            }),
    }
}
