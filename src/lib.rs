//! `sheet-mapper` renders spreadsheet cells the way a spreadsheet application displays them,
//! and maps loosely structured, human-authored sheets into typed, validated records.
//!
//! ## Rendering cell values
//!
//! A [`format::ValueFormatter`] compiles Excel format codes (numbers, dates, fractions, and a
//! few fixed templates such as SSN and phone numbers) and caches them by code:
//!
//! ```rust
//! use sheet_mapper::format::{FormatterOptions, Locale, ValueFormatter};
//!
//! let formatter = ValueFormatter::new(FormatterOptions::default());
//! assert_eq!(formatter.format_value(0.125, "0.0%"), "12.5%");
//! assert_eq!(formatter.format_value(45356.5417, "h:mm AM/PM"), "1:00 PM");
//! assert_eq!(formatter.format_value(1.5, "# ?/?"), "1 1/2");
//!
//! formatter.reconfigure(Locale::EsEs);
//! assert_eq!(formatter.format_value(1234.5, "#,##0.00"), "1.234,50");
//! ```
//!
//! Dates use the 1900 date system by default (including its fictitious 1900-02-29); a value
//! that cannot be a date under a date format renders as 255 `#` characters.
//!
//! ## Mapping sheets to records
//!
//! Declare the expected [`types::Field`]s (name, type, synonyms), then let a
//! [`mapping::SheetMapper`] find the header row and the columns and convert every data row:
//!
//! ```no_run
//! use sheet_mapper::mapping::{MapperOptions, SheetMapper};
//! use sheet_mapper::types::{DataType, Field, RowData, ValidationResult};
//!
//! # fn main() -> Result<(), sheet_mapper::MappingError> {
//! let bytes = std::fs::read("loans.xlsx")?;
//! let mut mapper = SheetMapper::from_bytes(&bytes, MapperOptions::default())?;
//!
//! let fields = vec![
//!     Field::new("contractId", DataType::Long).with_synonyms(["Contract Id", "Contrato"]),
//!     Field::new("amount", DataType::Double).with_synonyms(["Loan Amount", "Importe"]),
//! ];
//! let populate = |row: &RowData| (row.get_i64("contractId"), row.get_f64("amount"));
//! let validate = |r: &(Option<i64>, Option<f64>)| match r.0 {
//!     Some(_) => ValidationResult::ok(),
//!     None => ValidationResult::error("missing contract id"),
//! };
//!
//! let response = mapper.map_sheet_to_records(&fields, "raw data", Some(&validate), &populate)?;
//! println!("ok={} level={}", response.success_count, response.level);
//! if let Some(annotated) = response.annotated_document {
//!     std::fs::write("loans.annotated.xlsx", annotated)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`format`]: format-code compilation and value rendering
//! - [`sheet`]: in-memory document model, `.xlsx` reading (feature `excel`) and writing, CSV export
//! - [`mapping`]: header search, cell coercion, the mapping engine and its observers
//! - [`catalog`]: field catalogs, including the loan raw-data catalog
//! - [`types`]: fields, typed values, validation levels and responses
//! - [`error`]: error types used across mapping and document I/O

pub mod catalog;
pub mod error;
pub mod format;
pub mod mapping;
pub mod sheet;
pub mod types;

pub use error::{MappingError, MappingResult};
