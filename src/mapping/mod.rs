//! Mapping human-authored sheets into typed records.
//!
//! Most callers should use [`SheetMapper::map_sheet_to_records`], which:
//!
//! - selects the first sheet whose name contains a fragment (ignoring case)
//! - locates the header row and each field's column through a [`Searcher`]
//! - converts every data row into a [`crate::types::RowData`], builds a record with a
//!   [`Populate`] and checks it with an optional [`Validator`]
//! - annotates failing rows in the document and optionally reports the outcome to a
//!   [`MappingObserver`]

pub mod coerce;
pub mod dates;
mod engine;
pub mod observability;
mod populate;
mod search;

pub use coerce::{CoercionFailure, coerce_cell};
pub use dates::parse_date_text;
pub use engine::{MapperOptions, SheetMapper};
pub use observability::{
    CompositeObserver, MappingContext, MappingObserver, MappingSeverity, MappingStats,
    TracingObserver,
};
pub use populate::{Populate, SerdePopulate, Validator};
pub use search::{Searcher, SheetContext, SimpleSearcher, strip_accents};
