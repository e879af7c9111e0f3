use thiserror::Error;

/// Convenience result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Error type returned by mapping and document I/O functions.
///
/// Format compilation and value rendering never fail; malformed format codes degrade to the
/// general format instead. Everything that can surface to a caller lives here.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook reading error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Workbook serialization error while writing an annotated document.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV export error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Field catalog or record (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// No sheet name contains the requested fragment.
    #[error("no sheet name contains '{fragment}'")]
    SheetNotFound { fragment: String },

    /// No row of the sheet matches any field name or synonym.
    #[error("header not found in sheet '{sheet}'")]
    HeaderNotFound { sheet: String },

    /// A cell could not be converted to its field's declared type (strict mode only).
    #[error("error processing cell {address} for field '{field}': {message} (raw='{raw}')")]
    CellCoercion {
        address: String,
        field: String,
        raw: String,
        message: String,
    },

    /// A cell reference is not of the `A1` form.
    #[error("invalid cell address '{address}'")]
    InvalidAddress { address: String },
}
