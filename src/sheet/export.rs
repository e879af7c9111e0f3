//! CSV export of a sheet's displayed values.

use std::io::Write;
use std::path::Path;

use super::Workbook;
use crate::error::{MappingError, MappingResult};
use crate::format::{FormatterOptions, ValueFormatter};

/// Writes every row of a sheet as it would be displayed, one CSV record per stored row.
///
/// Rules:
///
/// - Rows absent from the document are not written.
/// - Gaps between cells become empty fields; records are not padded to a common width.
pub fn write_sheet_csv<W: Write>(
    workbook: &Workbook,
    sheet_index: usize,
    formatter: &ValueFormatter,
    wtr: &mut csv::Writer<W>,
) -> MappingResult<()> {
    let sheet = workbook
        .sheet(sheet_index)
        .ok_or_else(|| MappingError::SheetNotFound {
            fragment: format!("#{sheet_index}"),
        })?;

    for row in &sheet.rows {
        let mut record = vec![String::new(); row.next_column() as usize];
        for cell in &row.cells {
            record[cell.column as usize] = formatter.format_cell(workbook, cell);
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Renders a sheet to a CSV string using a CSV-emulating formatter with default options.
pub fn sheet_to_csv_string(workbook: &Workbook, sheet_index: usize) -> MappingResult<String> {
    let formatter = ValueFormatter::new(FormatterOptions::default().csv());
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    write_sheet_csv(workbook, sheet_index, &formatter, &mut wtr)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| MappingError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes a sheet to a CSV file using a CSV-emulating formatter with default options.
pub fn export_sheet_csv(
    workbook: &Workbook,
    sheet_index: usize,
    path: impl AsRef<Path>,
) -> MappingResult<()> {
    let formatter = ValueFormatter::new(FormatterOptions::default().csv());
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    write_sheet_csv(workbook, sheet_index, &formatter, &mut wtr)
}
