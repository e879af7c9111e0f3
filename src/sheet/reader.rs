//! Loading workbooks into the in-memory model (feature `excel`).

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto_from_rs};
use tracing::debug;

use super::styles::PackageStyles;
use super::{CellStyle, CellValue, Sheet, Workbook};
use crate::error::MappingResult;

const DATE_CODE: &str = "yyyy-mm-dd";
const DATE_TIME_CODE: &str = "yyyy-mm-dd hh:mm:ss";

impl Workbook {
    /// Reads every sheet of an `.xlsx`, `.xls` or `.ods` file.
    pub fn from_path(path: impl AsRef<Path>) -> MappingResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Reads every sheet of a workbook held in memory.
    ///
    /// For `.xlsx` packages each cell keeps its number format, fill and wrapping, and
    /// formula cells keep their formula. Other formats only mark date cells with an ISO
    /// date style.
    pub fn from_bytes(bytes: &[u8]) -> MappingResult<Self> {
        let styles = match PackageStyles::read(bytes) {
            Ok(styles) => Some(styles),
            Err(e) => {
                debug!(error = %e, "no xlsx cell formats, dates get an ISO style");
                None
            }
        };
        let mut source = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        load(&mut source, styles.as_ref())
    }
}

/// Maps package xf indexes to style ids, adding each style on first use.
struct StyleMap<'a> {
    package: Option<&'a PackageStyles>,
    by_xf: HashMap<usize, Option<usize>>,
    date: Option<usize>,
    date_time: Option<usize>,
}

impl StyleMap<'_> {
    fn for_xf(&mut self, book: &mut Workbook, xf: usize) -> Option<usize> {
        let package = self.package?;
        *self.by_xf.entry(xf).or_insert_with(|| {
            let style = package.xfs.get(xf)?;
            (*style != CellStyle::default()).then(|| book.add_style(style.clone()))
        })
    }

    /// Style of a cell at an absolute position.
    fn for_cell(&mut self, book: &mut Workbook, sheet: &str, row: u32, column: u32) -> Option<usize> {
        let xf = self.package?.xf_of(sheet, row, column)?;
        self.for_xf(book, xf)
    }

    /// Date cells keep their serial; without package styles they need a date style to
    /// render as dates.
    fn for_date(&mut self, book: &mut Workbook, serial: f64) -> usize {
        let (slot, code) = if serial.fract() == 0.0 {
            (&mut self.date, DATE_CODE)
        } else {
            (&mut self.date_time, DATE_TIME_CODE)
        };
        *slot.get_or_insert_with(|| book.add_style(CellStyle::with_format(code)))
    }
}

fn cached_number(data: &Data) -> Option<f64> {
    match data {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::DateTime(dt) => Some(dt.as_f64()),
        Data::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

/// Formula text by absolute `(row, column)`. Readers without formula support yield none.
fn read_formulas<RS: Read + Seek>(source: &mut Sheets<RS>, name: &str) -> HashMap<(u32, u32), String> {
    let range = match source.worksheet_formula(name) {
        Ok(range) => range,
        Err(e) => {
            debug!(sheet = %name, error = %e, "formulas not available");
            return HashMap::new();
        }
    };
    let (row0, col0) = range.start().unwrap_or((0, 0));
    range
        .used_cells()
        .filter(|(_, _, f)| !f.is_empty())
        .map(|(r, c, f)| ((row0 + r as u32, col0 + c as u32), f.clone()))
        .collect()
}

fn load<RS: Read + Seek>(
    source: &mut Sheets<RS>,
    package: Option<&PackageStyles>,
) -> MappingResult<Workbook> {
    let mut book = Workbook::new();
    let mut styles = StyleMap {
        package,
        by_xf: HashMap::new(),
        date: None,
        date_time: None,
    };

    for name in source.sheet_names().to_vec() {
        let range = source.worksheet_range(&name)?;
        let mut formulas = read_formulas(source, &name);
        let (row0, col0) = range.start().unwrap_or((0, 0));
        let mut sheet = Sheet::new(name.as_str());

        for (r, c, data) in range.used_cells() {
            let row = row0 + r as u32;
            let column = col0 + c as u32;
            let mut style = styles.for_cell(&mut book, &name, row, column);

            let value = if let Some(formula) = formulas.remove(&(row, column)) {
                CellValue::Formula {
                    formula,
                    cached: cached_number(data),
                }
            } else {
                match data {
                    Data::Int(i) => CellValue::Number(*i as f64),
                    Data::Float(f) => CellValue::Number(*f),
                    Data::String(s) => CellValue::SharedString(book.intern(s)),
                    Data::Bool(b) => CellValue::Boolean(*b),
                    Data::DateTime(dt) => {
                        let serial = dt.as_f64();
                        if style.is_none() {
                            style = Some(styles.for_date(&mut book, serial));
                        }
                        CellValue::Number(serial)
                    }
                    Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::InlineString(s.clone()),
                    Data::Error(e) => CellValue::Error(e.to_string()),
                    Data::Empty => continue,
                }
            };
            sheet.row_mut(row).set(column, value, style);
        }

        // Formulas whose cached value is empty.
        for ((row, column), formula) in formulas {
            let style = styles.for_cell(&mut book, &name, row, column);
            sheet.row_mut(row).set(column, CellValue::Formula { formula, cached: None }, style);
        }

        debug!(sheet = %name, rows = sheet.rows.len(), "loaded sheet");
        book.add_sheet(sheet);
    }
    Ok(book)
}
