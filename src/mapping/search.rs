//! Header-row and column discovery.

use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::format::ValueFormatter;
use crate::sheet::{Cell, Row, Sheet, Workbook};
use crate::types::Field;

/// A sheet together with what is needed to read its cells as displayed text.
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub workbook: &'a Workbook,
    pub sheet: &'a Sheet,
    pub formatter: &'a ValueFormatter,
}

impl<'a> SheetContext<'a> {
    pub fn new(workbook: &'a Workbook, sheet: &'a Sheet, formatter: &'a ValueFormatter) -> Self {
        Self {
            workbook,
            sheet,
            formatter,
        }
    }

    /// Displayed text of a cell.
    pub fn text(&self, cell: &Cell) -> String {
        self.formatter.format_cell(self.workbook, cell)
    }
}

/// Strategy for locating fields in a loosely structured sheet.
///
/// Implementations must be deterministic: when several rows or cells match, the one with the
/// lowest index wins.
pub trait Searcher: Send + Sync {
    /// 0-based index of the header row, or `None` when no row matches any field.
    fn find_header_row(&self, ctx: &SheetContext<'_>, fields: &[Field]) -> Option<u32>;

    /// 0-based column of `field`'s header cell in `header`, or `None` when the field is
    /// absent from this sheet.
    fn find_column(&self, ctx: &SheetContext<'_>, header: &Row, field: &Field) -> Option<u32>;
}

/// Label-matching searcher.
///
/// - A header row is the first row holding at least one string cell whose text equals
///   (ignoring case) the name or a synonym of some field.
/// - A column is the first header cell whose text equals the field's name or a synonym once
///   accents are removed and case is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSearcher;

impl SimpleSearcher {
    pub fn new() -> Self {
        Self
    }
}

impl Searcher for SimpleSearcher {
    fn find_header_row(&self, ctx: &SheetContext<'_>, fields: &[Field]) -> Option<u32> {
        ctx.sheet
            .rows
            .iter()
            .filter(|row| row.cells.iter().any(|c| c.value.is_text()))
            .find(|row| {
                row.cells
                    .par_iter()
                    .filter(|c| c.value.is_text())
                    .any(|cell| {
                        let text = ctx.text(cell);
                        fields
                            .iter()
                            .flat_map(Field::labels)
                            .any(|label| eq_ignore_case(label, &text))
                    })
            })
            .map(|row| row.index)
    }

    fn find_column(&self, ctx: &SheetContext<'_>, header: &Row, field: &Field) -> Option<u32> {
        let labels: Vec<String> = field.labels().map(strip_accents).collect();
        header
            .cells
            .par_iter()
            .find_first(|cell| {
                let text = strip_accents(&ctx.text(cell));
                labels.iter().any(|label| eq_ignore_case(label, &text))
            })
            .map(|cell| cell.column)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Trims `s` and removes combining diacritical marks (`"Número"` becomes `"Numero"`).
pub fn strip_accents(s: &str) -> String {
    s.trim().nfd().filter(|c| !is_combining_mark(*c)).collect()
}
