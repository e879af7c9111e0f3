//! In-memory spreadsheet document.
//!
//! The mapper reads raw cell values, type tags and style ids from this model, restyles
//! cells and appends observation cells to annotate rows, then serializes the whole document
//! back to `.xlsx` bytes.
//!
//! - Reading `.xlsx` / `.xls` / `.ods` is behind the `excel` feature (`calamine`, with
//!   `.xlsx` cell formats taken from the package through `zip` and `roxmltree`).
//! - Writing uses `rust_xlsxwriter` and is always available.

pub mod address;
pub mod export;
#[cfg(feature = "excel")]
pub mod reader;
#[cfg(feature = "excel")]
mod styles;
mod writer;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::format::builtin_format_code;
use address::cell_address;

/// Type tag of a raw cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Numeric,
    SharedString,
    InlineString,
    Boolean,
    Formula,
    Error,
    Blank,
}

/// Raw cell content as stored in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    /// Index into [`Workbook::shared_strings`].
    SharedString(usize),
    InlineString(String),
    Boolean(bool),
    Formula {
        formula: String,
        cached: Option<f64>,
    },
    /// Error code such as `#DIV/0!`.
    Error(String),
    Blank,
}

impl CellValue {
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Number(_) => CellType::Numeric,
            CellValue::SharedString(_) => CellType::SharedString,
            CellValue::InlineString(_) => CellType::InlineString,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Formula { .. } => CellType::Formula,
            CellValue::Error(_) => CellType::Error,
            CellValue::Blank => CellType::Blank,
        }
    }

    /// Shared or inline string.
    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::SharedString(_) | CellValue::InlineString(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub address: String,
    /// 0-based column.
    pub column: u32,
    pub value: CellValue,
    pub style_id: Option<usize>,
}

impl Cell {
    pub fn new(row: u32, column: u32, value: CellValue) -> Self {
        Self {
            address: cell_address(row, column),
            column,
            value,
            style_id: None,
        }
    }

    pub fn with_style(mut self, style_id: usize) -> Self {
        self.style_id = Some(style_id);
        self
    }
}

/// A row with its cells ordered by column. Missing columns are simply absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// 0-based row number.
    pub index: u32,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cells: Vec::new(),
        }
    }

    pub fn cell(&self, column: u32) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&column, |c| c.column)
            .ok()
            .map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, column: u32) -> Option<&mut Cell> {
        self.cells
            .binary_search_by_key(&column, |c| c.column)
            .ok()
            .map(|i| &mut self.cells[i])
    }

    /// Inserts or replaces the cell at `column`, keeping column order.
    pub fn set(&mut self, column: u32, value: CellValue, style_id: Option<usize>) {
        let mut cell = Cell::new(self.index, column, value);
        cell.style_id = style_id;
        match self.cells.binary_search_by_key(&column, |c| c.column) {
            Ok(i) => self.cells[i] = cell,
            Err(i) => self.cells.insert(i, cell),
        }
    }

    /// Column just past the last cell.
    pub fn next_column(&self) -> u32 {
        self.cells.last().map_or(0, |c| c.column + 1)
    }

    pub fn set_style_all(&mut self, style_id: usize) {
        for cell in &mut self.cells {
            cell.style_id = Some(style_id);
        }
    }

    /// Restyles every cell and appends `text` as an inline-string cell after the last one.
    pub fn put_observation(&mut self, style_id: usize, text: &str) {
        self.set_style_all(style_id);
        let column = self.next_column();
        self.set(column, CellValue::InlineString(text.to_string()), None);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    /// Rows in ascending index order; empty rows may be absent.
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows
            .binary_search_by_key(&index, |r| r.index)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn existing_row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows
            .binary_search_by_key(&index, |r| r.index)
            .ok()
            .map(|i| &mut self.rows[i])
    }

    /// The row at `index`, created if absent.
    pub fn row_mut(&mut self, index: u32) -> &mut Row {
        let pos = match self.rows.binary_search_by_key(&index, |r| r.index) {
            Ok(i) => i,
            Err(i) => {
                self.rows.insert(i, Row::new(index));
                i
            }
        };
        &mut self.rows[pos]
    }

    pub fn set(&mut self, row: u32, column: u32, value: CellValue) {
        self.row_mut(row).set(column, value, None);
    }

    pub fn set_styled(&mut self, row: u32, column: u32, value: CellValue, style_id: usize) {
        self.row_mut(row).set(column, value, Some(style_id));
    }

    pub fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
        self.row(row).and_then(|r| r.cell(column))
    }
}

/// A cell style: number format plus an optional solid fill.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub num_fmt_id: u32,
    /// Custom format code; builtin ids resolve through the builtin table when absent.
    pub format_code: Option<String>,
    /// Solid fill as `0xRRGGBB`.
    pub fill: Option<u32>,
    pub wrap_text: bool,
}

impl CellStyle {
    pub fn with_format(code: impl Into<String>) -> Self {
        Self {
            num_fmt_id: 164,
            format_code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn builtin(num_fmt_id: u32) -> Self {
        Self {
            num_fmt_id,
            ..Self::default()
        }
    }

    /// Effective format code.
    pub fn format_code(&self) -> &str {
        self.format_code
            .as_deref()
            .or_else(|| builtin_format_code(self.num_fmt_id))
            .unwrap_or("General")
    }
}

/// Style table addressed by style id; id 0 is the default style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTable {
    styles: Vec<CellStyle>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            styles: vec![CellStyle::default()],
        }
    }
}

impl StyleTable {
    pub fn get(&self, id: usize) -> Option<&CellStyle> {
        self.styles.get(id)
    }

    pub fn add(&mut self, style: CellStyle) -> usize {
        self.styles.push(style);
        self.styles.len() - 1
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub styles: StyleTable,
    shared_strings: Vec<String>,
    string_index: HashMap<String, usize>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// First sheet whose name contains `fragment`, ignoring case.
    pub fn sheet_index_containing(&self, fragment: &str) -> Option<usize> {
        let needle = fragment.to_lowercase();
        self.sheets
            .iter()
            .position(|s| s.name.to_lowercase().contains(&needle))
    }

    pub fn shared_string(&self, index: usize) -> Option<&str> {
        self.shared_strings.get(index).map(String::as_str)
    }

    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }

    /// Index of `text` in the shared-string table, adding it when new.
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(&i) = self.string_index.get(text) {
            return i;
        }
        let i = self.shared_strings.len();
        self.shared_strings.push(text.to_string());
        self.string_index.insert(text.to_string(), i);
        i
    }

    /// Writes `text` as a shared-string cell.
    pub fn set_text(&mut self, sheet: usize, row: u32, column: u32, text: &str) {
        let idx = self.intern(text);
        if let Some(s) = self.sheets.get_mut(sheet) {
            s.set(row, column, CellValue::SharedString(idx));
        }
    }

    pub fn add_style(&mut self, style: CellStyle) -> usize {
        self.styles.add(style)
    }

    /// Adds a wrapped, solid-fill style (`0xRRGGBB`) used to highlight annotated rows.
    pub fn add_fill_style(&mut self, rgb: u32) -> usize {
        self.styles.add(CellStyle {
            fill: Some(rgb),
            wrap_text: true,
            ..CellStyle::default()
        })
    }

    /// Builtin format id and effective format code for a style id.
    pub fn number_format(&self, style_id: Option<usize>) -> (u32, String) {
        match style_id.and_then(|id| self.styles.get(id)) {
            Some(style) => (style.num_fmt_id, style.format_code().to_string()),
            None => (0, "General".to_string()),
        }
    }

    /// Text of a string cell.
    pub fn text_of<'a>(&'a self, value: &'a CellValue) -> Option<&'a str> {
        match value {
            CellValue::SharedString(i) => self.shared_string(*i),
            CellValue::InlineString(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_cells_stay_ordered() {
        let mut sheet = Sheet::new("Data");
        sheet.set(3, 2, CellValue::Number(1.0));
        sheet.set(1, 5, CellValue::Number(2.0));
        sheet.set(3, 0, CellValue::Boolean(true));

        assert_eq!(sheet.rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 3]);
        let row = sheet.row(3).unwrap();
        assert_eq!(row.cells[0].address, "A4");
        assert_eq!(row.cells[1].address, "C4");
        assert_eq!(row.next_column(), 3);
    }

    #[test]
    fn observation_goes_after_the_last_cell() {
        let mut row = Row::new(0);
        row.set(0, CellValue::Number(1.0), None);
        row.set(3, CellValue::Number(2.0), Some(1));
        row.put_observation(7, "bad row");

        assert!(row.cells[..2].iter().all(|c| c.style_id == Some(7)));
        let last = row.cells.last().unwrap();
        assert_eq!(last.address, "E1");
        assert_eq!(last.value, CellValue::InlineString("bad row".to_string()));
        assert_eq!(last.value.cell_type(), CellType::InlineString);
    }

    #[test]
    fn sheet_selection_ignores_case() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("Summary"));
        wb.add_sheet(Sheet::new("RAW DATA 2024"));
        assert_eq!(wb.sheet_index_containing("Raw Data"), Some(1));
        assert_eq!(wb.sheet_index_containing("missing"), None);
    }

    #[test]
    fn interning_reuses_indexes() {
        let mut wb = Workbook::new();
        let names: Vec<String> = (0..5000).map(|i| format!("client {i}")).collect();
        let first: Vec<usize> = names.iter().map(|n| wb.intern(n)).collect();
        let again: Vec<usize> = names.iter().rev().map(|n| wb.intern(n)).collect();

        assert_eq!(first, (0..5000).collect::<Vec<_>>());
        assert_eq!(again, (0..5000).rev().collect::<Vec<_>>());
        assert_eq!(wb.shared_strings().len(), 5000);
        assert_eq!(wb.shared_string(4999), Some("client 4999"));
    }

    #[test]
    fn number_format_resolves_builtin_ids() {
        let mut wb = Workbook::new();
        let date = wb.add_style(CellStyle::builtin(14));
        let custom = wb.add_style(CellStyle::with_format("0.0%"));
        assert_eq!(wb.number_format(Some(date)), (14, "m/d/yy".to_string()));
        assert_eq!(wb.number_format(Some(custom)), (164, "0.0%".to_string()));
        assert_eq!(wb.number_format(None), (0, "General".to_string()));
    }
}
