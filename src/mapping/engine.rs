//! Sheet-to-record mapping.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{MappingError, MappingResult};
use crate::format::ValueFormatter;
use crate::sheet::address::cell_address;
use crate::sheet::{CellValue, Workbook};
use crate::types::{
    CorrectnessLevel, Field, FieldIndex, FieldIndexMap, MapperResponse, RowData, Value,
};

use super::coerce::{CoercionFailure, coerce_cell};
use super::observability::{MappingContext, MappingObserver, MappingSeverity, MappingStats};
use super::populate::{Populate, Validator};
use super::search::{Searcher, SheetContext, SimpleSearcher};

/// Options controlling mapping behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct MapperOptions {
    /// Abort on the first cell that cannot be converted instead of nulling and flagging it.
    pub strict: bool,
    /// Fill (`0xRRGGBB`) for rows that fail validation with ERROR and cells that fail
    /// coercion.
    pub error_fill: u32,
    /// Fill (`0xRRGGBB`) for rows that fail validation with WARN.
    pub warn_fill: u32,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn MappingObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: MappingSeverity,
}

impl fmt::Debug for MapperOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperOptions")
            .field("strict", &self.strict)
            .field("error_fill", &format_args!("{:06X}", self.error_fill))
            .field("warn_fill", &format_args!("{:06X}", self.warn_fill))
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            strict: false,
            error_fill: 0xFF5B5B,
            warn_fill: 0xFFFF00,
            observer: None,
            alert_at_or_above: MappingSeverity::Critical,
        }
    }
}

/// Maps the data rows of a workbook's sheets into typed records.
///
/// The mapper owns the document. Each mapping call starts from a fresh copy of the document
/// as loaded: cells that fail lenient coercion and rows that fail validation are restyled in
/// that copy, and it is serialized into the response whenever validation reported anything
/// other than OK. [`Self::workbook`] shows the copy annotated by the latest call, so mapping
/// twice never stacks observations.
///
/// ```
/// use sheet_mapper::mapping::{MapperOptions, SheetMapper};
/// use sheet_mapper::sheet::{CellValue, Sheet, Workbook};
/// use sheet_mapper::types::{DataType, Field, RowData};
///
/// # fn main() -> Result<(), sheet_mapper::MappingError> {
/// let mut wb = Workbook::new();
/// wb.add_sheet(Sheet::new("Raw Data"));
/// wb.set_text(0, 0, 0, "Amount");
/// wb.sheet_mut(0).unwrap().set(1, 0, CellValue::Number(12.5));
///
/// let mut mapper = SheetMapper::new(wb, MapperOptions::default());
/// let fields = vec![Field::new("amount", DataType::Double)];
/// let populate = |row: &RowData| row.get_f64("amount");
/// let response = mapper.map_sheet_to_records(&fields, "raw", None, &populate)?;
/// assert_eq!(response.records, vec![Some(12.5)]);
/// # Ok(())
/// # }
/// ```
pub struct SheetMapper<S = SimpleSearcher> {
    searcher: S,
    source: Workbook,
    workbook: Workbook,
    formatter: ValueFormatter,
    options: MapperOptions,
    error_style: usize,
    warn_style: usize,
}

impl<S> fmt::Debug for SheetMapper<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetMapper")
            .field("sheets", &self.workbook.sheets.len())
            .field("formatter", &self.formatter)
            .field("options", &self.options)
            .finish()
    }
}

impl SheetMapper<SimpleSearcher> {
    /// Mapper with the label-matching searcher and a default formatter.
    pub fn new(workbook: Workbook, options: MapperOptions) -> Self {
        Self::with_searcher(SimpleSearcher, workbook, ValueFormatter::default(), options)
    }

    /// Loads a workbook from bytes and wraps it in a default mapper.
    #[cfg(feature = "excel")]
    pub fn from_bytes(bytes: &[u8], options: MapperOptions) -> MappingResult<Self> {
        Ok(Self::new(Workbook::from_bytes(bytes)?, options))
    }
}

struct RowOutcome {
    data: RowData,
    failures: Vec<(u32, String, CoercionFailure)>,
}

impl<S: Searcher> SheetMapper<S> {
    /// Registers the error and warning fill styles in the workbook's style table.
    pub fn with_searcher(
        searcher: S,
        mut workbook: Workbook,
        formatter: ValueFormatter,
        options: MapperOptions,
    ) -> Self {
        let error_style = workbook.add_fill_style(options.error_fill);
        let warn_style = workbook.add_fill_style(options.warn_fill);
        Self {
            searcher,
            source: workbook.clone(),
            workbook,
            formatter,
            options,
            error_style,
            warn_style,
        }
    }

    /// The document as annotated by the latest mapping call.
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn formatter(&self) -> &ValueFormatter {
        &self.formatter
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// The document as annotated by the latest mapping call.
    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    /// Finds the first sheet whose name contains `fragment`, its header row, and the data
    /// column of every field present in it. Fields without a matching header are left out.
    pub fn resolve_fields(
        &self,
        fields: &[Field],
        fragment: &str,
    ) -> MappingResult<(usize, u32, FieldIndexMap)> {
        let sheet_index = self.workbook.sheet_index_containing(fragment).ok_or_else(|| {
            MappingError::SheetNotFound {
                fragment: fragment.to_string(),
            }
        })?;
        let sheet = &self.workbook.sheets[sheet_index];
        let ctx = SheetContext::new(&self.workbook, sheet, &self.formatter);

        let header_index = self
            .searcher
            .find_header_row(&ctx, fields)
            .ok_or_else(|| MappingError::HeaderNotFound {
                sheet: sheet.name.clone(),
            })?;
        let header = sheet
            .row(header_index)
            .ok_or_else(|| MappingError::HeaderNotFound {
                sheet: sheet.name.clone(),
            })?;
        debug!(sheet = %sheet.name, row = header_index + 1, "header row found");

        let mut indexes = FieldIndexMap::new();
        for field in fields {
            let Some(column) = self.searcher.find_column(&ctx, header, field) else {
                debug!(field = %field.name, "field not present in header");
                continue;
            };
            let Some(column_index) = column.checked_add_signed(field.column_offset) else {
                warn!(field = %field.name, column, offset = field.column_offset, "column offset points before column A");
                continue;
            };
            indexes.insert(
                column_index,
                FieldIndex {
                    field: field.clone(),
                    sheet_index,
                    row_index: header_index,
                    column_index,
                },
            );
        }
        Ok((sheet_index, header_index, indexes))
    }

    /// Maps every row after the header row of the first sheet whose name contains `fragment`.
    ///
    /// When an observer is configured, this reports:
    ///
    /// - `on_success` when mapping completes, with record count and level
    /// - `on_failure` when mapping aborts, with a computed severity
    /// - `on_alert` when the computed severity is >= `options.alert_at_or_above`
    pub fn map_sheet_to_records<T>(
        &mut self,
        fields: &[Field],
        fragment: &str,
        validator: Option<&dyn Validator<T>>,
        populate: &dyn Populate<T>,
    ) -> MappingResult<MapperResponse<T>> {
        self.workbook.clone_from(&self.source);
        let result = self
            .resolve_fields(fields, fragment)
            .and_then(|(sheet_index, header, indexes)| {
                self.populate_rows(&indexes, sheet_index, header + 1, validator, populate)
            });
        let sheet = self
            .workbook
            .sheet_index_containing(fragment)
            .map(|i| self.workbook.sheets[i].name.clone())
            .unwrap_or_else(|| fragment.to_string());
        self.report(sheet, &result);
        result
    }

    /// Maps the rows of a sheet from explicit column indexes, skipping header search.
    ///
    /// `data_start` is the 1-based number of the first data row.
    pub fn map_with_indexes<T>(
        &mut self,
        indexes: &FieldIndexMap,
        sheet_index: usize,
        data_start: u32,
        validator: Option<&dyn Validator<T>>,
        populate: &dyn Populate<T>,
    ) -> MappingResult<MapperResponse<T>> {
        self.workbook.clone_from(&self.source);
        let result = self.populate_rows(
            indexes,
            sheet_index,
            data_start.saturating_sub(1),
            validator,
            populate,
        );
        let sheet = self
            .workbook
            .sheet(sheet_index)
            .map_or_else(|| format!("#{sheet_index}"), |s| s.name.clone());
        self.report(sheet, &result);
        result
    }

    fn report<T>(&self, sheet: String, result: &MappingResult<MapperResponse<T>>) {
        let Some(obs) = self.options.observer.as_ref() else {
            return;
        };
        let ctx = MappingContext {
            sheet,
            strict: self.options.strict,
        };
        match result {
            Ok(response) => obs.on_success(
                &ctx,
                MappingStats {
                    records: response.success_count,
                    level: response.level,
                    flagged_cells: response.flagged_cells.len(),
                },
            ),
            Err(e) => {
                let sev = MappingSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= self.options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    fn populate_rows<T>(
        &mut self,
        indexes: &FieldIndexMap,
        sheet_index: usize,
        first_row: u32,
        validator: Option<&dyn Validator<T>>,
        populate: &dyn Populate<T>,
    ) -> MappingResult<MapperResponse<T>> {
        let sheet = self
            .workbook
            .sheet(sheet_index)
            .ok_or_else(|| MappingError::SheetNotFound {
                fragment: format!("#{sheet_index}"),
            })?;
        let row_numbers: Vec<u32> = sheet
            .rows
            .iter()
            .map(|r| r.index)
            .filter(|&i| i >= first_row)
            .collect();

        let mut records = Vec::new();
        let mut level = CorrectnessLevel::Ok;
        let mut flagged_cells = Vec::new();

        for row_number in row_numbers {
            let outcome = self.read_row(sheet_index, row_number, indexes);

            for (column, field, failure) in outcome.failures {
                let address = self.flag_cell(sheet_index, row_number, column);
                if self.options.strict {
                    return Err(MappingError::CellCoercion {
                        address,
                        field,
                        raw: failure.raw,
                        message: failure.message,
                    });
                }
                warn!(%address, %field, raw = %failure.raw, message = %failure.message, "cell could not be converted, mapped as empty");
                flagged_cells.push(address);
            }

            if outcome.data.is_blank() {
                continue;
            }

            let record = populate.populate(&outcome.data)?;
            match validator.map(|v| v.validate(&record)) {
                Some(result) if result.level != CorrectnessLevel::Ok => {
                    level = level.combine(result.level);
                    let style = if result.level == CorrectnessLevel::Error {
                        self.error_style
                    } else {
                        self.warn_style
                    };
                    if let Some(row) = self
                        .workbook
                        .sheet_mut(sheet_index)
                        .and_then(|s| s.existing_row_mut(row_number))
                    {
                        row.put_observation(style, &result.message);
                    }
                }
                _ => records.push(record),
            }
        }

        let annotated_document = if level != CorrectnessLevel::Ok {
            Some(self.workbook.to_xlsx_bytes()?)
        } else {
            None
        };

        Ok(MapperResponse {
            success_count: records.len(),
            records,
            level,
            annotated_document,
            flagged_cells,
        })
    }

    fn read_row(&self, sheet_index: usize, row_number: u32, indexes: &FieldIndexMap) -> RowOutcome {
        let mut outcome = RowOutcome {
            data: RowData::new(row_number),
            failures: Vec::new(),
        };
        let Some(row) = self
            .workbook
            .sheet(sheet_index)
            .and_then(|s| s.row(row_number))
        else {
            return outcome;
        };

        for cell in &row.cells {
            if matches!(cell.value, CellValue::Blank) {
                continue;
            }
            let Some(index) = indexes.get(&cell.column) else {
                continue;
            };
            let field = &index.field;
            match coerce_cell(&self.workbook, &self.formatter, cell, field.data_type) {
                Ok(value) => outcome.data.insert(field.name.as_str(), value),
                Err(failure) => {
                    outcome.data.insert(field.name.as_str(), Value::Null);
                    outcome
                        .failures
                        .push((cell.column, field.name.clone(), failure));
                }
            }
        }
        outcome
    }

    /// Restyles a cell with the error fill and returns its address.
    fn flag_cell(&mut self, sheet_index: usize, row_number: u32, column: u32) -> String {
        let style = self.error_style;
        if let Some(cell) = self
            .workbook
            .sheet_mut(sheet_index)
            .and_then(|s| s.existing_row_mut(row_number))
            .and_then(|r| r.cell_mut(column))
        {
            cell.style_id = Some(style);
        }
        cell_address(row_number, column)
    }
}
