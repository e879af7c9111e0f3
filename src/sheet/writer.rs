use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatPattern, Formula, Workbook as XlsxWorkbook, Worksheet,
    XlsxError,
};

use super::{Cell, CellStyle, CellValue, Workbook};
use crate::error::MappingResult;
use crate::format::builtin_format_code;

impl Workbook {
    /// Serializes the document to `.xlsx` bytes, styles included.
    pub fn to_xlsx_bytes(&self) -> MappingResult<Vec<u8>> {
        let formats: Vec<Format> = (0..self.styles.len())
            .map(|id| self.styles.get(id).map(xlsx_format).unwrap_or_default())
            .collect();
        let default_format = Format::default();

        let mut book = XlsxWorkbook::new();
        for sheet in &self.sheets {
            let worksheet = book.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            for row in &sheet.rows {
                for cell in &row.cells {
                    let format = cell
                        .style_id
                        .and_then(|id| formats.get(id))
                        .unwrap_or(&default_format);
                    self.write_cell(worksheet, row.index, cell, format)?;
                }
            }
        }
        Ok(book.save_to_buffer()?)
    }

    fn write_cell(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        cell: &Cell,
        format: &Format,
    ) -> Result<(), XlsxError> {
        let col = u16::try_from(cell.column).unwrap_or(u16::MAX);
        match &cell.value {
            CellValue::Number(v) => worksheet.write_number_with_format(row, col, *v, format)?,
            CellValue::SharedString(idx) => {
                let text = self.shared_string(*idx).unwrap_or_default();
                worksheet.write_string_with_format(row, col, text, format)?
            }
            CellValue::InlineString(text) => {
                worksheet.write_string_with_format(row, col, text, format)?
            }
            CellValue::Boolean(b) => worksheet.write_boolean_with_format(row, col, *b, format)?,
            CellValue::Formula { formula, cached } => {
                let mut f = Formula::new(formula);
                if let Some(v) = cached {
                    f = f.set_result(v.to_string());
                }
                worksheet.write_formula_with_format(row, col, f, format)?
            }
            CellValue::Error(code) => worksheet.write_string_with_format(row, col, code, format)?,
            CellValue::Blank => worksheet.write_blank(row, col, format)?,
        };
        Ok(())
    }
}

fn xlsx_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    match (&style.format_code, u8::try_from(style.num_fmt_id)) {
        (None, Ok(id)) if id > 0 && builtin_format_code(style.num_fmt_id).is_some() => {
            format = format.set_num_format_index(id);
        }
        _ => {
            let code = style.format_code();
            if !code.eq_ignore_ascii_case("General") {
                format = format.set_num_format(code);
            }
        }
    }
    if let Some(rgb) = style.fill {
        format = format
            .set_background_color(Color::RGB(rgb))
            .set_pattern(FormatPattern::Solid);
    }
    if style.wrap_text {
        format = format
            .set_text_wrap()
            .set_align(FormatAlign::Justify)
            .set_align(FormatAlign::VerticalJustify);
    }
    format
}
