#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook};

use sheet_mapper::catalog::raw_data::{RawDataRecord, map_raw_data};
use sheet_mapper::format::ValueFormatter;
use sheet_mapper::mapping::{MapperOptions, SheetMapper};
use sheet_mapper::sheet::export::sheet_to_csv_string;
use sheet_mapper::sheet::{CellValue, Sheet, Workbook};
use sheet_mapper::types::CorrectnessLevel;

/// A loan tape with a title row, a header on row 2 and three loans; the second loan has
/// neither a contract id nor a product.
fn loan_tape_bytes() -> Vec<u8> {
    let mut wb = XlsxWorkbook::new();
    wb.add_worksheet().set_name("Summary").unwrap();
    let ws = wb.add_worksheet();
    ws.set_name("Raw Data").unwrap();
    let date = Format::new().set_num_format("dd/mm/yyyy");

    ws.write_string(0, 0, "Loan tape, March").unwrap();
    let headers = [
        "Report Date",
        "Product",
        "Contract Id",
        "Full Name",
        "Loan Amount",
        "Term Months",
        "APR",
    ];
    for (col, h) in headers.iter().enumerate() {
        ws.write_string(1, col as u16, *h).unwrap();
    }

    ws.write_number_with_format(2, 0, 45356.0, &date).unwrap();
    ws.write_string(2, 1, "Nano").unwrap();
    ws.write_number(2, 2, 9001).unwrap();
    ws.write_string(2, 3, "Ada Lovelace").unwrap();
    ws.write_number(2, 4, 1500).unwrap();
    ws.write_number(2, 5, 12).unwrap();
    ws.write_string(2, 6, "35%").unwrap();

    ws.write_number_with_format(3, 0, 45356.0, &date).unwrap();
    ws.write_number(3, 2, 0).unwrap();
    ws.write_string(3, 3, "Nobody").unwrap();

    ws.write_string(4, 0, "06-03-2024").unwrap();
    ws.write_string(4, 1, "Micro").unwrap();
    ws.write_number(4, 2, 9002).unwrap();
    ws.write_string(4, 3, "Grace Hopper").unwrap();
    ws.write_string(4, 5, "six").unwrap();

    wb.save_to_buffer().unwrap()
}

#[test]
fn raw_data_sheet_maps_and_annotates() {
    let mut mapper = SheetMapper::from_bytes(&loan_tape_bytes(), MapperOptions::default()).unwrap();
    let response = map_raw_data(&mut mapper).unwrap();

    assert_eq!(response.level, CorrectnessLevel::Error);
    assert_eq!(response.success_count, 2);
    assert_eq!(
        response.records[0],
        RawDataRecord {
            report_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            product: Some("Nano".to_string()),
            contract_id: Some(9001),
            full_name: Some("Ada Lovelace".to_string()),
            loan_amount: Some(1500),
            term_months: Some(12),
            apr: Some("35%".to_string()),
            ..Default::default()
        }
    );
    let grace = &response.records[1];
    assert_eq!(grace.report_date, NaiveDate::from_ymd_opt(2024, 3, 6));
    assert_eq!(grace.term_months, None);
    assert_eq!(response.flagged_cells, vec!["F5".to_string()]);

    let annotated = response.annotated_document.expect("annotated document");
    let mut reread = open_workbook_auto_from_rs(Cursor::new(annotated)).unwrap();
    let range = reread.worksheet_range("Raw Data").unwrap();
    assert_eq!(
        range.get_value((3, 4)),
        Some(&Data::String("missing contract id and product".to_string()))
    );
    assert_eq!(range.get_value((2, 7)), None);
}

#[test]
fn written_documents_read_back() {
    let mut wb = Workbook::new();
    wb.add_sheet(Sheet::new("Data"));
    let pct = wb.add_style(sheet_mapper::sheet::CellStyle::with_format("0.0%"));
    wb.set_text(0, 0, 0, "rate");
    wb.set_text(0, 0, 1, "ok");
    let sheet = wb.sheet_mut(0).unwrap();
    sheet.set_styled(1, 0, CellValue::Number(0.125), pct);
    sheet.set(1, 1, CellValue::Boolean(true));

    let bytes = wb.to_xlsx_bytes().unwrap();
    let back = Workbook::from_bytes(&bytes).unwrap();
    let data = back.sheet(0).unwrap();
    assert_eq!(data.name, "Data");
    assert_eq!(data.cell(1, 0).unwrap().value, CellValue::Number(0.125));
    assert_eq!(back.number_format(data.cell(1, 0).unwrap().style_id).1, "0.0%");
    assert_eq!(data.cell(1, 1).unwrap().value, CellValue::Boolean(true));
    assert_eq!(back.text_of(&data.cell(0, 1).unwrap().value), Some("ok"));
}

#[test]
fn loaded_cells_export_with_their_formats() {
    let back = Workbook::from_bytes(&loan_tape_bytes()).unwrap();
    let csv = sheet_to_csv_string(&back, 1).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "\"Loan tape, March\"");
    assert_eq!(lines[2], "05/03/2024,Nano,9001,Ada Lovelace,1500,12,35%");
}

fn formatted_bytes() -> Vec<u8> {
    let mut wb = XlsxWorkbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Formats").unwrap();
    ws.write_number_with_format(0, 0, 0.125, &Format::new().set_num_format("0.0%"))
        .unwrap();
    ws.write_number_with_format(0, 1, 45356.0, &Format::new().set_num_format("dd/mm/yyyy"))
        .unwrap();
    ws.write_number_with_format(0, 2, 123456789.0, &Format::new().set_num_format("000-00-0000"))
        .unwrap();
    ws.write_number_with_format(0, 3, 0.5, &Format::new().set_num_format("0.00%"))
        .unwrap();
    ws.write_formula(0, 4, Formula::new("=A1*2").set_result("0.25"))
        .unwrap();
    wb.save_to_buffer().unwrap()
}

fn assert_formats_kept(wb: &Workbook) {
    let f = ValueFormatter::default();
    let sheet = wb.sheet(0).unwrap();
    let shown = |col: u32| f.format_cell(wb, sheet.cell(0, col).unwrap());
    let code = |col: u32| wb.number_format(sheet.cell(0, col).unwrap().style_id).1;

    assert_eq!(shown(0), "12.5%");
    assert_eq!(shown(1), "05/03/2024");
    assert_eq!(shown(2), "123-45-6789");
    assert_eq!(shown(3), "50.00%");
    assert_eq!(code(0), "0.0%");
    assert_eq!(code(1), "dd/mm/yyyy");
    assert_eq!(code(2), "000-00-0000");
    assert_eq!(code(3), "0.00%");
    assert_eq!(
        sheet.cell(0, 4).unwrap().value,
        CellValue::Formula {
            formula: "A1*2".to_string(),
            cached: Some(0.25),
        }
    );
}

#[test]
fn number_formats_and_formulas_survive_load_and_write() {
    let loaded = Workbook::from_bytes(&formatted_bytes()).unwrap();
    assert_formats_kept(&loaded);

    let rewritten = Workbook::from_bytes(&loaded.to_xlsx_bytes().unwrap()).unwrap();
    assert_formats_kept(&rewritten);
}
