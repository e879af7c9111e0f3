use sheet_mapper::MappingError;
use sheet_mapper::format::ValueFormatter;
use sheet_mapper::mapping::{MapperOptions, Searcher, SheetContext, SheetMapper, SimpleSearcher};
use sheet_mapper::sheet::{CellValue, Workbook, Sheet};
use sheet_mapper::types::{
    CorrectnessLevel, DataType, Field, FieldIndex, FieldIndexMap, RowData, ValidationResult,
};

#[derive(Debug, Clone, PartialEq)]
struct Loan {
    contract_id: Option<i64>,
    numero: Option<i64>,
    name: Option<String>,
    amount: Option<f64>,
}

fn populate(row: &RowData) -> Loan {
    Loan {
        contract_id: row.get_i64("contractId"),
        numero: row.get_i64("numero"),
        name: row.get_str("fullName").map(str::to_string),
        amount: row.get_f64("amount"),
    }
}

fn fields() -> Vec<Field> {
    vec![
        Field::new("contractId", DataType::Long).with_synonyms(["Contract Id"]),
        Field::new("numero", DataType::Long),
        Field::new("fullName", DataType::String).with_synonyms(["Full Name", "Nombre"]),
        Field::new("amount", DataType::Double).with_synonyms(["Amount", "Importe"]),
    ]
}

/// Rows (1-based): 2 holds a year, 3 a title, 4 the header, 5-6 loans, 7 only a stray note
/// outside the mapped columns, 8 a small loan.
fn loan_book() -> Workbook {
    let mut wb = Workbook::new();
    wb.add_sheet(Sheet::new("Summary"));
    wb.add_sheet(Sheet::new("Raw Data 2024"));

    wb.sheet_mut(1).unwrap().set(1, 0, CellValue::Number(2024.0));
    wb.set_text(1, 2, 0, "Loan book");
    for (col, label) in ["Contract Id", "Número", "Full Name", "Amount"].iter().enumerate() {
        wb.set_text(1, 3, col as u32, label);
    }

    wb.set_text(1, 4, 2, "Ada");
    wb.set_text(1, 5, 1, "abc");
    wb.set_text(1, 5, 2, "Bob");
    wb.set_text(1, 6, 7, "checked by J.");
    let sheet = wb.sheet_mut(1).unwrap();
    sheet.set(4, 0, CellValue::Number(101.0));
    sheet.set(4, 1, CellValue::Number(5.0));
    sheet.set(4, 3, CellValue::Number(1500.5));
    sheet.set(5, 0, CellValue::Number(102.0));
    sheet.set(5, 3, CellValue::Number(2500.0));
    sheet.set(7, 0, CellValue::Number(103.0));
    sheet.set(7, 3, CellValue::Number(20.0));
    wb
}

fn fill_of(mapper: &SheetMapper, row: u32, col: u32) -> Option<u32> {
    let wb = mapper.workbook();
    let cell = wb.sheet(1)?.cell(row, col)?;
    wb.styles.get(cell.style_id?)?.fill
}

#[test]
fn header_row_skips_numeric_and_unmatched_rows() {
    let wb = loan_book();
    let formatter = ValueFormatter::default();
    let ctx = SheetContext::new(&wb, wb.sheet(1).unwrap(), &formatter);
    assert_eq!(SimpleSearcher.find_header_row(&ctx, &fields()), Some(3));

    let unknown = vec![Field::new("iban", DataType::String).with_synonyms(["IBAN"])];
    assert_eq!(SimpleSearcher.find_header_row(&ctx, &unknown), None);
}

#[test]
fn lenient_mapping_nulls_and_flags_bad_cells() {
    let mut mapper = SheetMapper::new(loan_book(), MapperOptions::default());
    let response = mapper
        .map_sheet_to_records(&fields(), "raw data", None, &populate)
        .unwrap();

    assert_eq!(response.level, CorrectnessLevel::Ok);
    assert_eq!(response.success_count, 3);
    assert_eq!(
        response.records[1],
        Loan {
            contract_id: Some(102),
            numero: None,
            name: Some("Bob".to_string()),
            amount: Some(2500.0),
        }
    );
    assert_eq!(response.records[0].numero, Some(5));
    assert_eq!(response.flagged_cells, vec!["B6".to_string()]);
    assert!(response.annotated_document.is_none());
    assert_eq!(fill_of(&mapper, 5, 1), Some(0xFF5B5B));
    assert_eq!(fill_of(&mapper, 5, 0), None);
}

#[test]
fn strict_mapping_aborts_on_the_bad_cell() {
    let options = MapperOptions {
        strict: true,
        ..Default::default()
    };
    let mut mapper = SheetMapper::new(loan_book(), options);
    let err = mapper
        .map_sheet_to_records(&fields(), "raw data", None, &populate)
        .unwrap_err();

    match err {
        MappingError::CellCoercion {
            address,
            field,
            raw,
            ..
        } => {
            assert_eq!(address, "B6");
            assert_eq!(field, "numero");
            assert_eq!(raw, "abc");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_rows_are_annotated_and_excluded() {
    let validator = |loan: &Loan| match loan.amount {
        Some(a) if a < 100.0 => ValidationResult::error("amount below minimum"),
        _ if loan.numero.is_none() => ValidationResult::warn("missing numero"),
        _ => ValidationResult::ok(),
    };
    let mut mapper = SheetMapper::new(loan_book(), MapperOptions::default());
    let response = mapper
        .map_sheet_to_records(&fields(), "RAW", Some(&validator), &populate)
        .unwrap();

    assert_eq!(response.level, CorrectnessLevel::Error);
    assert_eq!(response.success_count, 1);
    assert_eq!(response.records[0].contract_id, Some(101));
    assert!(response.annotated_document.is_some());

    let sheet = mapper.workbook().sheet(1).unwrap();
    let small = sheet.row(7).unwrap();
    let note = small.cells.last().unwrap();
    assert_eq!(note.address, "E8");
    assert_eq!(note.value, CellValue::InlineString("amount below minimum".to_string()));
    assert_eq!(fill_of(&mapper, 7, 0), Some(0xFF5B5B));
    assert_eq!(fill_of(&mapper, 7, 3), Some(0xFF5B5B));

    let warned = sheet.row(5).unwrap();
    assert_eq!(
        warned.cells.last().unwrap().value,
        CellValue::InlineString("missing numero".to_string())
    );
    assert_eq!(fill_of(&mapper, 5, 2), Some(0xFFFF00));

    // Rows outside the mapped columns are never validated or annotated.
    assert_eq!(sheet.row(6).unwrap().cells.len(), 1);
}

#[test]
fn warnings_only_raise_the_level_to_warn() {
    let validator = |loan: &Loan| {
        if loan.numero.is_none() {
            ValidationResult::warn("missing numero")
        } else {
            ValidationResult::ok()
        }
    };
    let mut mapper = SheetMapper::new(loan_book(), MapperOptions::default());
    let response = mapper
        .map_sheet_to_records(&fields(), "raw", Some(&validator), &populate)
        .unwrap();
    assert_eq!(response.level, CorrectnessLevel::Warn);
    assert_eq!(response.success_count, 1);
    assert!(response.annotated_document.is_some());
}

#[test]
fn explicit_indexes_skip_the_header_search() {
    let field = Field::new("amount", DataType::Double);
    let mut indexes = FieldIndexMap::new();
    indexes.insert(
        3,
        FieldIndex {
            field,
            sheet_index: 1,
            row_index: 3,
            column_index: 3,
        },
    );

    let mut mapper = SheetMapper::new(loan_book(), MapperOptions::default());
    let response = mapper
        .map_with_indexes(&indexes, 1, 6, None, &|row: &RowData| row.get_f64("amount"))
        .unwrap();
    assert_eq!(response.records, vec![Some(2500.0), Some(20.0)]);
}

#[test]
fn column_offset_reads_beside_the_label() {
    let mut wb = Workbook::new();
    wb.add_sheet(Sheet::new("Data"));
    wb.set_text(0, 0, 0, "Total");
    wb.sheet_mut(0).unwrap().set(1, 1, CellValue::Number(99.0));

    let total = Field::new("total", DataType::Int).with_column_offset(1);
    let mut mapper = SheetMapper::new(wb, MapperOptions::default());
    let (_, header, indexes) = mapper.resolve_fields(&[total.clone()], "data").unwrap();
    assert_eq!(header, 0);
    assert_eq!(indexes[&1].column_index, 1);

    let response = mapper
        .map_sheet_to_records(&[total], "data", None, &|row: &RowData| row.get_i64("total"))
        .unwrap();
    assert_eq!(response.records, vec![Some(99)]);
}

#[test]
fn missing_sheet_or_header_is_an_error() {
    let mut mapper = SheetMapper::new(loan_book(), MapperOptions::default());
    let err = mapper
        .map_sheet_to_records(&fields(), "payments", None, &populate)
        .unwrap_err();
    assert!(matches!(err, MappingError::SheetNotFound { fragment } if fragment == "payments"));

    let err = mapper
        .map_sheet_to_records(&fields(), "summary", None, &populate)
        .unwrap_err();
    assert!(matches!(err, MappingError::HeaderNotFound { sheet } if sheet == "Summary"));
}

#[test]
fn dates_map_from_serials_and_text() {
    let mut wb = Workbook::new();
    wb.add_sheet(Sheet::new("Dates"));
    wb.set_text(0, 0, 0, "When");
    wb.sheet_mut(0).unwrap().set(1, 0, CellValue::Number(45356.0));
    wb.set_text(0, 2, 0, "06/03/2024");
    wb.set_text(0, 3, 0, "someday");

    let when = Field::new("when", DataType::Date);
    let mut mapper = SheetMapper::new(wb, MapperOptions::default());
    let response = mapper
        .map_sheet_to_records(&[when], "dates", None, &|row: &RowData| row.get_date("when"))
        .unwrap();

    let day = |d| chrono::NaiveDate::from_ymd_opt(2024, 3, d);
    assert_eq!(response.records, vec![day(5), day(6)]);
    assert_eq!(response.flagged_cells, vec!["A4".to_string()]);
}

#[test]
fn mapping_twice_annotates_each_run_once() {
    let validator = |loan: &Loan| match loan.amount {
        Some(a) if a < 100.0 => ValidationResult::error("amount below minimum"),
        _ => ValidationResult::ok(),
    };
    let mut mapper = SheetMapper::new(loan_book(), MapperOptions::default());
    let first = mapper
        .map_sheet_to_records(&fields(), "raw", Some(&validator), &populate)
        .unwrap();
    let styles = mapper.workbook().styles.len();
    let second = mapper
        .map_sheet_to_records(&fields(), "raw", Some(&validator), &populate)
        .unwrap();

    assert_eq!((first.level, first.success_count), (second.level, second.success_count));
    assert_eq!(mapper.workbook().styles.len(), styles);
    let small = mapper.workbook().sheet(1).unwrap().row(7).unwrap();
    assert_eq!(small.cells.len(), 3);
    assert_eq!(
        small.cells.last().unwrap().value,
        CellValue::InlineString("amount below minimum".to_string())
    );
}
