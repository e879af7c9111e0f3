use sheet_mapper::format::{DateSystem, FormatterOptions, Locale, ValueFormatter};

fn serial(days: f64, h: f64, m: f64, s: f64) -> f64 {
    days + (h * 3600.0 + m * 60.0 + s) / 86400.0
}

#[test]
fn date_codes_render_golden_values() {
    let f = ValueFormatter::default();
    // 2024-03-05 13:05:09
    let v = serial(45356.0, 13.0, 5.0, 9.0);

    let cases = [
        ("mm/dd/yyyy", "03/05/2024"),
        ("dd/mm/yyyy", "05/03/2024"),
        ("yyyy-mm-dd", "2024-03-05"),
        ("d-mmm-yy", "5-Mar-24"),
        ("h:mm:ss", "13:05:09"),
        ("h:mm:ss AM/PM", "1:05:09 PM"),
        ("h:mm AM/PM", "1:05 PM"),
        ("yyyy-mm-dd hh:mm", "2024-03-05 13:05"),
        ("[h]:mm:ss", "1088557:05:09"),
        ("[$-409]mmmm d, yyyy", "March 5, 2024"),
        ("[Red]dd/mm/yyyy", "05/03/2024"),
    ];
    for (code, expected) in cases {
        assert_eq!(f.format_value(v, code), expected, "code {code}");
    }
}

#[test]
fn builtin_date_ids_render_without_a_code() {
    let f = ValueFormatter::default();
    assert_eq!(f.render(45356.0, 14, ""), "3/5/24");
    assert_eq!(f.render(serial(0.0, 13.0, 5.0, 0.0), 18, ""), "1:05 PM");
}

#[test]
fn invalid_date_serial_renders_hash_sentinel() {
    let f = ValueFormatter::default();
    let out = f.format_value(-1.0, "dd/mm/yyyy");
    assert_eq!(out.len(), 255);
    assert!(out.chars().all(|c| c == '#'));

    assert_eq!(f.render(-5.0, 14, ""), "#".repeat(255));
    assert_eq!(f.format_value(3_000_000.0, "yyyy"), "#".repeat(255));

    let csv = ValueFormatter::new(FormatterOptions::default().csv());
    assert_eq!(csv.format_value(-1.0, "mm/dd/yyyy"), "#".repeat(255));
}

#[test]
fn hash_only_zero_depends_on_csv_mode() {
    let plain = ValueFormatter::default();
    let csv = ValueFormatter::new(FormatterOptions::default().csv());

    assert_eq!(plain.format_value(0.0, "#"), "0");
    assert_eq!(csv.format_value(0.0, "#"), "");
    assert_eq!(csv.format_value(0.0, "#,###"), "");
    // Rendering again gives the same answer in each mode.
    assert_eq!(plain.format_value(0.0, "#"), "0");
    assert_eq!(csv.format_value(0.0, "#"), "");
    // A `0` placeholder always shows the zero.
    assert_eq!(csv.format_value(0.0, "#,##0"), "0");
    assert_eq!(csv.format_value(7.0, "#"), "7");
}

#[test]
fn number_codes() {
    let f = ValueFormatter::default();
    assert_eq!(f.format_value(1234.5, "#,##0.00"), "1,234.50");
    assert_eq!(f.format_value(-1234.5, "#,##0.00;(#,##0.00)"), "(1,234.50)");
    assert_eq!(f.format_value(0.4567, "0.0%"), "45.7%");
    assert_eq!(f.format_value(123456.0, "0.00E+00"), "1.23E+05");
    assert_eq!(f.format_value(2.5, "[Blue]0"), "3");
    assert_eq!(f.format_value(19.99, "[$€-407] #,##0.00"), "€ 19.99");
    assert_eq!(f.format_value(42.0, "General"), "42");
    assert_eq!(f.format_value(0.75, "# ?/?"), "3/4");
    assert_eq!(f.format_value(2.75, "# ?/4"), "2 3/4");
}

#[test]
fn builtin_templates() {
    let f = ValueFormatter::default();
    assert_eq!(f.format_value(123456789.0, "000-00-0000"), "123-45-6789");
    assert_eq!(f.format_value(12345.0, "00000-0000"), "00001-2345");
    assert_eq!(f.format_value(5551234.0, "###-####;(###) ###-####"), "555-1234");
    assert_eq!(f.format_value(8005551234.0, "###-####;(###) ###-####"), "(800) 555-1234");
}

#[test]
fn three_section_codes_fall_back_to_general() {
    let f = ValueFormatter::default();
    assert_eq!(f.format_value(-3.5, "0.00;[Red]-0.00;\"zero\""), "-3.5");
    assert_eq!(f.format_value(0.0, "0.00;-0.00;\"zero\""), "0");
}

#[test]
fn text_only_codes() {
    let plain = ValueFormatter::default();
    let csv = ValueFormatter::new(FormatterOptions::default().csv());
    assert_eq!(plain.format_value(3.25, "\"n/a\""), "3.25");
    assert_eq!(csv.format_value(3.25, "\"n/a\""), "n/a");
    assert_eq!(csv.format_value(3.25, "_(\"-\"_)"), " - ");
}

#[test]
fn spanish_locale() {
    let f = ValueFormatter::new(FormatterOptions::default().with_locale(Locale::EsEs));
    assert_eq!(f.format_value(1234.5, "#,##0.00"), "1.234,50");
    assert_eq!(f.format_value(45356.0, "d mmmm yyyy"), "5 marzo 2024");
    assert_eq!(f.format_value(1.5, "General"), "1,5");
}

#[test]
fn date_systems() {
    let f1904 =
        ValueFormatter::new(FormatterOptions::default().with_date_system(DateSystem::Excel1904));
    assert_eq!(f1904.format_value(43894.0, "yyyy-mm-dd"), "2024-03-05");
    assert_eq!(f1904.format_value(0.0, "yyyy-mm-dd"), "1904-01-01");

    let f1900 = ValueFormatter::default();
    assert_eq!(f1900.format_value(60.0, "yyyy-mm-dd"), "1900-02-29");
    assert_eq!(DateSystem::Excel1900.to_date(60.0), None);
    assert_eq!(
        DateSystem::Excel1900.to_date(61.0),
        chrono::NaiveDate::from_ymd_opt(1900, 3, 1)
    );
}
