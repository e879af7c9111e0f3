//! Fixed-pattern digit formatters and the builtin number-format table.

use serde::{Deserialize, Serialize};

/// Spreadsheet builtin formats that are rendered by splitting the digits of the integer
/// value rather than through a number pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinFormat {
    /// `000-00-0000`
    Ssn,
    /// `00000-0000`
    ZipPlusFour,
    /// `(###) ###-####`, dropping empty leading groups.
    Phone,
}

/// Format codes pre-registered for each builtin, including the escaped and conditional
/// variants spreadsheet applications emit.
pub const REGISTERED_CODES: &[(&str, BuiltinFormat)] = &[
    ("00000\\-0000", BuiltinFormat::ZipPlusFour),
    ("00000-0000", BuiltinFormat::ZipPlusFour),
    (
        "[<=9999999]###\\-####;\\(###\\)\\ ###\\-####",
        BuiltinFormat::Phone,
    ),
    ("[<=9999999]###-####;(###) ###-####", BuiltinFormat::Phone),
    ("###\\-####;\\(###\\)\\ ###\\-####", BuiltinFormat::Phone),
    ("###-####;(###) ###-####", BuiltinFormat::Phone),
    ("000\\-00\\-0000", BuiltinFormat::Ssn),
    ("000-00-0000", BuiltinFormat::Ssn),
];

impl BuiltinFormat {
    pub fn render(self, value: f64) -> String {
        match self {
            BuiltinFormat::Ssn => {
                let d = padded_digits(value, 9);
                format!("{}-{}-{}", &d[..3], &d[3..5], &d[5..9])
            }
            BuiltinFormat::ZipPlusFour => {
                let d = padded_digits(value, 9);
                format!("{}-{}", &d[..5], &d[5..9])
            }
            BuiltinFormat::Phone => render_phone(value),
        }
    }
}

/// Integer digits of `value` (rounded half-even like the integer-only pattern the builtins
/// are defined with), left-padded with zeros to `width`.
fn padded_digits(value: f64, width: usize) -> String {
    let n = integer_digits(value);
    format!("{n:0>width$}")
}

fn integer_digits(value: f64) -> String {
    let rounded = round_half_even(value.abs());
    format!("{rounded:.0}")
}

fn round_half_even(v: f64) -> f64 {
    let r = v.round();
    if (r - v).abs() == 0.5 && r % 2.0 != 0.0 {
        r - 1.0
    } else {
        r
    }
}

fn render_phone(value: f64) -> String {
    let digits = integer_digits(value);
    let len = digits.len();
    if len <= 4 {
        return digits;
    }

    let seg3 = &digits[len - 4..];
    let seg2 = &digits[len.saturating_sub(7)..len - 4];
    let seg1 = &digits[len.saturating_sub(10)..len.saturating_sub(7)];

    let mut out = String::new();
    if !seg1.is_empty() {
        out.push('(');
        out.push_str(seg1);
        out.push_str(") ");
    }
    if !seg2.is_empty() {
        out.push_str(seg2);
        out.push('-');
    }
    out.push_str(seg3);
    out
}

/// Format code for a builtin number-format id, when the style only carries the id.
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "\"$\"#,##0_);(\"$\"#,##0)",
        6 => "\"$\"#,##0_);[Red](\"$\"#,##0)",
        7 => "\"$\"#,##0.00_);(\"$\"#,##0.00)",
        8 => "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0_);(#,##0)",
        38 => "#,##0_);[Red](#,##0)",
        39 => "#,##0.00_);(#,##0.00)",
        40 => "#,##0.00_);[Red](#,##0.00)",
        41 => "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
        42 => "_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)",
        43 => "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
        44 => "_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Builtin ids that are dates no matter what code accompanies them.
pub fn is_builtin_date_id(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}
