//! Format-code compilation.

use tracing::warn;

use super::builtin::is_builtin_date_id;
use super::date::DatePattern;
use super::fraction::FractionPattern;
use super::literal::{constant_text, split_sections, strip_colors, strip_locale_tags};
use super::number::NumberPattern;
use super::FormatSpec;

fn is_general(code: &str) -> bool {
    code.eq_ignore_ascii_case("General") || code == "@"
}

/// Compiles a format code. The result depends only on the code and on whether CSV output is
/// being emulated.
///
/// Steps, in order: color directives and locale tags are stripped, `General`/`@` are
/// recognized, codes with three or more sections fall back, then the code is classified as a
/// date, a fraction, a digit pattern, or text.
pub fn compile(code: &str, emulate_csv: bool) -> FormatSpec {
    if code.trim().is_empty() {
        return FormatSpec::Fallback;
    }
    if is_general(code) {
        return FormatSpec::General;
    }
    if split_sections(code).len() >= 3 {
        warn!(format = code, "conditional formats with 3+ sections are not supported, falling back");
        return FormatSpec::Fallback;
    }

    let stripped = strip_locale_tags(&strip_colors(code));
    if stripped.trim().is_empty() {
        return FormatSpec::Fallback;
    }
    if is_general(stripped.trim()) {
        return FormatSpec::General;
    }

    if is_date_code(&stripped) {
        let first = split_sections(&stripped)[0];
        return match DatePattern::parse(first) {
            Ok(pattern) => FormatSpec::Date(pattern),
            Err(err) => {
                warn!(format = code, error = %err, "unparseable date format, falling back");
                FormatSpec::Fallback
            }
        };
    }

    if stripped.contains("#/") || stripped.contains("?/") {
        return FormatSpec::Fraction(FractionPattern::parse(&stripped).unwrap_or_default());
    }

    if stripped.contains(['0', '#']) {
        let sections = split_sections(&stripped);
        return FormatSpec::Number(NumberPattern::parse(&sections, emulate_csv));
    }

    if emulate_csv {
        FormatSpec::ConstantText(constant_text(&stripped))
    } else {
        FormatSpec::Unsupported
    }
}

/// Whether a cell with this builtin id and code shows a date.
pub fn is_date_format(format_index: u32, code: &str) -> bool {
    if is_builtin_date_id(format_index) {
        return true;
    }
    if code.trim().is_empty() || is_general(code) {
        return false;
    }
    is_date_code(&strip_locale_tags(&strip_colors(code)))
}

/// A date code has at least one date letter and no digit placeholders besides the
/// fractional-seconds zeros after `s.`.
pub(crate) fn is_date_code(code: &str) -> bool {
    let section = split_sections(code)[0];
    let chars: Vec<char> = section.chars().collect();
    let mut has_date_letter = false;
    let mut seen_seconds = false;
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    i += 1;
                }
            }
            '\\' | '_' | '*' => i += 1,
            '[' => {
                let start = i + 1;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                let content = &chars[start.min(chars.len())..i];
                if !content.is_empty()
                    && content
                        .iter()
                        .all(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's'))
                {
                    has_date_letter = true;
                }
            }
            'a' | 'A' => {
                let rest: String = chars[i..].iter().take(5).collect::<String>().to_ascii_uppercase();
                if rest.starts_with("AM/PM") {
                    i += 4;
                } else if rest.starts_with("A/P") {
                    i += 2;
                } else {
                    return false;
                }
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 'e' => has_date_letter = true,
            's' | 'S' => {
                has_date_letter = true;
                seen_seconds = true;
            }
            '0' if seen_seconds && matches!(prev, Some('.') | Some('0')) => {}
            '0' | '#' | '?' | '@' => return false,
            c if c.is_ascii_alphabetic() => return false,
            _ => {}
        }
        prev = chars.get(i).copied();
        i += 1;
    }
    has_date_letter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FractionDenominator, FractionPattern};

    #[test]
    fn recognizes_date_codes() {
        assert!(is_date_code("mm/dd/yyyy"));
        assert!(is_date_code("h:mm:ss AM/PM"));
        assert!(is_date_code("[h]:mm:ss"));
        assert!(is_date_code("mm:ss.0"));
        assert!(is_date_code("dd/mm/yyyy;@"));
        assert!(is_date_code("yyyy\"年\"m\"月\""));
        assert!(!is_date_code("0.00"));
        assert!(!is_date_code("# ?/?"));
        assert!(!is_date_code("General"));
        assert!(!is_date_code("\"mm\"0"));
    }

    #[test]
    fn builtin_ids_are_dates_regardless_of_code() {
        assert!(is_date_format(14, ""));
        assert!(is_date_format(0, "[Red]dd/mm/yy"));
        assert!(!is_date_format(0, "General"));
    }

    #[test]
    fn classifies_codes() {
        assert_eq!(compile("General", false), FormatSpec::General);
        assert_eq!(compile("[Blue]general", false), FormatSpec::General);
        assert_eq!(compile("@", false), FormatSpec::General);
        assert_eq!(compile("", false), FormatSpec::Fallback);
        assert!(matches!(compile("dd/mm/yyyy", false), FormatSpec::Date(_)));
        assert!(matches!(compile("#,##0.00", false), FormatSpec::Number(_)));
        assert_eq!(
            compile("# ?/?", false),
            FormatSpec::Fraction(FractionPattern {
                whole: true,
                denominator: FractionDenominator::MaxDigits(1),
            })
        );
    }

    #[test]
    fn three_sections_fall_back() {
        assert_eq!(compile("0;-0;\"zero\"", false), FormatSpec::Fallback);
        assert_eq!(
            compile("_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)", false),
            FormatSpec::Fallback
        );
    }

    #[test]
    fn text_only_codes_depend_on_csv_mode() {
        assert_eq!(compile("\"N/A\"", false), FormatSpec::Unsupported);
        assert_eq!(
            compile("\"N/A\"", true),
            FormatSpec::ConstantText("N/A".to_string())
        );
    }

    #[test]
    fn broken_date_codes_fall_back() {
        assert_eq!(compile("dd/mm/yyyy\"", false), FormatSpec::Fallback);
    }
}
