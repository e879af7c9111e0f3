use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::builtin::{REGISTERED_CODES, builtin_format_code};
use super::compile::{compile, is_date_format};
use super::literal::{strip_colors, strip_locale_tags};
use super::locale::Locale;
use super::number::render_general;
use super::{DateSystem, FormatSpec, FormatterOptions, invalid_date_display};
use crate::sheet::{Cell, CellValue, Workbook};

struct FormatterState {
    locale: Locale,
    cache: HashMap<String, Arc<FormatSpec>>,
    default_code: Option<String>,
    default_format: Option<Arc<FormatSpec>>,
}

/// Renders raw cell values the way a spreadsheet application displays them.
///
/// Compiled formats are cached by their original code for the lifetime of the formatter.
/// The formatter is `Sync`: concurrent callers share the cache, and [`Self::reconfigure`]
/// swaps the locale, clears the cache and re-registers the builtin formats under a single
/// write lock, so a render never sees a half-updated state.
pub struct ValueFormatter {
    emulate_csv: bool,
    date_system: DateSystem,
    state: RwLock<FormatterState>,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(FormatterOptions::default())
    }
}

impl std::fmt::Debug for ValueFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueFormatter")
            .field("locale", &self.locale())
            .field("emulate_csv", &self.emulate_csv)
            .field("date_system", &self.date_system)
            .finish()
    }
}

fn builtin_cache() -> HashMap<String, Arc<FormatSpec>> {
    REGISTERED_CODES
        .iter()
        .map(|(code, builtin)| (code.to_string(), Arc::new(FormatSpec::Builtin(*builtin))))
        .collect()
}

impl ValueFormatter {
    pub fn new(options: FormatterOptions) -> Self {
        let default_format = options
            .default_number_format
            .as_deref()
            .map(|code| Arc::new(compile(code, options.emulate_csv)));
        Self {
            emulate_csv: options.emulate_csv,
            date_system: options.date_system,
            state: RwLock::new(FormatterState {
                locale: options.locale,
                cache: builtin_cache(),
                default_code: options.default_number_format,
                default_format,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FormatterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FormatterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn locale(&self) -> Locale {
        self.read().locale
    }

    pub fn emulates_csv(&self) -> bool {
        self.emulate_csv
    }

    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Current configuration, including the locale and default format in effect.
    pub fn options(&self) -> FormatterOptions {
        let state = self.read();
        FormatterOptions {
            locale: state.locale,
            emulate_csv: self.emulate_csv,
            date_system: self.date_system,
            default_number_format: state.default_code.clone(),
        }
    }

    /// Switches the locale. Every cached format is dropped and the builtin formats and the
    /// default number format are rebuilt.
    pub fn reconfigure(&self, locale: Locale) {
        let mut guard = self.write();
        let state = &mut *guard;
        state.locale = locale;
        state.cache = builtin_cache();
        state.default_format = state
            .default_code
            .as_deref()
            .map(|code| Arc::new(compile(code, self.emulate_csv)));
        debug!(locale = locale.tag(), "formatter reconfigured");
    }

    /// Registers a spec for a code, replacing any cached compilation.
    pub fn add_format(&self, code: impl Into<String>, spec: FormatSpec) {
        self.write().cache.insert(code.into(), Arc::new(spec));
    }

    /// Uses `code` instead of the general format wherever a code falls back.
    pub fn set_default_number_format(&self, code: impl Into<String>) {
        let code = code.into();
        let compiled = Arc::new(compile(&code, self.emulate_csv));
        let mut state = self.write();
        state.default_code = Some(code);
        state.default_format = Some(compiled);
    }

    /// The compiled spec for `code`, compiled on first use and shared afterwards.
    pub fn compile_format(&self, code: &str) -> Arc<FormatSpec> {
        self.resolve(code).0
    }

    fn resolve(&self, code: &str) -> (Arc<FormatSpec>, Locale, Option<Arc<FormatSpec>>) {
        {
            let state = self.read();
            if let Some(spec) = state.cache.get(code) {
                return (Arc::clone(spec), state.locale, state.default_format.clone());
            }
        }
        let compiled = compile(code, self.emulate_csv);
        let mut state = self.write();
        let spec = Arc::clone(
            state
                .cache
                .entry(code.to_string())
                .or_insert_with(|| Arc::new(compiled)),
        );
        (spec, state.locale, state.default_format.clone())
    }

    /// Renders a raw numeric value with a builtin format id and format code.
    ///
    /// A date format applied to a value outside the date range renders as 255 `#`.
    pub fn render(&self, value: f64, format_index: u32, code: &str) -> String {
        let code = if code.trim().is_empty() {
            builtin_format_code(format_index).unwrap_or("General")
        } else {
            code
        };

        if is_date_format(format_index, code) && !self.date_system.is_valid_serial(value) {
            return invalid_date_display();
        }

        let (spec, locale, default) = self.resolve(code);
        let blank_zero = self.emulate_csv && value == 0.0 && blanks_zero(code);
        self.apply(&spec, value, locale, default.as_deref(), blank_zero)
    }

    /// Renders with a format code alone.
    pub fn format_value(&self, value: f64, code: &str) -> String {
        self.render(value, 0, code)
    }

    fn apply(
        &self,
        spec: &FormatSpec,
        value: f64,
        locale: Locale,
        default: Option<&FormatSpec>,
        blank_zero: bool,
    ) -> String {
        match spec {
            FormatSpec::General => render_general(value, locale),
            FormatSpec::Fallback => match default {
                Some(FormatSpec::Fallback) | None => render_general(value, locale),
                Some(other) => self.apply(other, value, locale, None, blank_zero),
            },
            FormatSpec::ConstantText(text) => text.clone(),
            FormatSpec::Number(pattern) => pattern.render(value, locale, blank_zero),
            FormatSpec::Date(pattern) => {
                if self.date_system.is_valid_serial(value) {
                    pattern.render(value, self.date_system, locale)
                } else {
                    invalid_date_display()
                }
            }
            FormatSpec::Fraction(pattern) => pattern.render(value),
            FormatSpec::Builtin(builtin) => builtin.render(value),
            FormatSpec::Unsupported => value.to_string(),
        }
    }

    /// Display text of a cell: numbers through their style's format, strings as stored,
    /// booleans as `TRUE`/`FALSE`, formulas as their formula text and errors as their code.
    pub fn format_cell(&self, workbook: &Workbook, cell: &Cell) -> String {
        match &cell.value {
            CellValue::Number(v) => {
                let (index, code) = workbook.number_format(cell.style_id);
                self.render(*v, index, &code)
            }
            CellValue::SharedString(idx) => workbook
                .shared_string(*idx)
                .map(str::to_string)
                .unwrap_or_default(),
            CellValue::InlineString(text) => text.clone(),
            CellValue::Boolean(true) => "TRUE".to_string(),
            CellValue::Boolean(false) => "FALSE".to_string(),
            CellValue::Formula { formula, .. } => formula.clone(),
            CellValue::Error(code) => code.clone(),
            CellValue::Blank => String::new(),
        }
    }
}

/// Whether zero prints as nothing in CSV mode: the code has `#` placeholders and no `0`
/// outside bracket directives, quoted text and escapes.
fn blanks_zero(code: &str) -> bool {
    let bare = strip_locale_tags(&strip_colors(code));
    let mut has_hash = false;
    let mut in_quotes = false;
    let mut chars = bare.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '\\' => {
                chars.next();
            }
            '[' => {
                for skipped in chars.by_ref() {
                    if skipped == ']' {
                        break;
                    }
                }
            }
            '#' => has_hash = true,
            '0' => return false,
            _ => {}
        }
    }
    has_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BuiltinFormat;

    #[test]
    fn builtin_codes_are_preregistered() {
        let f = ValueFormatter::default();
        assert_eq!(
            *f.compile_format("000-00-0000"),
            FormatSpec::Builtin(BuiltinFormat::Ssn)
        );
        assert_eq!(f.format_value(123456789.0, "000\\-00\\-0000"), "123-45-6789");
        assert_eq!(f.format_value(8005551234.0, "[<=9999999]###-####;(###) ###-####"), "(800) 555-1234");
    }

    #[test]
    fn csv_zero_ignores_digits_inside_directives() {
        let csv = ValueFormatter::new(FormatterOptions::default().csv());
        assert_eq!(csv.format_value(0.0, "[Color10]#"), "");
        assert_eq!(csv.format_value(0.0, "[Red]#,##0"), "0");
        assert!(blanks_zero("#\"0\""));
        assert!(blanks_zero("[$-409]#,###"));
        assert!(blanks_zero("[>=100]#"));
        assert!(!blanks_zero("[Blue]0.0"));
    }

    #[test]
    fn empty_code_uses_the_builtin_table() {
        let f = ValueFormatter::default();
        assert_eq!(f.render(0.25, 9, ""), "25%");
        assert_eq!(f.render(45356.0, 14, ""), "3/5/24");
    }

    #[test]
    fn fallback_uses_the_default_number_format() {
        let f = ValueFormatter::default();
        assert_eq!(f.format_value(1234.5, "0;-0;\"zero\""), "1234.5");
        f.set_default_number_format("#,##0.00");
        assert_eq!(f.format_value(1234.5, "0;-0;\"zero\""), "1,234.50");
        assert_eq!(f.options().default_number_format.as_deref(), Some("#,##0.00"));
    }

    #[test]
    fn add_format_overrides_compilation() {
        let f = ValueFormatter::default();
        f.add_format("custom", FormatSpec::ConstantText("n/a".to_string()));
        assert_eq!(f.format_value(3.0, "custom"), "n/a");
    }
}
