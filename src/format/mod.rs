//! Spreadsheet number-format interpretation.
//!
//! A format code such as `"#,##0.00"`, `"dd/mm/yyyy"` or `"# ?/?"` is compiled once into a
//! [`FormatSpec`] and cached by its original text. Rendering a value applies the compiled
//! spec with the formatter's locale and date system.
//!
//! Compilation never fails: malformed codes degrade to [`FormatSpec::Fallback`], which renders
//! through the configured default number format or the general format.
//!
//! ```
//! use sheet_mapper::format::{FormatterOptions, ValueFormatter};
//!
//! let formatter = ValueFormatter::new(FormatterOptions::default());
//! assert_eq!(formatter.format_value(1234.5, "#,##0.00"), "1,234.50");
//! assert_eq!(formatter.format_value(45356.0, "mm/dd/yyyy"), "03/05/2024");
//! ```

mod builtin;
mod compile;
mod date;
mod formatter;
mod fraction;
mod literal;
mod locale;
mod number;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use builtin::{BuiltinFormat, builtin_format_code, is_builtin_date_id};
pub use compile::{compile, is_date_format};
pub use date::{DatePattern, DateToken};
pub use formatter::ValueFormatter;
pub use fraction::{FractionDenominator, FractionPattern};
pub use locale::Locale;
pub use number::{NumberPattern, NumberSection, Placeholder, Slot};

/// Compiled, immutable form of a format code.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatSpec {
    /// `General` or `@`.
    General,
    /// The code could not be honored; render with the default number format.
    Fallback,
    /// Opaque text printed instead of the value (CSV emulation only).
    ConstantText(String),
    Number(NumberPattern),
    Date(DatePattern),
    Fraction(FractionPattern),
    Builtin(BuiltinFormat),
    /// No placeholder of any kind; the raw value is printed.
    Unsupported,
}

/// Epoch used to interpret date serials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01, including the fictitious 1900-02-29 (serial 60).
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01.
    Excel1904,
}

impl DateSystem {
    /// Largest serial that still falls on or before 9999-12-31.
    pub fn max_serial(self) -> f64 {
        match self {
            DateSystem::Excel1900 => 2_958_465.999_999,
            DateSystem::Excel1904 => 2_957_003.999_999,
        }
    }

    /// Whether `value` can be displayed as a date in this system.
    pub fn is_valid_serial(self, value: f64) -> bool {
        value.is_finite() && value >= 0.0 && value <= self.max_serial()
    }

    /// Calendar date of a serial. Days that exist only in the 1900 system (serials 0 and 60)
    /// have no calendar date.
    pub fn to_date(self, serial: f64) -> Option<NaiveDate> {
        if !self.is_valid_serial(serial) {
            return None;
        }
        date::CalendarDate::from_serial_days(serial.floor() as i64, self)?.to_naive()
    }
}

/// Formatter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterOptions {
    pub locale: Locale,
    /// Render the way a CSV export would: zero with an all-`#` pattern is empty, spacer
    /// directives become spaces and text-only codes are printed verbatim.
    pub emulate_csv: bool,
    pub date_system: DateSystem,
    /// Format code used whenever a code falls back instead of `General`.
    pub default_number_format: Option<String>,
}

impl FormatterOptions {
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn csv(mut self) -> Self {
        self.emulate_csv = true;
        self
    }

    pub fn with_date_system(mut self, date_system: DateSystem) -> Self {
        self.date_system = date_system;
        self
    }
}

/// The string shown for a value that cannot be a date under a date format.
pub fn invalid_date_display() -> String {
    "#".repeat(255)
}
