//! Locale symbol tables used when rendering numbers and dates.
//!
//! Only the two locales the formatter is configured with at runtime are provided. Format
//! codes themselves are locale-invariant (`,` groups and `.` separates decimals); the
//! locale only decides what is printed.

use serde::{Deserialize, Serialize};

/// A runtime rendering locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "es-ES")]
    EsEs,
}

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const EN_MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const EN_WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const EN_WEEKDAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const ES_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];
const ES_MONTHS_SHORT: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];
const ES_WEEKDAYS: [&str; 7] = [
    "domingo",
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
];
const ES_WEEKDAYS_SHORT: [&str; 7] = ["dom", "lun", "mar", "mié", "jue", "vie", "sáb"];

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::EsEs => "es-ES",
        }
    }

    pub fn decimal_separator(self) -> char {
        match self {
            Locale::EnUs => '.',
            Locale::EsEs => ',',
        }
    }

    pub fn grouping_separator(self) -> char {
        match self {
            Locale::EnUs => ',',
            Locale::EsEs => '.',
        }
    }

    /// Full month name; `month0` is 0-based.
    pub fn month_name(self, month0: usize) -> &'static str {
        match self {
            Locale::EnUs => EN_MONTHS[month0 % 12],
            Locale::EsEs => ES_MONTHS[month0 % 12],
        }
    }

    pub fn month_abbrev(self, month0: usize) -> &'static str {
        match self {
            Locale::EnUs => EN_MONTHS_SHORT[month0 % 12],
            Locale::EsEs => ES_MONTHS_SHORT[month0 % 12],
        }
    }

    /// Full weekday name; `day0` counts from Sunday.
    pub fn weekday_name(self, day0: usize) -> &'static str {
        match self {
            Locale::EnUs => EN_WEEKDAYS[day0 % 7],
            Locale::EsEs => ES_WEEKDAYS[day0 % 7],
        }
    }

    pub fn weekday_abbrev(self, day0: usize) -> &'static str {
        match self {
            Locale::EnUs => EN_WEEKDAYS_SHORT[day0 % 7],
            Locale::EsEs => ES_WEEKDAYS_SHORT[day0 % 7],
        }
    }

    pub fn am_pm(self, pm: bool) -> &'static str {
        match (self, pm) {
            (Locale::EnUs, false) => "AM",
            (Locale::EnUs, true) => "PM",
            (Locale::EsEs, false) => "a. m.",
            (Locale::EsEs, true) => "p. m.",
        }
    }

    /// 1-based month for a three-letter abbreviation in this locale (case-insensitive).
    pub fn month_from_abbrev(self, abbrev: &str) -> Option<u32> {
        let table = match self {
            Locale::EnUs => &EN_MONTHS_SHORT,
            Locale::EsEs => &ES_MONTHS_SHORT,
        };
        let needle = abbrev.trim_end_matches('.').to_lowercase();
        table
            .iter()
            .position(|m| m.to_lowercase() == needle)
            .map(|i| i as u32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::Locale;

    #[test]
    fn symbols_differ_between_locales() {
        assert_eq!(Locale::EnUs.decimal_separator(), '.');
        assert_eq!(Locale::EsEs.decimal_separator(), ',');
        assert_eq!(Locale::EsEs.grouping_separator(), '.');
    }

    #[test]
    fn month_abbreviations_parse_per_locale() {
        assert_eq!(Locale::EsEs.month_from_abbrev("ENE"), Some(1));
        assert_eq!(Locale::EsEs.month_from_abbrev("dic."), Some(12));
        assert_eq!(Locale::EnUs.month_from_abbrev("jan"), Some(1));
        assert_eq!(Locale::EnUs.month_from_abbrev("ene"), None);
    }
}
