//! Date and time patterns.
//!
//! `m` is a month unless it directly follows an hour or precedes a seconds token, so the
//! tokenizer keeps the month tokens it has seen since the last reset and turns them into
//! minutes once a seconds token arrives. Any other date letter or whitespace ends that
//! window. Bracketed `[h]`, `[mm]`, `[ss]` are elapsed totals.

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

use super::locale::Locale;
use super::{DateSystem, invalid_date_display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateToken {
    Literal(String),
    Year { four_digit: bool },
    /// Width 1–5: `m`, `mm`, `mmm`, `mmmm`, `mmmmm`.
    Month(u8),
    Day { padded: bool },
    Weekday { long: bool },
    Hour { padded: bool },
    Minute { padded: bool },
    Second { padded: bool },
    /// Fractional seconds with this many digits (`ss.00`).
    SubSecond(u8),
    /// `AM/PM`, rendered with the locale's markers.
    AmPm,
    /// `A/P`, rendered as a single letter in the code's case.
    AP { lower: bool },
    ElapsedHours(u8),
    ElapsedMinutes(u8),
    ElapsedSeconds(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatePattern {
    pub tokens: Vec<DateToken>,
    /// An AM/PM marker is present, so hours are shown on a 12-hour clock.
    pub twelve_hour: bool,
    pub subsecond_digits: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DatePatternError {
    #[error("unterminated quoted literal")]
    UnterminatedQuote,
    #[error("unterminated bracket")]
    UnterminatedBracket,
    #[error("unknown date token '{0}'")]
    UnknownToken(char),
}

fn starts_with_ci(chars: &[char], at: usize, needle: &str) -> bool {
    let mut i = at;
    for n in needle.chars() {
        match chars.get(i) {
            Some(c) if c.eq_ignore_ascii_case(&n) => i += 1,
            _ => return false,
        }
    }
    true
}

fn run_length(chars: &[char], at: usize, lower: char) -> usize {
    chars[at..]
        .iter()
        .take_while(|c| c.to_ascii_lowercase() == lower)
        .count()
}

impl DatePattern {
    pub(crate) fn parse(section: &str) -> Result<Self, DatePatternError> {
        let chars: Vec<char> = section.chars().collect();
        let mut pattern = DatePattern::default();
        let mut pending_months: Vec<usize> = Vec::new();
        let mut m_is_month = true;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '"' => {
                    let end = chars[i + 1..]
                        .iter()
                        .position(|c| *c == '"')
                        .ok_or(DatePatternError::UnterminatedQuote)?;
                    let text: String = chars[i + 1..i + 1 + end].iter().collect();
                    pattern.push_literal(&text);
                    i += end + 2;
                }
                '\\' => {
                    if let Some(next) = chars.get(i + 1) {
                        pattern.push_literal(&next.to_string());
                    }
                    i += 2;
                }
                '_' | '*' => {
                    if c == '_' && i + 1 < chars.len() {
                        pattern.push_literal(" ");
                    }
                    i += 2;
                }
                '[' => {
                    let end = chars[i + 1..]
                        .iter()
                        .position(|c| *c == ']')
                        .ok_or(DatePatternError::UnterminatedBracket)?;
                    let content = &chars[i + 1..i + 1 + end];
                    let width = content.len().min(u8::MAX as usize) as u8;
                    let all = |l: char| !content.is_empty() && content.iter().all(|c| c.to_ascii_lowercase() == l);
                    if all('h') {
                        pattern.tokens.push(DateToken::ElapsedHours(width));
                    } else if all('m') {
                        pattern.tokens.push(DateToken::ElapsedMinutes(width));
                    } else if all('s') {
                        pattern.tokens.push(DateToken::ElapsedSeconds(width));
                    }
                    m_is_month = false;
                    i += end + 2;
                }
                'a' | 'A' if starts_with_ci(&chars, i, "AM/PM") => {
                    pattern.tokens.push(DateToken::AmPm);
                    pattern.twelve_hour = true;
                    i += 5;
                }
                'a' | 'A' if starts_with_ci(&chars, i, "A/P") => {
                    pattern.tokens.push(DateToken::AP { lower: c == 'a' });
                    pattern.twelve_hour = true;
                    i += 3;
                }
                'h' | 'H' => {
                    let len = run_length(&chars, i, 'h');
                    pattern.tokens.push(DateToken::Hour { padded: len >= 2 });
                    m_is_month = false;
                    i += len;
                }
                'm' | 'M' => {
                    let len = run_length(&chars, i, 'm');
                    if m_is_month {
                        pending_months.push(pattern.tokens.len());
                        pattern.tokens.push(DateToken::Month(len.min(5) as u8));
                    } else {
                        pattern.tokens.push(DateToken::Minute { padded: len >= 2 });
                    }
                    i += len;
                }
                's' | 'S' => {
                    let len = run_length(&chars, i, 's');
                    pattern.tokens.push(DateToken::Second { padded: len >= 2 });
                    for idx in pending_months.drain(..) {
                        let width = match pattern.tokens[idx] {
                            DateToken::Month(width) => width,
                            _ => continue,
                        };
                        pattern.tokens[idx] = DateToken::Minute { padded: width >= 2 };
                    }
                    m_is_month = true;
                    i += len;

                    if chars.get(i) == Some(&'.') && chars.get(i + 1) == Some(&'0') {
                        let zeros = run_length(&chars, i + 1, '0');
                        let digits = zeros.min(3);
                        pattern.push_literal(".");
                        pattern.tokens.push(DateToken::SubSecond(digits as u8));
                        pattern.subsecond_digits = pattern.subsecond_digits.max(digits as u32);
                        i += 1 + zeros;
                    }
                }
                'y' | 'Y' | 'e' | 'E' => {
                    let len = chars[i..]
                        .iter()
                        .take_while(|c| matches!(c, 'y' | 'Y' | 'e' | 'E'))
                        .count();
                    pattern.tokens.push(DateToken::Year { four_digit: len > 2 });
                    m_is_month = true;
                    pending_months.clear();
                    i += len;
                }
                'd' | 'D' => {
                    let len = run_length(&chars, i, 'd');
                    pattern.tokens.push(match len {
                        1 | 2 => DateToken::Day { padded: len == 2 },
                        3 => DateToken::Weekday { long: false },
                        _ => DateToken::Weekday { long: true },
                    });
                    m_is_month = true;
                    pending_months.clear();
                    i += len;
                }
                c if c.is_ascii_alphabetic() => return Err(DatePatternError::UnknownToken(c)),
                c => {
                    if c.is_alphabetic() {
                        m_is_month = true;
                        pending_months.clear();
                    } else if c.is_whitespace() {
                        pending_months.clear();
                    }
                    pattern.push_literal(&c.to_string());
                    i += 1;
                }
            }
        }
        Ok(pattern)
    }

    fn push_literal(&mut self, text: &str) {
        if let Some(DateToken::Literal(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(DateToken::Literal(text.to_string()));
        }
    }

    pub(crate) fn render(&self, value: f64, system: DateSystem, locale: Locale) -> String {
        let scale = 10i64.pow(self.subsecond_digits);
        let units_per_day = 86_400 * scale;
        let total_units = (value * units_per_day as f64).round() as i64;
        let days = total_units.div_euclid(units_per_day);
        let day_units = total_units.rem_euclid(units_per_day);

        let Some(date) = CalendarDate::from_serial_days(days, system) else {
            return invalid_date_display();
        };

        let secs_of_day = day_units / scale;
        let fraction = day_units % scale;
        let hour = secs_of_day / 3600;
        let minute = secs_of_day / 60 % 60;
        let second = secs_of_day % 60;
        let total_secs = total_units / scale;

        let mut out = String::new();
        for token in &self.tokens {
            match token {
                DateToken::Literal(text) => out.push_str(text),
                DateToken::Year { four_digit: true } => out.push_str(&format!("{:04}", date.year)),
                DateToken::Year { four_digit: false } => {
                    out.push_str(&format!("{:02}", date.year.rem_euclid(100)))
                }
                DateToken::Month(width) => {
                    let month0 = date.month as usize - 1;
                    match width {
                        1 => out.push_str(&date.month.to_string()),
                        2 => out.push_str(&format!("{:02}", date.month)),
                        3 => out.push_str(locale.month_abbrev(month0)),
                        4 => out.push_str(locale.month_name(month0)),
                        _ => out.extend(locale.month_name(month0).chars().take(1).flat_map(char::to_uppercase)),
                    }
                }
                DateToken::Day { padded } => out.push_str(&pad(i64::from(date.day), *padded)),
                DateToken::Weekday { long: true } => out.push_str(locale.weekday_name(date.weekday as usize)),
                DateToken::Weekday { long: false } => out.push_str(locale.weekday_abbrev(date.weekday as usize)),
                DateToken::Hour { padded } => {
                    let shown = if self.twelve_hour {
                        match hour % 12 {
                            0 => 12,
                            h => h,
                        }
                    } else {
                        hour
                    };
                    out.push_str(&pad(shown, *padded));
                }
                DateToken::Minute { padded } => out.push_str(&pad(minute, *padded)),
                DateToken::Second { padded } => out.push_str(&pad(second, *padded)),
                DateToken::SubSecond(digits) => {
                    let text = format!("{:0width$}", fraction, width = self.subsecond_digits as usize);
                    out.push_str(&text[..(*digits as usize).min(text.len())]);
                }
                DateToken::AmPm => out.push_str(locale.am_pm(hour >= 12)),
                DateToken::AP { lower } => {
                    let marker = if hour >= 12 { 'P' } else { 'A' };
                    out.push(if *lower { marker.to_ascii_lowercase() } else { marker });
                }
                DateToken::ElapsedHours(width) => {
                    out.push_str(&format!("{:0w$}", total_secs / 3600, w = *width as usize))
                }
                DateToken::ElapsedMinutes(width) => {
                    out.push_str(&format!("{:0w$}", total_secs / 60, w = *width as usize))
                }
                DateToken::ElapsedSeconds(width) => {
                    out.push_str(&format!("{:0w$}", total_secs, w = *width as usize))
                }
            }
        }
        out
    }
}

fn pad(n: i64, padded: bool) -> String {
    if padded { format!("{n:02}") } else { n.to_string() }
}

/// Calendar fields of a serial day, including the days the 1900 system invents
/// (1900-01-00 and 1900-02-29).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Sunday is 0.
    pub weekday: u32,
}

impl CalendarDate {
    pub(crate) fn from_serial_days(days: i64, system: DateSystem) -> Option<Self> {
        if days < 0 {
            return None;
        }
        match system {
            DateSystem::Excel1900 => {
                let weekday = ((days + 6) % 7) as u32;
                let (year, month, day) = match days {
                    0 => (1900, 1, 0),
                    60 => (1900, 2, 29),
                    _ => {
                        let offset = if days > 60 { days - 1 } else { days };
                        let date = NaiveDate::from_ymd_opt(1899, 12, 31)?
                            .checked_add_days(Days::new(offset as u64))?;
                        (date.year(), date.month(), date.day())
                    }
                };
                Some(CalendarDate {
                    year,
                    month,
                    day,
                    weekday,
                })
            }
            DateSystem::Excel1904 => {
                let date = NaiveDate::from_ymd_opt(1904, 1, 1)?
                    .checked_add_days(Days::new(days as u64))?;
                Some(CalendarDate {
                    year: date.year(),
                    month: date.month(),
                    day: date.day(),
                    weekday: date.weekday().num_days_from_sunday(),
                })
            }
        }
    }

    /// The real calendar date, when there is one.
    pub(crate) fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(code: &str, value: f64) -> String {
        DatePattern::parse(code)
            .unwrap()
            .render(value, DateSystem::Excel1900, Locale::EnUs)
    }

    #[test]
    fn month_versus_minute() {
        let p = DatePattern::parse("mm/dd/yyyy").unwrap();
        assert!(matches!(p.tokens[0], DateToken::Month(2)));

        let p = DatePattern::parse("h:mm").unwrap();
        assert!(matches!(p.tokens[2], DateToken::Minute { padded: true }));

        let p = DatePattern::parse("mm:ss").unwrap();
        assert!(matches!(p.tokens[0], DateToken::Minute { padded: true }));

        let p = DatePattern::parse("yyyy-mm-dd hh:mm:ss").unwrap();
        assert!(matches!(p.tokens[2], DateToken::Month(2)));
        assert!(matches!(p.tokens[8], DateToken::Minute { padded: true }));
    }

    #[test]
    fn whitespace_ends_the_pending_month_window() {
        let p = DatePattern::parse("mm ss").unwrap();
        assert!(matches!(p.tokens[0], DateToken::Month(2)));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(
            DatePattern::parse("dd\"/mm"),
            Err(DatePatternError::UnterminatedQuote)
        );
        assert_eq!(DatePattern::parse("[h:mm"), Err(DatePatternError::UnterminatedBracket));
    }

    #[test]
    fn renders_dates_and_times() {
        let value = 45356.0 + (13.0 * 3600.0 + 5.0 * 60.0 + 9.0) / 86400.0;
        assert_eq!(render("mm/dd/yyyy", value), "03/05/2024");
        assert_eq!(render("h:mm:ss", value), "13:05:09");
        assert_eq!(render("h:mm:ss AM/PM", value), "1:05:09 PM");
        assert_eq!(render("h:mm a/p", value), "1:05 p");
        assert_eq!(render("dddd, mmmm d, yyyy", value), "Tuesday, March 5, 2024");
        assert_eq!(render("ddd d-mmm-yy", 37623.0), "Thu 2-Jan-03");
    }

    #[test]
    fn midnight_is_twelve_on_a_twelve_hour_clock() {
        assert_eq!(render("h AM/PM", 45356.0), "12 AM");
        assert_eq!(render("hh:mm", 45356.0), "00:00");
    }

    #[test]
    fn elapsed_time_counts_past_a_day() {
        assert_eq!(render("[h]:mm:ss", 1.5), "36:00:00");
        assert_eq!(render("[mm]:ss", 0.5), "720:00");
        assert_eq!(render("mm:ss.00", 1.25 / 86400.0), "00:01.25");
    }

    #[test]
    fn fictitious_leap_day_and_1904_epoch() {
        assert_eq!(render("yyyy-mm-dd", 60.0), "1900-02-29");
        assert_eq!(render("yyyy-mm-dd", 61.0), "1900-03-01");
        let p = DatePattern::parse("yyyy-mm-dd").unwrap();
        assert_eq!(p.render(43894.0, DateSystem::Excel1904, Locale::EnUs), "2024-03-05");
    }

    #[test]
    fn spanish_names() {
        let p = DatePattern::parse("d mmmm yyyy h:mm AM/PM").unwrap();
        assert_eq!(
            p.render(45356.75, DateSystem::Excel1900, Locale::EsEs),
            "5 marzo 2024 6:00 p. m."
        );
    }
}
