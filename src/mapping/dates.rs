//! Dates typed as text.
//!
//! Separators `! - . | < >` are read as `/`. Recognized layouts, with an optional `HH:mm` or
//! `HH:mm:ss` suffix where noted:
//!
//! - `yyyyMMdd`, `yyyyMMddHHmm`, `yyyyMMddHHmmss` (the time may follow a space)
//! - `dd/MM/yyyy [time]`
//! - `yyyy/MM/dd [time]`
//! - `dd/MMM/yy` with a Spanish or English month abbreviation, years 2000-2099

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::format::Locale;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!\-.|<>]").unwrap());

static COMPACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<y>\d{4})(?P<m>\d{2})(?P<d>\d{2})(?:[ \t]?(?P<H>\d{2})(?P<M>\d{2})(?P<S>\d{2})?)?$")
        .unwrap()
});

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<d>\d{1,2})/(?P<m>\d{1,2})/(?P<y>\d{4})(?:[ \t](?P<H>\d{1,2}):(?P<M>\d{2})(?::(?P<S>\d{2}))?)?$")
        .unwrap()
});

static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<y>\d{4})/(?P<m>\d{1,2})/(?P<d>\d{1,2})(?:[ \t](?P<H>\d{1,2}):(?P<M>\d{2})(?::(?P<S>\d{2}))?)?$")
        .unwrap()
});

static MONTH_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<d>\d{1,2})/(?P<mon>[a-z]{3})/(?P<y>\d{2})$").unwrap());

/// Parses a free-text date, or returns `None` when the text has no recognized layout or
/// names an impossible date.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let normalized = SEPARATORS.replace_all(text.trim(), "/").to_lowercase();

    if let Some(caps) = MONTH_NAME.captures(&normalized) {
        let month = [Locale::EsEs, Locale::EnUs]
            .iter()
            .find_map(|locale| locale.month_from_abbrev(&caps["mon"]))?;
        let year = 2000 + caps["y"].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, caps["d"].parse().ok()?);
    }

    [&*COMPACT, &*DAY_FIRST, &*YEAR_FIRST]
        .iter()
        .find_map(|re| re.captures(&normalized))
        .and_then(|caps| date_of(&caps))
}

fn date_of(caps: &Captures<'_>) -> Option<NaiveDate> {
    let number = |name: &str| -> Option<u32> {
        caps.name(name).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    if caps.name("H").is_some() {
        NaiveTime::from_hms_opt(number("H")?, number("M")?, number("S")?)?;
    }
    let year = caps["y"].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, number("m")?, number("d")?)
}
