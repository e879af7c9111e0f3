//! Digit-placeholder number patterns (`0`, `#`, `?`), including grouping, scaling commas,
//! percent, scientific notation and literal digit templates.

use super::locale::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `0`: always shows a digit.
    Zero,
    /// `#`: shows significant digits only.
    Hash,
    /// `?`: pads insignificant positions with a space.
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Digit(Placeholder),
    Literal(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exponent {
    pub width: usize,
}

/// One `;`-delimited section of a number format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NumberSection {
    pub prefix: String,
    pub integer: Vec<Slot>,
    pub grouping: bool,
    /// Number of trailing commas; each divides the value by 1000.
    pub scale: u32,
    pub decimal_point: bool,
    pub fraction: Vec<Slot>,
    pub exponent: Option<Exponent>,
    pub suffix: String,
    /// Number of `%` signs; each multiplies the value by 100.
    pub percent: u32,
}

/// A positive section and an optional section for negative values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPattern {
    pub positive: NumberSection,
    pub negative: Option<NumberSection>,
    /// Non-comma grouping symbol used by the code (e.g. `'` in `#'##0`), printed instead of
    /// the locale's grouping separator.
    pub grouping_char: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lexeme {
    Lit(char),
    Digit(Placeholder),
    Comma,
    Point,
    Percent,
    Exp(Exponent),
}

fn lex(section: &str, emulate_csv: bool) -> Vec<Lexeme> {
    let chars: Vec<char> = section.chars().collect();
    let mut out = Vec::new();
    let mut seen_point = false;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        i += 1;
        match ch {
            '"' => {
                while i < chars.len() && chars[i] != '"' {
                    out.push(Lexeme::Lit(chars[i]));
                    i += 1;
                }
                i += 1;
            }
            '\\' => {
                if let Some(&next) = chars.get(i) {
                    out.push(Lexeme::Lit(next));
                    i += 1;
                }
            }
            '_' => {
                if i < chars.len() {
                    i += 1;
                    if emulate_csv {
                        out.push(Lexeme::Lit(' '));
                    }
                }
            }
            '*' => i += 1,
            '[' => {
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                i += 1;
            }
            '0' => out.push(Lexeme::Digit(Placeholder::Zero)),
            '#' => out.push(Lexeme::Digit(Placeholder::Hash)),
            '?' => out.push(Lexeme::Digit(Placeholder::Space)),
            ',' => out.push(Lexeme::Comma),
            '.' if !seen_point => {
                seen_point = true;
                out.push(Lexeme::Point);
            }
            '%' => out.push(Lexeme::Percent),
            'E' | 'e' if matches!(chars.get(i), Some('+') | Some('-')) => {
                let mut j = i + 1;
                while j < chars.len() && matches!(chars[j], '0' | '#' | '?') {
                    j += 1;
                }
                let width = j - (i + 1);
                if width == 0 {
                    out.push(Lexeme::Lit(ch));
                } else {
                    out.push(Lexeme::Exp(Exponent { width }));
                    i = j;
                }
            }
            _ => out.push(Lexeme::Lit(ch)),
        }
    }
    out
}

fn push_literal(target: &mut String, lexeme: Lexeme, percent: &mut u32) {
    match lexeme {
        Lexeme::Lit(c) => target.push(c),
        Lexeme::Comma => target.push(','),
        Lexeme::Point => target.push('.'),
        Lexeme::Percent => {
            *percent += 1;
            target.push('%');
        }
        Lexeme::Digit(_) | Lexeme::Exp(_) => {}
    }
}

impl NumberSection {
    /// Builds a section from its code; returns the alternate grouping symbol if one was
    /// found in the integer part.
    pub(crate) fn parse(section: &str, emulate_csv: bool) -> (Self, Option<char>) {
        let lexemes = lex(section, emulate_csv);
        let mut sec = NumberSection::default();

        let start = lexemes
            .iter()
            .position(|l| matches!(l, Lexeme::Digit(_) | Lexeme::Point));
        let last_digit = lexemes
            .iter()
            .rposition(|l| matches!(l, Lexeme::Digit(_) | Lexeme::Exp(_)));
        let (Some(start), Some(last)) = (start, last_digit) else {
            for l in lexemes {
                push_literal(&mut sec.prefix, l, &mut sec.percent);
            }
            return (sec, None);
        };
        let last = last.max(start);

        for &l in &lexemes[..start] {
            push_literal(&mut sec.prefix, l, &mut sec.percent);
        }

        let zone = &lexemes[start..=last];
        let mut in_fraction = false;
        let mut after_exponent = false;
        for (k, &l) in zone.iter().enumerate() {
            if after_exponent {
                push_literal(&mut sec.suffix, l, &mut sec.percent);
                continue;
            }
            match l {
                Lexeme::Point => {
                    in_fraction = true;
                    sec.decimal_point = true;
                }
                Lexeme::Digit(p) if in_fraction => sec.fraction.push(Slot::Digit(p)),
                Lexeme::Digit(p) => sec.integer.push(Slot::Digit(p)),
                Lexeme::Comma if !in_fraction => {
                    let digit_follows = zone[k + 1..]
                        .iter()
                        .take_while(|l| !matches!(l, Lexeme::Point | Lexeme::Exp(_)))
                        .any(|l| matches!(l, Lexeme::Digit(_)));
                    if digit_follows {
                        sec.grouping = true;
                    } else {
                        sec.scale += 1;
                    }
                }
                Lexeme::Comma => sec.scale += 1,
                Lexeme::Exp(e) => {
                    sec.exponent = Some(e);
                    after_exponent = true;
                }
                Lexeme::Percent => {
                    sec.percent += 1;
                    let slot = Slot::Literal('%');
                    if in_fraction {
                        sec.fraction.push(slot);
                    } else {
                        sec.integer.push(slot);
                    }
                }
                Lexeme::Lit(c) if in_fraction => sec.fraction.push(Slot::Literal(c)),
                Lexeme::Lit(c) => sec.integer.push(Slot::Literal(c)),
            }
        }

        let mut rest = lexemes[last + 1..].iter().peekable();
        while let Some(Lexeme::Comma) = rest.peek() {
            sec.scale += 1;
            rest.next();
        }
        for &l in rest {
            push_literal(&mut sec.suffix, l, &mut sec.percent);
        }

        let grouping_char = sec.detect_alternate_grouping();
        (sec, grouping_char)
    }

    /// `#'##0` style codes: every literal in the integer part is the same symbol and every
    /// digit run after the first is exactly three long.
    fn detect_alternate_grouping(&mut self) -> Option<char> {
        let mut symbol = None;
        let mut runs = vec![0usize];
        for slot in &self.integer {
            match slot {
                Slot::Digit(_) => *runs.last_mut()? += 1,
                Slot::Literal(c) => {
                    if *c == '%' || symbol.is_some_and(|s| s != *c) {
                        return None;
                    }
                    symbol = Some(*c);
                    runs.push(0);
                }
            }
        }
        let symbol = symbol?;
        if runs[0] == 0 || runs[1..].iter().any(|r| *r != 3) {
            return None;
        }
        self.integer.retain(|s| matches!(s, Slot::Digit(_)));
        self.grouping = true;
        Some(symbol)
    }

    fn has_literal_slots(&self) -> bool {
        self.integer.iter().any(|s| matches!(s, Slot::Literal(_)))
    }

    fn fraction_places(&self) -> usize {
        self.fraction
            .iter()
            .filter(|s| matches!(s, Slot::Digit(_)))
            .count()
    }

    fn integer_placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.integer.iter().filter_map(|s| match s {
            Slot::Digit(p) => Some(*p),
            Slot::Literal(_) => None,
        })
    }
}

impl NumberPattern {
    pub(crate) fn parse(sections: &[&str], emulate_csv: bool) -> Self {
        let (positive, pos_group) = NumberSection::parse(sections[0], emulate_csv);
        let (negative, neg_group) = match sections.get(1) {
            Some(code) => {
                let (sec, group) = NumberSection::parse(code, emulate_csv);
                (Some(sec), group)
            }
            None => (None, None),
        };
        NumberPattern {
            positive,
            negative,
            grouping_char: pos_group.or(neg_group).filter(|c| *c != ','),
        }
    }

    /// Renders `value`. With `blank_zero`, a zero whose placeholders are all optional
    /// prints no digits at all.
    pub(crate) fn render(&self, value: f64, locale: Locale, blank_zero: bool) -> String {
        let grouping = self.grouping_char.unwrap_or(locale.grouping_separator());
        match (&self.negative, value < 0.0) {
            (Some(neg), true) => render_section(neg, -value, false, locale, grouping, blank_zero),
            _ => render_section(
                &self.positive,
                value.abs(),
                value < 0.0,
                locale,
                grouping,
                blank_zero,
            ),
        }
    }
}

fn render_section(
    sec: &NumberSection,
    magnitude: f64,
    signed: bool,
    locale: Locale,
    grouping: char,
    blank_zero: bool,
) -> String {
    let mut v = magnitude;
    for _ in 0..sec.percent {
        v *= 100.0;
    }
    for _ in 0..sec.scale {
        v /= 1000.0;
    }

    let decimal = Decimal::from_f64(v);
    let places = sec.fraction_places();

    let (int_digits, frac_digits, exponent) = match sec.exponent {
        Some(exp) => {
            let (int_digits, frac_digits, e) = scientific_parts(&decimal, sec, places);
            (int_digits, frac_digits, Some((e, exp)))
        }
        None => {
            let (i, f) = decimal.fixed_parts(places);
            (i, f, None)
        }
    };

    let fraction = fill_fraction(&sec.fraction, &frac_digits);
    let mut integer = if sec.grouping && !sec.has_literal_slots() {
        group_integer(sec, &int_digits, grouping)
    } else {
        fill_integer(&sec.integer, &int_digits)
    };
    let fraction_has_digits = fraction.chars().any(|c| c.is_ascii_digit());
    if !integer.chars().any(|c| c.is_ascii_digit())
        && !fraction_has_digits
        && !blank_zero
        && !sec.integer.is_empty()
        && !sec.has_literal_slots()
    {
        integer = "0".to_string();
    }

    let mut out = String::new();
    // A negative value keeps its sign even when it rounds to zero.
    if signed {
        out.push('-');
    }
    out.push_str(&sec.prefix);
    out.push_str(&integer);
    if sec.decimal_point && (!fraction.is_empty() || sec.fraction.is_empty()) {
        out.push(locale.decimal_separator());
    }
    out.push_str(&fraction);
    if let Some((e, spec)) = exponent {
        out.push('E');
        out.push(if e < 0 { '-' } else { '+' });
        out.push_str(&format!("{:0width$}", e.unsigned_abs(), width = spec.width));
    }
    out.push_str(&sec.suffix);
    out
}

/// Mantissa digits and exponent. Codes like `##0.0E+0` keep the exponent a multiple of
/// the integer placeholder count.
fn scientific_parts(decimal: &Decimal, sec: &NumberSection, places: usize) -> (String, String, i32) {
    let int_slots = sec.integer_placeholders().count().max(1);
    let engineering = int_slots > 1 && sec.integer_placeholders().any(|p| p != Placeholder::Zero);

    if decimal.is_zero() {
        return ("0".to_string(), "0".repeat(places), 0);
    }

    let exponent_for = |sci: i32| -> (i32, usize) {
        if engineering {
            let e = sci.div_euclid(int_slots as i32) * int_slots as i32;
            (e, (sci - e + 1) as usize)
        } else {
            (sci - (int_slots as i32 - 1), int_slots)
        }
    };

    let (_, int_len) = exponent_for(decimal.exp - 1);
    let rounded = decimal.round_significant(int_len + places);
    let (e, int_len) = exponent_for(rounded.exp - 1);
    let digits: Vec<u8> = (0..int_len + places)
        .map(|i| rounded.digits.get(i).copied().unwrap_or(0))
        .collect();
    let int_digits = digits[..int_len].iter().map(|d| char::from(b'0' + d)).collect();
    let frac_digits = digits[int_len..].iter().map(|d| char::from(b'0' + d)).collect();
    (int_digits, frac_digits, e)
}

/// Fills integer slots right to left; digits beyond the slots go in front of the leftmost
/// placeholder.
fn fill_integer(slots: &[Slot], digits: &str) -> String {
    let significant = digits.trim_start_matches('0');
    let mut remaining: Vec<char> = significant.chars().collect();
    let leftmost = slots.iter().position(|s| matches!(s, Slot::Digit(_)));
    let mut out: Vec<String> = Vec::with_capacity(slots.len());
    for (idx, slot) in slots.iter().enumerate().rev() {
        match slot {
            Slot::Literal(c) => out.push(c.to_string()),
            Slot::Digit(p) => {
                let piece = if Some(idx) == leftmost {
                    let rest: String = remaining.drain(..).collect();
                    if rest.is_empty() {
                        placeholder_fill(*p)
                    } else {
                        rest
                    }
                } else {
                    match remaining.pop() {
                        Some(d) => d.to_string(),
                        None => placeholder_fill(*p),
                    }
                };
                out.push(piece);
            }
        }
    }
    out.reverse();
    out.concat()
}

fn placeholder_fill(p: Placeholder) -> String {
    match p {
        Placeholder::Zero => "0".to_string(),
        Placeholder::Space => " ".to_string(),
        Placeholder::Hash => String::new(),
    }
}

fn group_integer(sec: &NumberSection, digits: &str, separator: char) -> String {
    let placeholders: Vec<Placeholder> = sec.integer_placeholders().collect();
    let min_width = placeholders
        .iter()
        .position(|p| *p == Placeholder::Zero)
        .map(|first| placeholders.len() - first)
        .unwrap_or(0);
    let significant = digits.trim_start_matches('0');
    let padded = format!("{significant:0>min_width$}");

    let len = padded.chars().count();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in padded.chars().enumerate() {
        out.push(ch);
        let from_end = len - i - 1;
        if from_end > 0 && from_end % 3 == 0 {
            out.push(separator);
        }
    }
    out
}

/// Fills fraction slots left to right; trailing zeros vanish under `#` and become spaces
/// under `?`.
fn fill_fraction(slots: &[Slot], digits: &str) -> String {
    let mut digit_iter = digits.chars();
    let mut pieces: Vec<(Option<Placeholder>, char)> = slots
        .iter()
        .map(|slot| match slot {
            Slot::Digit(p) => (Some(*p), digit_iter.next().unwrap_or('0')),
            Slot::Literal(c) => (None, *c),
        })
        .collect();

    for piece in pieces.iter_mut().rev() {
        match piece {
            (Some(Placeholder::Hash), '0') => piece.1 = '\0',
            (Some(Placeholder::Space), '0') => piece.1 = ' ',
            (None, _) => continue,
            _ => break,
        }
    }
    pieces
        .into_iter()
        .filter(|(_, c)| *c != '\0')
        .map(|(_, c)| c)
        .collect()
}

/// Renders with the general format: integers as-is, up to ten significant digits
/// otherwise, scientific below 1e-10 and from 1e11.
pub(crate) fn render_general(value: f64, locale: Locale) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let decimal = Decimal::from_f64(abs);

    if abs >= 1e11 || abs <= 1e-10 {
        let rounded = decimal.round_significant(6);
        let mut mantissa = String::new();
        let digits: Vec<char> = rounded.digits.iter().map(|d| char::from(b'0' + d)).collect();
        mantissa.push(digits.first().copied().unwrap_or('0'));
        if digits.len() > 1 {
            mantissa.push(locale.decimal_separator());
            mantissa.extend(&digits[1..]);
        }
        let e = rounded.exp - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}E{e_sign}{}", e.unsigned_abs());
    }

    if value.fract() == 0.0 || abs >= 1e10 {
        let (int_digits, _) = decimal.fixed_parts(0);
        return format!("{sign}{int_digits}");
    }

    let rounded = decimal.round_significant(10);
    let needed = (rounded.digits.len() as i32 - rounded.exp).clamp(0, 10) as usize;
    let (int_digits, frac_digits) = rounded.fixed_parts(needed);
    let frac = frac_digits.trim_end_matches('0');
    let int_digits = if int_digits.is_empty() {
        "0".to_string()
    } else {
        int_digits
    };
    if frac.is_empty() {
        format!("{sign}{int_digits}")
    } else {
        format!("{sign}{int_digits}{}{frac}", locale.decimal_separator())
    }
}

/// Decimal digits of a non-negative value: `0.d1d2d3... × 10^exp`.
///
/// Built from the 15 significant digits a spreadsheet keeps, so half-up rounding works on
/// the digits a user sees rather than on the binary approximation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decimal {
    digits: Vec<u8>,
    exp: i32,
}

impl Decimal {
    pub(crate) fn from_f64(value: f64) -> Self {
        let value = value.abs();
        if value == 0.0 || !value.is_finite() {
            return Decimal {
                digits: Vec::new(),
                exp: 0,
            };
        }
        let text = format!("{value:.14e}");
        let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let mut digits: Vec<u8> = mantissa
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        while digits.last() == Some(&0) {
            digits.pop();
        }
        Decimal {
            digits,
            exp: exp + 1,
        }
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Keeps `cut` leading digits, rounding half-up; returns the kept digits and exponent.
    fn round_at(&self, cut: i32) -> (Vec<u8>, i32) {
        if cut < 0 || self.is_zero() {
            return (Vec::new(), self.exp);
        }
        let cut = cut as usize;
        let mut kept: Vec<u8> = (0..cut)
            .map(|i| self.digits.get(i).copied().unwrap_or(0))
            .collect();
        let mut exp = self.exp;
        if self.digits.get(cut).is_some_and(|d| *d >= 5) {
            let mut carry = true;
            for d in kept.iter_mut().rev() {
                if *d == 9 {
                    *d = 0;
                } else {
                    *d += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                kept.insert(0, 1);
                exp += 1;
            }
        }
        (kept, exp)
    }

    fn round_significant(&self, n: usize) -> Decimal {
        let (mut digits, exp) = self.round_at(n as i32);
        while digits.last() == Some(&0) {
            digits.pop();
        }
        Decimal { digits, exp }
    }

    /// Integer digits (empty for zero) and exactly `places` fraction digits, half-up.
    fn fixed_parts(&self, places: usize) -> (String, String) {
        let (kept, exp) = self.round_at(self.exp + places as i32);
        if kept.is_empty() {
            return (String::new(), "0".repeat(places));
        }
        let to_str = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
        if exp > 0 {
            let split = (exp as usize).min(kept.len());
            let mut int_part = to_str(&kept[..split]);
            while int_part.len() < exp as usize {
                int_part.push('0');
            }
            let mut frac = to_str(&kept[split..]);
            while frac.len() < places {
                frac.push('0');
            }
            frac.truncate(places);
            (int_part, frac)
        } else {
            let mut frac = "0".repeat(exp.unsigned_abs() as usize);
            frac.push_str(&to_str(&kept));
            while frac.len() < places {
                frac.push('0');
            }
            frac.truncate(places);
            (String::new(), frac)
        }
    }
}
