//! Bracket directives, section splitting and literal text in format codes.

use once_cell::sync::Lazy;
use regex::Regex;

static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(?:BLACK|BLUE|CYAN|GREEN|MAGENTA|RED|WHITE|YELLOW|COLOR\s*[0-5]?\d)\]")
        .unwrap()
});

static LOCALE_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\$([^-\]]*)-[0-9A-Z]+\]").unwrap());

/// Removes color directives one at a time until the code stops shrinking.
pub(crate) fn strip_colors(code: &str) -> String {
    let mut current = code.to_string();
    while let Some(m) = COLOR_PATTERN.find(&current) {
        let next = format!("{}{}", &current[..m.start()], &current[m.end()..]);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Replaces `[$sym-xxx]` tags with their symbol. A `$` inside the symbol stays escaped
/// so it renders literally.
pub(crate) fn strip_locale_tags(code: &str) -> String {
    LOCALE_TAG_PATTERN
        .replace_all(code, |caps: &regex::Captures<'_>| {
            let symbol = &caps[1];
            match symbol.find('$') {
                Some(at) => format!("{}\\{}", &symbol[..at], &symbol[at..]),
                None => symbol.to_string(),
            }
        })
        .into_owned()
}

/// Splits on `;` outside quotes and escapes.
pub(crate) fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escape = false;
    for (idx, ch) in code.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if !in_quotes => escape = true,
            ';' if !in_quotes => {
                sections.push(&code[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// Text shown for a code with no placeholders when emulating CSV output: `_x` spacers
/// become one space, `*x` fills and quoting are dropped, `?` becomes a space.
pub(crate) fn constant_text(code: &str) -> String {
    let mut out = String::new();
    let mut chars = code.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => {}
            '_' => {
                if chars.next().is_some() {
                    out.push(' ');
                }
            }
            '*' => {
                let _ = chars.next();
            }
            '?' => out.push(' '),
            '+' if out.ends_with('E') => {}
            _ => out.push(ch),
        }
    }
    out
}
