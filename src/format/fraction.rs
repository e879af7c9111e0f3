//! Fraction formats such as `# ?/?`, `# ??/??` and `?/8`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::literal::split_sections;

static FRACTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:([#\d]+)\s+)?(#+)\s*/\s*([#\d]+)").unwrap());

static FRACTION_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"("[^"]*")|([^ ?#\d/]+)"#).unwrap());

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionDenominator {
    /// A literal denominator (`?/8`).
    Exact(u32),
    /// Best approximation with at most this many denominator digits.
    MaxDigits(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FractionPattern {
    /// Mixed form (`1 1/2`) when true, improper form (`3/2`) otherwise.
    pub whole: bool,
    pub denominator: FractionDenominator,
}

impl Default for FractionPattern {
    fn default() -> Self {
        FractionPattern {
            whole: true,
            denominator: FractionDenominator::MaxDigits(2),
        }
    }
}

impl FractionPattern {
    /// First section that looks like a fraction wins; `None` when no section does.
    pub(crate) fn parse(code: &str) -> Option<Self> {
        for section in split_sections(code) {
            let normalized = section.replace('?', "#");
            let stripped = FRACTION_NOISE.replace_all(&normalized, " ");
            let collapsed = SPACES.replace_all(&stripped, " ");
            if let Some(caps) = FRACTION_PATTERN.captures(&collapsed) {
                let denominator_code = &caps[3];
                let denominator = if denominator_code.bytes().all(|b| b.is_ascii_digit()) {
                    match denominator_code.parse::<u32>() {
                        Ok(n) if n > 0 => FractionDenominator::Exact(n),
                        _ => FractionDenominator::MaxDigits(denominator_code.len() as u32),
                    }
                } else {
                    FractionDenominator::MaxDigits(denominator_code.len().min(9) as u32)
                };
                return Some(FractionPattern {
                    whole: caps.get(1).is_some(),
                    denominator,
                });
            }
        }
        None
    }

    pub(crate) fn render(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        let sign = if value < 0.0 { "-" } else { "" };
        let abs = value.abs();
        if abs < 1e-10 {
            return "0".to_string();
        }

        let mut whole = abs.floor() as u64;
        let part = abs - abs.floor();
        let (mut num, den) = match self.denominator {
            FractionDenominator::Exact(d) => ((part * f64::from(d)).round() as u64, u64::from(d)),
            FractionDenominator::MaxDigits(digits) => {
                approximate(part, 10u64.pow(digits.clamp(1, 9)) - 1)
            }
        };

        if self.whole {
            if num == den {
                whole += 1;
                num = 0;
            }
            if num == 0 {
                return format!("{sign}{whole}");
            }
            if whole == 0 {
                format!("{sign}{num}/{den}")
            } else {
                format!("{sign}{whole} {num}/{den}")
            }
        } else {
            let total = whole * den + num;
            if total == 0 {
                return "0".to_string();
            }
            format!("{sign}{total}/{den}")
        }
    }
}

/// Closest fraction to `x` in `[0, 1)` with denominator at most `max_den`, from the
/// continued-fraction convergents and the last semiconvergent.
fn approximate(x: f64, max_den: u64) -> (u64, u64) {
    if x <= 0.0 {
        return (0, 1);
    }
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let mut rest = x;
    for _ in 0..64 {
        let a = rest.floor();
        if a > max_den as f64 {
            break;
        }
        let a = a as u64;
        let Some(q2) = a.checked_mul(q1).and_then(|v| v.checked_add(q0)) else {
            break;
        };
        if q2 > max_den {
            break;
        }
        let p2 = a * p1 + p0;
        (p0, q0, p1, q1) = (p1, q1, p2, q2);
        let frac = rest - rest.floor();
        if frac < 1e-12 {
            break;
        }
        rest = 1.0 / frac;
    }

    if q1 == 0 {
        return (0, 1);
    }
    let k = (max_den - q0) / q1;
    let (ps, qs) = (p0 + k * p1, q0 + k * q1);
    let err = |p: u64, q: u64| (x - p as f64 / q as f64).abs();
    if qs > 0 && err(ps, qs) < err(p1, q1) {
        (ps, qs)
    } else {
        (p1, q1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_and_improper_forms() {
        let mixed = FractionPattern::parse("# ?/?").unwrap();
        assert!(mixed.whole);
        assert_eq!(mixed.denominator, FractionDenominator::MaxDigits(1));

        let eighths = FractionPattern::parse("?/8").unwrap();
        assert!(!eighths.whole);
        assert_eq!(eighths.denominator, FractionDenominator::Exact(8));

        assert_eq!(FractionPattern::parse("0.00"), None);
    }

    #[test]
    fn renders_mixed_fractions() {
        let p = FractionPattern::parse("# ?/?").unwrap();
        assert_eq!(p.render(1.5), "1 1/2");
        assert_eq!(p.render(0.5), "1/2");
        assert_eq!(p.render(2.0), "2");
        assert_eq!(p.render(0.0), "0");
        assert_eq!(p.render(-1.25), "-1 1/4");
    }

    #[test]
    fn renders_improper_and_exact_denominators() {
        let p = FractionPattern::parse("?/?").unwrap();
        assert_eq!(p.render(1.5), "3/2");
        let q = FractionPattern::parse("# ?/8").unwrap();
        assert_eq!(q.render(2.3), "2 2/8");
    }

    #[test]
    fn approximation_respects_the_denominator_limit() {
        assert_eq!(approximate(0.333, 9), (1, 3));
        assert_eq!(approximate(0.14159265, 9), (1, 7));
        assert_eq!(approximate(0.14159265, 99), (14, 99));
        assert_eq!(approximate(0.14159265, 999), (16, 113));
    }
}
