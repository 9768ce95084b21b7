//! Decimal pattern formatting for `@decfmt`
//!
//! A pattern is an optional literal prefix, a number part built from
//! `0` (mandatory digit), `#` (optional digit), `,` (grouping separator) and
//! `.` (decimal point), and an optional literal suffix:
//!
//! ```text
//! "0.000"      0.84147  →  0.841
//! "#,##0.00"   1234.5   →  1,234.50
//! "#.##"       0.5      →  .5
//! "0%"         0.256    →  26%
//! "$#,##0"     -1234    →  -$1,234
//! ```
//!
//! A `%` in an affix multiplies the value by 100, `‰` by 1000. Text inside
//! single quotes is literal and `''` outside quotes is a quote. The minus
//! sign goes before the prefix. Rounding is half-even.

use crate::memory::value::Number;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("multiple decimal separators in pattern \"{0}\"")]
    MultipleDecimalSeparators(String),

    #[error("grouping separator after decimal point in pattern \"{0}\"")]
    GroupingInFraction(String),

    #[error("unexpected '0' after '#' in pattern \"{0}\"")]
    MisplacedZero(String),

    #[error("unexpected '#' after '0' in pattern \"{0}\"")]
    MisplacedHash(String),

    #[error("digit placeholder in suffix of pattern \"{0}\"")]
    DigitInSuffix(String),

    #[error("unterminated quote in pattern \"{0}\"")]
    UnterminatedQuote(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecimalPattern {
    prefix: String,
    suffix: String,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    grouping: Option<usize>,
    multiplier: f64,
}

#[derive(Clone, Copy, PartialEq)]
enum Phase {
    Prefix,
    Number,
    Suffix,
}

fn is_number_char(c: char) -> bool {
    matches!(c, '0' | '#' | ',' | '.')
}

impl DecimalPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut parsed = DecimalPattern {
            prefix: String::new(),
            suffix: String::new(),
            min_int: 0,
            min_frac: 0,
            max_frac: 0,
            grouping: None,
            multiplier: 1.0,
        };

        let mut phase = Phase::Prefix;
        let mut seen_point = false;
        let mut seen_grouping = false;
        let mut digits_since_group = 0;
        let mut frac_hashes = 0;

        let chars: Vec<char> = pattern.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                let literal = if chars.get(i + 1) == Some(&'\'') {
                    i += 2;
                    "'".to_string()
                } else {
                    let start = i + 1;
                    let close = chars[start..]
                        .iter()
                        .position(|&ch| ch == '\'')
                        .ok_or_else(|| PatternError::UnterminatedQuote(pattern.to_string()))?;
                    i = start + close + 1;
                    chars[start..start + close].iter().collect()
                };
                if phase == Phase::Number {
                    phase = Phase::Suffix;
                }
                match phase {
                    Phase::Prefix => parsed.prefix.push_str(&literal),
                    _ => parsed.suffix.push_str(&literal),
                }
                continue;
            }

            if is_number_char(c) && phase == Phase::Suffix {
                return Err(PatternError::DigitInSuffix(pattern.to_string()));
            }

            if is_number_char(c) {
                phase = Phase::Number;
                match c {
                    '#' if !seen_point => {
                        if parsed.min_int > 0 {
                            return Err(PatternError::MisplacedHash(pattern.to_string()));
                        }
                        digits_since_group += 1;
                    }
                    '#' => frac_hashes += 1,
                    '0' if !seen_point => {
                        parsed.min_int += 1;
                        digits_since_group += 1;
                    }
                    '0' => {
                        if frac_hashes > 0 {
                            return Err(PatternError::MisplacedZero(pattern.to_string()));
                        }
                        parsed.min_frac += 1;
                    }
                    ',' => {
                        if seen_point {
                            return Err(PatternError::GroupingInFraction(pattern.to_string()));
                        }
                        seen_grouping = true;
                        digits_since_group = 0;
                    }
                    _ => {
                        if seen_point {
                            return Err(PatternError::MultipleDecimalSeparators(
                                pattern.to_string(),
                            ));
                        }
                        seen_point = true;
                    }
                }
            } else {
                if phase == Phase::Number {
                    phase = Phase::Suffix;
                }
                match c {
                    '%' => parsed.multiplier = 100.0,
                    '‰' => parsed.multiplier = 1000.0,
                    _ => {}
                }
                match phase {
                    Phase::Prefix => parsed.prefix.push(c),
                    _ => parsed.suffix.push(c),
                }
            }
            i += 1;
        }

        parsed.max_frac = parsed.min_frac + frac_hashes;
        if seen_grouping && digits_since_group > 0 {
            parsed.grouping = Some(digits_since_group);
        }
        Ok(parsed)
    }

    pub fn format(&self, number: Number) -> String {
        let value = number.as_f64() * self.multiplier;
        if value.is_nan() {
            return "NaN".to_string();
        }

        let sign = if value.is_sign_negative() { "-" } else { "" };
        if value.is_infinite() {
            return format!("{}{}∞{}", sign, self.prefix, self.suffix);
        }

        let digits = format!("{:.*}", self.max_frac, value.abs());
        let (int_digits, frac_digits) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

        let mut fraction = frac_digits.to_string();
        while fraction.len() > self.min_frac && fraction.ends_with('0') {
            fraction.pop();
        }

        let mut integer = if int_digits == "0" && self.min_int == 0 {
            String::new()
        } else {
            int_digits.to_string()
        };
        if integer.len() < self.min_int {
            integer = format!("{}{}", "0".repeat(self.min_int - integer.len()), integer);
        }
        if integer.is_empty() && fraction.is_empty() {
            integer.push('0');
        }
        if let Some(size) = self.grouping {
            integer = group_digits(&integer, size);
        }

        let mut out = String::with_capacity(digits.len() + self.prefix.len() + self.suffix.len() + 4);
        out.push_str(sign);
        out.push_str(&self.prefix);
        out.push_str(&integer);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out.push_str(&self.suffix);
        out
    }
}

fn group_digits(digits: &str, size: usize) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / size);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format `number` with `pattern`
pub fn decfmt(pattern: &str, number: Number) -> Result<String, PatternError> {
    DecimalPattern::parse(pattern).map(|p| p.format(number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(pattern: &str, value: f64) -> String {
        decfmt(pattern, Number::Double(value)).unwrap()
    }

    #[test]
    fn test_fixed_fraction() {
        assert_eq!(fmt("0.000", 0.8414709848), "0.841");
        assert_eq!(fmt("0.000", 1.0), "1.000");
        assert_eq!(decfmt("0.00", Number::Int(3)).unwrap(), "3.00");
    }

    #[test]
    fn test_optional_digits() {
        assert_eq!(fmt("#.##", 0.5), ".5");
        assert_eq!(fmt("#.##", 2.0), "2");
        assert_eq!(fmt("#", 0.0), "0");
        assert_eq!(fmt("0.0#", 1.5), "1.5");
        assert_eq!(fmt("0.0#", 1.257), "1.26");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(fmt("#,##0.00", 1234567.891), "1,234,567.89");
        assert_eq!(fmt("#,##0", 999.0), "999");
        assert_eq!(fmt("#,####", 123456.0), "12,3456");
    }

    #[test]
    fn test_padding_and_affixes() {
        assert_eq!(decfmt("000", Number::Int(7)).unwrap(), "007");
        assert_eq!(decfmt("$#,##0", Number::Int(-1234)).unwrap(), "-$1,234");
        assert_eq!(fmt("0%", 0.256), "26%");
        assert_eq!(fmt("'#'0", 5.0), "#5");
        assert_eq!(fmt("0 o''clock", 5.0), "5 o'clock");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(fmt("0.0", f64::NAN), "NaN");
        assert_eq!(fmt("0.0", f64::NEG_INFINITY), "-∞");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            DecimalPattern::parse("0.0.0"),
            Err(PatternError::MultipleDecimalSeparators(_))
        ));
        assert!(matches!(
            DecimalPattern::parse("0#"),
            Err(PatternError::MisplacedHash(_))
        ));
        assert!(matches!(
            DecimalPattern::parse("0.#0"),
            Err(PatternError::MisplacedZero(_))
        ));
        assert!(matches!(
            DecimalPattern::parse("0x0"),
            Err(PatternError::DigitInSuffix(_))
        ));
        assert!(matches!(
            DecimalPattern::parse("'abc"),
            Err(PatternError::UnterminatedQuote(_))
        ));
    }
}
