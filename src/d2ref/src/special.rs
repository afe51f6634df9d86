//! Special bonus values
//!
//! Talents and upgrades describe their numbers in a compact form:
//!
//! | input   | value | equals | multiplier | percent |
//! |---------|-------|--------|------------|---------|
//! | `25`    | 25    |        |            |         |
//! | `+25%`  | 25    |        |            | yes     |
//! | `=3`    | 3     | yes    |            |         |
//! | `x2`    | 2     |        | yes        |         |
//! | `+-5`   | 5     |        |            |         |
//!
//! `+-` is a quirk of one source string and collapses to a bare value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const SIGN_PAIR: &str = "+-";
const EQUALS_MARKER: char = '=';
const MULTIPLIER_MARKER: char = 'x';
const PERCENT_MARKER: char = '%';

/// A parsed special bonus value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialBonusValue {
    pub value: f64,
    pub is_equals: bool,
    pub is_multiplier: bool,
    pub is_percent: bool,
}

/// Input that does not follow the compact grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid special value '{input}'")]
pub struct SpecialValueError {
    pub input: String,
}

impl SpecialBonusValue {
    /// Plain value with no markers
    pub fn plain(value: f64) -> Self {
        Self {
            value,
            is_equals: false,
            is_multiplier: false,
            is_percent: false,
        }
    }

    /// Parse one compact value
    pub fn parse(input: &str) -> Result<Self, SpecialValueError> {
        let error = || SpecialValueError {
            input: input.to_string(),
        };

        let trimmed = input.trim();

        // One character has no room for markers
        if trimmed.chars().count() == 1 {
            return trimmed.parse().map(Self::plain).map_err(|_| error());
        }

        let mut rest = trimmed.strip_prefix(SIGN_PAIR).unwrap_or(trimmed);
        let mut parsed = Self::plain(0.0);

        if let Some(stripped) = rest.strip_prefix(EQUALS_MARKER) {
            parsed.is_equals = true;
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_prefix(MULTIPLIER_MARKER) {
            parsed.is_multiplier = true;
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_suffix(PERCENT_MARKER) {
            parsed.is_percent = true;
            rest = stripped;
        }

        parsed.value = parse_number(rest).ok_or_else(error)?;
        Ok(parsed)
    }

    /// Parse each element; output keeps input order and length
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, SpecialValueError> {
        inputs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// Parse a whitespace-separated per-level list such as `"10 20 30 40"`
    pub fn parse_levels(input: &str) -> Result<Vec<Self>, SpecialValueError> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        Self::parse_all(&parts)
    }
}

/// Float parse that rejects the spellings `f64::from_str` accepts but the
/// game never writes (`inf`, `NaN`, ...)
fn parse_number(text: &str) -> Option<f64> {
    let value: f64 = text.parse().ok()?;
    value.is_finite().then_some(value)
}

impl FromStr for SpecialBonusValue {
    type Err = SpecialValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SpecialBonusValue {
    /// Compact form that parses back to the same value
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_equals {
            write!(f, "{}", EQUALS_MARKER)?;
        }
        if self.is_multiplier {
            write!(f, "{}", MULTIPLIER_MARKER)?;
        }
        write!(f, "{}", self.value)?;
        if self.is_percent {
            write!(f, "{}", PERCENT_MARKER)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(v: &SpecialBonusValue) -> (bool, bool, bool) {
        (v.is_equals, v.is_multiplier, v.is_percent)
    }

    #[test]
    fn test_documented_examples() {
        let cases = [
            ("25", 25.0, (false, false, false)),
            ("+25%", 25.0, (false, false, true)),
            ("=3", 3.0, (true, false, false)),
            ("x2", 2.0, (false, true, false)),
            ("+-5", 5.0, (false, false, false)),
        ];

        for (input, value, expected) in cases {
            let parsed = SpecialBonusValue::parse(input).unwrap();
            assert_eq!(parsed.value, value, "value of {}", input);
            assert_eq!(flags(&parsed), expected, "flags of {}", input);
        }
    }

    #[test]
    fn test_negative_and_fractional() {
        let v = SpecialBonusValue::parse("-1.5").unwrap();
        assert_eq!(v.value, -1.5);
        let v = SpecialBonusValue::parse("x0.75").unwrap();
        assert_eq!(v.value, 0.75);
        assert!(v.is_multiplier);
        let v = SpecialBonusValue::parse("=-40%").unwrap();
        assert_eq!(v.value, -40.0);
        assert_eq!(flags(&v), (true, false, true));
    }

    #[test]
    fn test_single_character_bypasses_markers() {
        assert_eq!(SpecialBonusValue::parse("7").unwrap(), SpecialBonusValue::plain(7.0));
        assert!(SpecialBonusValue::parse("x").is_err());
        assert!(SpecialBonusValue::parse("%").is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "abc", "x", "=%", "+-", "25%%", "inf", "1 2"] {
            let err = SpecialBonusValue::parse(input).unwrap_err();
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn test_parse_all_preserves_order_and_length() {
        let parsed = SpecialBonusValue::parse_all(&["10", "x2", "=3", "+25%"]).unwrap();
        let values: Vec<f64> = parsed.iter().map(|v| v.value).collect();
        assert_eq!(values, vec![10.0, 2.0, 3.0, 25.0]);

        assert!(SpecialBonusValue::parse_all(&["1", "bad"]).is_err());
        assert!(SpecialBonusValue::parse_all::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_levels() {
        let levels = SpecialBonusValue::parse_levels("  10 20\t30 40 ").unwrap();
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[3].value, 40.0);
    }

    #[test]
    fn test_reencode_round_trip_every_flag_combination() {
        for value in [0.0, 3.0, 25.0, -5.0, 0.35, 1250.5] {
            for bits in 0..8u8 {
                let original = SpecialBonusValue {
                    value,
                    is_equals: bits & 1 != 0,
                    is_multiplier: bits & 2 != 0,
                    is_percent: bits & 4 != 0,
                };
                let encoded = original.to_string();
                let reparsed: SpecialBonusValue = encoded.parse().unwrap();
                assert_eq!(reparsed, original, "round trip of {}", encoded);
            }
        }
    }
}
