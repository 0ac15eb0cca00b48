//! Reference operands for narrowing steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ComparisonType;
use crate::error::{Error, Result};

/// What a candidate's current value is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchFilter {
    /// A caller supplied constant
    Constant(u32),
    /// The candidate's value captured by the previous generation
    #[default]
    LastKnownValue,
    /// Previous value plus a delta (wrapping u32 arithmetic)
    LastKnownValuePlus(u32),
    /// Previous value minus a delta (wrapping u32 arithmetic)
    LastKnownValueMinus(u32),
    /// The value captured by the baseline scan, see
    /// [`SearchResults::filter_against`](super::SearchResults::filter_against)
    InitialValue,
}

impl SearchFilter {
    pub fn is_constant(self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Delta added to the previous value; zero for constant and plain last-known filters
    pub fn adjustment(self) -> u32 {
        match self {
            Self::LastKnownValuePlus(delta) => delta,
            Self::LastKnownValueMinus(delta) => delta.wrapping_neg(),
            Self::Constant(_) | Self::LastKnownValue | Self::InitialValue => 0,
        }
    }

    /// Reference operand for a candidate whose previous value was `previous`
    pub fn reference(self, previous: u32) -> u32 {
        match self {
            Self::Constant(value) => value,
            _ => previous.wrapping_add(self.adjustment()),
        }
    }

    /// Summary recorded on the generation this filter produces
    pub fn describe(self, comparison: ComparisonType) -> String {
        let label = comparison.label();
        match self {
            Self::Constant(value) => format!("Filtering for {label} {value}..."),
            Self::LastKnownValue => format!("Filtering for {label} last known value..."),
            Self::LastKnownValuePlus(delta) => {
                format!("Filtering for {label} last known value plus {delta}...")
            }
            Self::LastKnownValueMinus(delta) => {
                format!("Filtering for {label} last known value minus {delta}...")
            }
            Self::InitialValue => format!("Filtering for {label} initial value..."),
        }
    }
}

/// A comparison and its reference operand, i.e. one narrowing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterStep {
    pub comparison: ComparisonType,
    pub filter: SearchFilter,
}

impl FilterStep {
    pub fn new(comparison: ComparisonType, filter: SearchFilter) -> Self {
        Self { comparison, filter }
    }

    /// Evaluate the step for a candidate
    pub fn matches(&self, current: u32, previous: u32) -> bool {
        self.comparison
            .compare(current, self.filter.reference(previous))
    }

    pub fn describe(&self) -> String {
        self.filter.describe(self.comparison)
    }
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.comparison.symbol();
        match self.filter {
            SearchFilter::Constant(value) => write!(f, "{op}{value}"),
            SearchFilter::LastKnownValue => write!(f, "{op}"),
            SearchFilter::LastKnownValuePlus(delta) => write!(f, "{op}+{delta}"),
            SearchFilter::LastKnownValueMinus(delta) => write!(f, "{op}-{delta}"),
            SearchFilter::InitialValue => write!(f, "{op}init"),
        }
    }
}

/// Parses `<op>[operand]`: `op` is one of `= == != > >= < <=`; the operand is
/// a constant, `+n`/`-n` for last known value plus/minus, `init` for the
/// initial value, or empty for the last known value.
impl FromStr for FilterStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !matches!(c, '=' | '!' | '<' | '>'))
            .unwrap_or(s.len());
        let (op, operand) = s.split_at(split);
        if op.is_empty() {
            return Err(Error::InvalidFilterSpec(format!(
                "missing comparison in {s:?}"
            )));
        }

        let comparison = op
            .parse::<ComparisonType>()
            .map_err(|_| Error::InvalidFilterSpec(format!("unknown comparison {op:?}")))?;

        let operand = operand.trim();
        let filter = if operand.is_empty() {
            SearchFilter::LastKnownValue
        } else if operand.eq_ignore_ascii_case("init") {
            SearchFilter::InitialValue
        } else if let Some(delta) = operand.strip_prefix('+') {
            SearchFilter::LastKnownValuePlus(parse_filter_value(delta)?)
        } else if let Some(delta) = operand.strip_prefix('-') {
            SearchFilter::LastKnownValueMinus(parse_filter_value(delta)?)
        } else {
            SearchFilter::Constant(parse_filter_value(operand)?)
        };

        Ok(Self { comparison, filter })
    }
}

/// Parse a filter constant: decimal first, then hexadecimal (`0x` optional).
pub fn parse_filter_value(text: &str) -> Result<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidFilterValue("value is empty".to_string()));
    }

    if let Ok(value) = text.parse::<u32>() {
        return Ok(value);
    }

    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidFilterValue(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_value_decimal_first() {
        assert_eq!(parse_filter_value("171").unwrap(), 171);
        assert_eq!(parse_filter_value("10").unwrap(), 10);
        assert_eq!(parse_filter_value(" 42 ").unwrap(), 42);
    }

    #[test]
    fn test_parse_filter_value_hex_fallback() {
        assert_eq!(parse_filter_value("AB").unwrap(), 0xAB);
        assert_eq!(parse_filter_value("0x10").unwrap(), 0x10);
        assert_eq!(parse_filter_value("0XFF").unwrap(), 0xFF);
    }

    #[test]
    fn test_parse_filter_value_invalid() {
        assert!(parse_filter_value("").is_err());
        assert!(parse_filter_value("xyz").is_err());
        assert!(parse_filter_value("0x1FFFFFFFF").is_err());
    }

    #[test]
    fn test_reference() {
        assert_eq!(SearchFilter::Constant(9).reference(100), 9);
        assert_eq!(SearchFilter::LastKnownValue.reference(100), 100);
        assert_eq!(SearchFilter::LastKnownValuePlus(5).reference(100), 105);
        assert_eq!(SearchFilter::LastKnownValueMinus(5).reference(100), 95);
        assert_eq!(SearchFilter::LastKnownValueMinus(1).reference(0), u32::MAX);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            SearchFilter::Constant(0xAB).describe(ComparisonType::Equals),
            "Filtering for EQUAL 171..."
        );
        assert_eq!(
            SearchFilter::LastKnownValue.describe(ComparisonType::NotEqualTo),
            "Filtering for NOT EQUAL last known value..."
        );
        assert_eq!(
            SearchFilter::LastKnownValuePlus(2).describe(ComparisonType::GreaterThan),
            "Filtering for GREATER THAN last known value plus 2..."
        );
    }

    #[test]
    fn test_parse_filter_step() {
        let step: FilterStep = "=171".parse().unwrap();
        assert_eq!(step, FilterStep::new(ComparisonType::Equals, SearchFilter::Constant(171)));

        let step: FilterStep = "!=".parse().unwrap();
        assert_eq!(
            step,
            FilterStep::new(ComparisonType::NotEqualTo, SearchFilter::LastKnownValue)
        );

        let step: FilterStep = ">= 0x10".parse().unwrap();
        assert_eq!(
            step,
            FilterStep::new(ComparisonType::GreaterThanOrEqual, SearchFilter::Constant(16))
        );

        let step: FilterStep = "=+1".parse().unwrap();
        assert_eq!(
            step,
            FilterStep::new(ComparisonType::Equals, SearchFilter::LastKnownValuePlus(1))
        );

        let step: FilterStep = "<-3".parse().unwrap();
        assert_eq!(
            step,
            FilterStep::new(ComparisonType::LessThan, SearchFilter::LastKnownValueMinus(3))
        );
    }

    #[test]
    fn test_parse_initial_value() {
        let step: FilterStep = "!= INIT".parse().unwrap();
        assert_eq!(
            step,
            FilterStep::new(ComparisonType::NotEqualTo, SearchFilter::InitialValue)
        );
        assert_eq!(
            step.describe(),
            "Filtering for NOT EQUAL initial value..."
        );
        assert_eq!(SearchFilter::InitialValue.reference(7), 7);
    }

    #[test]
    fn test_parse_filter_step_invalid() {
        assert!("171".parse::<FilterStep>().is_err());
        assert!("=>5".parse::<FilterStep>().is_err());
        assert!("=zz".parse::<FilterStep>().is_err());
    }

    #[test]
    fn test_filter_step_display_parses_back() {
        for text in ["=171", "!=", ">+4", "<=-2", "!=init"] {
            let step: FilterStep = text.parse().unwrap();
            assert_eq!(step.to_string(), text);
        }
    }

    #[test]
    fn test_filter_step_matches() {
        let step = FilterStep::new(ComparisonType::Equals, SearchFilter::LastKnownValuePlus(1));
        assert!(step.matches(6, 5));
        assert!(!step.matches(5, 5));
    }
}
