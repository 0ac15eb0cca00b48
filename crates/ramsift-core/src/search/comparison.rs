use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Predicate applied between a candidate's current value and a reference value
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum ComparisonType {
    #[default]
    #[strum(to_string = "EQUAL", serialize = "=", serialize = "==", serialize = "eq")]
    Equals,
    #[strum(to_string = "NOT EQUAL", serialize = "!=", serialize = "ne")]
    NotEqualTo,
    #[strum(to_string = "GREATER THAN", serialize = ">", serialize = "gt")]
    GreaterThan,
    #[strum(to_string = "GREATER THAN/EQUAL", serialize = ">=", serialize = "ge")]
    GreaterThanOrEqual,
    #[strum(to_string = "LESS THAN", serialize = "<", serialize = "lt")]
    LessThan,
    #[strum(to_string = "LESS THAN/EQUAL", serialize = "<=", serialize = "le")]
    LessThanOrEqual,
}

impl ComparisonType {
    /// Evaluate `current <op> reference`
    pub fn compare(self, current: u32, reference: u32) -> bool {
        match self {
            Self::Equals => current == reference,
            Self::NotEqualTo => current != reference,
            Self::GreaterThan => current > reference,
            Self::GreaterThanOrEqual => current >= reference,
            Self::LessThan => current < reference,
            Self::LessThanOrEqual => current <= reference,
        }
    }

    /// Label used in filter summaries (e.g. "NOT EQUAL")
    pub fn label(self) -> &'static str {
        self.into()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEqualTo => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
        }
    }

    /// Whether a value always satisfies this comparison against itself
    pub fn is_reflexive(self) -> bool {
        matches!(
            self,
            Self::Equals | Self::GreaterThanOrEqual | Self::LessThanOrEqual
        )
    }
}
