//! Value interpretations for search candidates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// How the bytes at a candidate address are read as an unsigned value.
///
/// Nibble classes address half of a byte: `NibbleLower` is bits 0-3 and
/// `NibbleUpper` is bits 4-7 of the same byte.
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
pub enum SizeClass {
    #[default]
    #[serde(rename = "8-bit")]
    #[strum(to_string = "8-bit", serialize = "8", serialize = "u8")]
    EightBit,
    #[serde(rename = "16-bit")]
    #[strum(to_string = "16-bit", serialize = "16", serialize = "u16")]
    SixteenBit,
    #[serde(rename = "24-bit")]
    #[strum(to_string = "24-bit", serialize = "24", serialize = "u24")]
    TwentyFourBit,
    #[serde(rename = "32-bit")]
    #[strum(to_string = "32-bit", serialize = "32", serialize = "u32")]
    ThirtyTwoBit,
    #[serde(rename = "16-bit BE")]
    #[strum(to_string = "16-bit BE", serialize = "16be", serialize = "u16be")]
    SixteenBitBigEndian,
    #[serde(rename = "32-bit BE")]
    #[strum(to_string = "32-bit BE", serialize = "32be", serialize = "u32be")]
    ThirtyTwoBitBigEndian,
    #[serde(rename = "Lower4")]
    #[strum(to_string = "Lower4", serialize = "lower", serialize = "nibble")]
    NibbleLower,
    #[serde(rename = "Upper4")]
    #[strum(to_string = "Upper4", serialize = "upper")]
    NibbleUpper,
}

impl SizeClass {
    /// Number of bytes a value of this class spans
    pub fn byte_width(self) -> usize {
        match self {
            Self::EightBit | Self::NibbleLower | Self::NibbleUpper => 1,
            Self::SixteenBit | Self::SixteenBitBigEndian => 2,
            Self::TwentyFourBit => 3,
            Self::ThirtyTwoBit | Self::ThirtyTwoBitBigEndian => 4,
        }
    }

    /// Bytes needed after a candidate's address to hold its value
    pub fn padding(self) -> usize {
        self.byte_width() - 1
    }

    pub fn is_nibble(self) -> bool {
        matches!(self, Self::NibbleLower | Self::NibbleUpper)
    }

    pub fn is_big_endian(self) -> bool {
        matches!(self, Self::SixteenBitBigEndian | Self::ThirtyTwoBitBigEndian)
    }

    /// Number of distinct candidates that start in one byte
    pub fn slots_per_byte(self) -> u64 {
        if self.is_nibble() { 2 } else { 1 }
    }

    pub fn max_value(self) -> u32 {
        match self {
            Self::NibbleLower | Self::NibbleUpper => 0x0F,
            Self::EightBit => 0xFF,
            Self::SixteenBit | Self::SixteenBitBigEndian => 0xFFFF,
            Self::TwentyFourBit => 0x00FF_FFFF,
            Self::ThirtyTwoBit | Self::ThirtyTwoBitBigEndian => 0xFFFF_FFFF,
        }
    }

    /// Hex digits needed to show any value of this class
    pub fn hex_digits(self) -> usize {
        if self.is_nibble() {
            1
        } else {
            self.byte_width() * 2
        }
    }

    /// The class a baseline scan records; both nibble requests scan as `NibbleLower`
    pub fn scan_class(self) -> Self {
        if self.is_nibble() {
            Self::NibbleLower
        } else {
            self
        }
    }

    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Label used in the baseline scan summary
    pub fn scan_label(self) -> &'static str {
        self.scan_class().label()
    }

    /// Decode a value from the start of `bytes`.
    ///
    /// Returns `None` when `bytes` is shorter than [`byte_width`](Self::byte_width).
    pub fn decode(self, bytes: &[u8]) -> Option<u32> {
        let b = bytes.get(..self.byte_width())?;
        let value = match self {
            Self::EightBit => u32::from(b[0]),
            Self::SixteenBit => u32::from(u16::from_le_bytes([b[0], b[1]])),
            Self::TwentyFourBit => u32::from_le_bytes([b[0], b[1], b[2], 0]),
            Self::ThirtyTwoBit => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Self::SixteenBitBigEndian => u32::from(u16::from_be_bytes([b[0], b[1]])),
            Self::ThirtyTwoBitBigEndian => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            Self::NibbleLower => u32::from(b[0] & 0x0F),
            Self::NibbleUpper => u32::from(b[0] >> 4),
        };
        Some(value)
    }

    /// Encode `value` into the start of `bytes`.
    ///
    /// The value is truncated to [`max_value`](Self::max_value). Nibble writes
    /// leave the other half of the byte untouched.
    pub fn encode(self, value: u32, bytes: &mut [u8]) -> Result<()> {
        let needed = self.byte_width();
        let actual = bytes.len();
        let Some(target) = bytes.get_mut(..needed) else {
            return Err(Error::BufferTooSmall {
                size: self,
                needed,
                actual,
            });
        };

        let value = value & self.max_value();
        match self {
            Self::EightBit => target[0] = value as u8,
            Self::SixteenBit => target.copy_from_slice(&(value as u16).to_le_bytes()),
            Self::TwentyFourBit => target.copy_from_slice(&value.to_le_bytes()[..3]),
            Self::ThirtyTwoBit => target.copy_from_slice(&value.to_le_bytes()),
            Self::SixteenBitBigEndian => target.copy_from_slice(&(value as u16).to_be_bytes()),
            Self::ThirtyTwoBitBigEndian => target.copy_from_slice(&value.to_be_bytes()),
            Self::NibbleLower => target[0] = (target[0] & 0xF0) | value as u8,
            Self::NibbleUpper => target[0] = (target[0] & 0x0F) | ((value as u8) << 4),
        }
        Ok(())
    }
}
