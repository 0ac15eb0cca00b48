use thiserror::Error;

use crate::search::SizeClass;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Short read at address {address:#x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        address: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Buffer too small for {size} value: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        size: SizeClass,
        needed: usize,
        actual: usize,
    },

    #[error("Invalid filter value: {0}")]
    InvalidFilterValue(String),

    #[error("Invalid filter: {0}")]
    InvalidFilterSpec(String),

    #[error("Cannot compare {addresses} candidates with {values} values")]
    MismatchedGenerations {
        values: SizeClass,
        addresses: SizeClass,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from the memory source rather than the engine
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Error::MemoryReadFailed { .. } | Error::ShortRead { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_read_failure() {
        let err = Error::MemoryReadFailed {
            address: 0x10,
            message: "unmapped".to_string(),
        };
        assert!(err.is_read_failure());

        let err = Error::ShortRead {
            address: 0x10,
            expected: 4,
            actual: 2,
        };
        assert!(err.is_read_failure());

        let err = Error::InvalidFilterValue("abc".to_string());
        assert!(!err.is_read_failure());
    }

    #[test]
    fn test_error_display() {
        let err = Error::ShortRead {
            address: 0x1000,
            expected: 4,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Short read at address 0x1000: expected 4 bytes, got 2"
        );

        let err = Error::BufferTooSmall {
            size: SizeClass::ThirtyTwoBit,
            needed: 4,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Buffer too small for 32-bit value: need 4 bytes, got 1"
        );

        let err = Error::MismatchedGenerations {
            values: SizeClass::EightBit,
            addresses: SizeClass::SixteenBit,
        };
        assert_eq!(
            err.to_string(),
            "Cannot compare 16-bit candidates with 8-bit values"
        );
    }
}
