//! Address and value parsing and formatting.

use anyhow::{Result, anyhow};
use ramsift_core::{ByteAddress, SizeClass};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<ByteAddress> {
    let s = s.trim();
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    ByteAddress::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid hex address {s:?}: {e}"))
}

/// Parse a count: hex with a 0x prefix, decimal otherwise.
pub fn parse_number(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| anyhow!("Invalid number {s:?}: {e}"))
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: ByteAddress) -> String {
    format!("0x{:06X}", addr)
}

/// Format a value as hex padded to the width of its size class.
pub fn format_value(value: u32, size: SizeClass) -> String {
    format!("0x{:0width$X}", value, width = size.hex_digits())
}
