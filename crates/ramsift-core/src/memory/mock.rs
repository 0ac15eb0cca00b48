//! In-memory reader for exercising the search engine without a live target.

use std::cell::RefCell;

use super::{ByteAddress, ReadMemory, WriteMemory};
use crate::error::{Error, Result};
use crate::search::SizeClass;

/// A memory image backed by a `Vec<u8>` that records every read
#[derive(Debug, Default)]
pub struct MockMemoryReader {
    data: Vec<u8>,
    fail_at: Option<ByteAddress>,
    truncate_reads: bool,
    reads: RefCell<Vec<(ByteAddress, usize)>>,
}

impl MockMemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite one byte; addresses past the end are ignored
    pub fn set_byte(&mut self, address: ByteAddress, value: u8) {
        if let Some(byte) = self.data.get_mut(address as usize) {
            *byte = value;
        }
    }

    /// Every `(address, size)` read so far, in order
    pub fn reads(&self) -> Vec<(ByteAddress, usize)> {
        self.reads.borrow().clone()
    }

    pub fn bytes_read(&self) -> usize {
        self.reads.borrow().iter().map(|(_, size)| size).sum()
    }

    pub fn clear_reads(&self) {
        self.reads.borrow_mut().clear();
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: ByteAddress, size: usize) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push((address, size));

        let start = address as usize;
        let end = start.saturating_add(size);
        if let Some(bad) = self.fail_at
            && (start..end).contains(&(bad as usize))
        {
            return Err(Error::MemoryReadFailed {
                address: u64::from(bad),
                message: "unreadable address".to_string(),
            });
        }

        if self.truncate_reads {
            let end = end.min(self.data.len());
            return Ok(self.data.get(start..end).unwrap_or_default().to_vec());
        }
        self.data.read_bytes(address, size)
    }

    fn total_size(&self) -> u32 {
        self.data.total_size()
    }
}

impl WriteMemory for MockMemoryReader {
    fn write_bytes(&mut self, address: ByteAddress, bytes: &[u8]) -> Result<()> {
        self.data.write_bytes(address, bytes)
    }
}

/// Builder for [`MockMemoryReader`]
#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
    fail_at: Option<ByteAddress>,
    truncate_reads: bool,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, bytes: &[u8]) -> Self {
        self.data = bytes.to_vec();
        self
    }

    /// Zero-filled image of `size` bytes
    pub fn with_size(mut self, size: usize) -> Self {
        self.data = vec![0; size];
        self
    }

    /// Image of `size` bytes where each byte is `pattern(address)`
    pub fn with_pattern(mut self, size: usize, pattern: impl Fn(usize) -> u8) -> Self {
        self.data = (0..size).map(pattern).collect();
        self
    }

    /// Encode `value` as `size` at `address`, growing the image if needed
    pub fn with_value(mut self, address: ByteAddress, size: SizeClass, value: u32) -> Self {
        let start = address as usize;
        let end = start + size.byte_width();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        size.encode(value, &mut self.data[start..end])
            .expect("image was resized to hold the value");
        self
    }

    /// Make any read covering `address` fail
    pub fn fail_at(mut self, address: ByteAddress) -> Self {
        self.fail_at = Some(address);
        self
    }

    /// Return what is available instead of failing on reads past the end
    pub fn truncate_reads(mut self) -> Self {
        self.truncate_reads = true;
        self
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            data: self.data,
            fail_at: self.fail_at,
            truncate_reads: self.truncate_reads,
            reads: RefCell::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reads_are_logged() {
        let memory = MockMemoryBuilder::new().with_size(8).build();
        memory.read_bytes(2, 4).unwrap();
        memory.read_bytes(0, 1).unwrap();
        assert_eq!(memory.reads(), vec![(2, 4), (0, 1)]);
        assert_eq!(memory.bytes_read(), 5);

        memory.clear_reads();
        assert!(memory.reads().is_empty());
    }

    #[test]
    fn test_mock_builder_values() {
        let memory = MockMemoryBuilder::new()
            .with_value(2, SizeClass::SixteenBitBigEndian, 0x1234)
            .build();
        assert_eq!(memory.data(), &[0x00, 0x00, 0x12, 0x34]);
        assert_eq!(memory.total_size(), 4);
    }

    #[test]
    fn test_mock_builder_values_inside_image() {
        let memory = MockMemoryBuilder::new()
            .with_bytes(&[0xAA; 6])
            .with_value(1, SizeClass::TwentyFourBit, 0x0102_0304)
            .with_value(5, SizeClass::NibbleUpper, 0x3)
            .build();
        assert_eq!(memory.data(), &[0xAA, 0x04, 0x03, 0x02, 0xAA, 0x3A]);
    }

    #[test]
    fn test_mock_pattern() {
        let memory = MockMemoryBuilder::new()
            .with_pattern(300, |i| (i % 256) as u8)
            .build();
        assert_eq!(memory.read_bytes(255, 2).unwrap(), vec![0xFF, 0x00]);
    }

    #[test]
    fn test_mock_fail_at() {
        let memory = MockMemoryBuilder::new().with_size(8).fail_at(4).build();
        assert!(memory.read_bytes(0, 4).is_ok());
        assert!(memory.read_bytes(3, 2).is_err());
    }

    #[test]
    fn test_mock_truncated_read_is_short() {
        let memory = MockMemoryBuilder::new()
            .with_size(4)
            .truncate_reads()
            .build();
        assert_eq!(memory.read_bytes(2, 4).unwrap().len(), 2);
        let err = memory.read_exact(2, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                expected: 4,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_mock_set_byte_and_poke() {
        let mut memory = MockMemoryReader::new(vec![0; 2]);
        memory.set_byte(1, 0xF0);
        memory.set_byte(9, 0xFF);
        memory.poke(1, SizeClass::NibbleLower, 0xA).unwrap();
        assert_eq!(memory.data(), &[0x00, 0xFA]);
    }
}
