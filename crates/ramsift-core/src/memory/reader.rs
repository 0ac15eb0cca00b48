use crate::error::{Error, Result};
use crate::search::SizeClass;

/// Address of a byte in the searched memory image
pub type ByteAddress = u32;

/// Read access to a byte-addressable memory image
pub trait ReadMemory {
    /// Read `size` bytes starting at `address`
    fn read_bytes(&self, address: ByteAddress, size: usize) -> Result<Vec<u8>>;

    /// Size of the addressable image in bytes
    fn total_size(&self) -> u32;

    /// Read exactly `size` bytes, treating a shorter result as an error
    fn read_exact(&self, address: ByteAddress, size: usize) -> Result<Vec<u8>> {
        let bytes = self.read_bytes(address, size)?;
        if bytes.len() != size {
            return Err(Error::ShortRead {
                address: u64::from(address),
                expected: size,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Read and decode one value of `size` at `address`
    fn read_value(&self, address: ByteAddress, size: SizeClass) -> Result<u32> {
        let bytes = self.read_exact(address, size.byte_width())?;
        size.decode(&bytes).ok_or(Error::ShortRead {
            address: u64::from(address),
            expected: size.byte_width(),
            actual: bytes.len(),
        })
    }
}

/// Write access, for callers that patch memory
pub trait WriteMemory: ReadMemory {
    fn write_bytes(&mut self, address: ByteAddress, bytes: &[u8]) -> Result<()>;

    /// Encode `value` as `size` at `address`. Nibble writes keep the other half of the byte.
    fn poke(&mut self, address: ByteAddress, size: SizeClass, value: u32) -> Result<()> {
        let mut bytes = self.read_exact(address, size.byte_width())?;
        size.encode(value, &mut bytes)?;
        self.write_bytes(address, &bytes)
    }
}

fn out_of_range(address: ByteAddress, size: usize, len: usize) -> Error {
    Error::MemoryReadFailed {
        address: u64::from(address),
        message: format!("{size} bytes exceed image of {len} bytes"),
    }
}

impl ReadMemory for [u8] {
    fn read_bytes(&self, address: ByteAddress, size: usize) -> Result<Vec<u8>> {
        let start = address as usize;
        start
            .checked_add(size)
            .and_then(|end| self.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| out_of_range(address, size, self.len()))
    }

    fn total_size(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }
}

impl ReadMemory for Vec<u8> {
    fn read_bytes(&self, address: ByteAddress, size: usize) -> Result<Vec<u8>> {
        self.as_slice().read_bytes(address, size)
    }

    fn total_size(&self) -> u32 {
        self.as_slice().total_size()
    }
}

impl WriteMemory for Vec<u8> {
    fn write_bytes(&mut self, address: ByteAddress, bytes: &[u8]) -> Result<()> {
        let start = address as usize;
        let len = self.len();
        let target = start
            .checked_add(bytes.len())
            .and_then(|end| self.get_mut(start..end))
            .ok_or_else(|| out_of_range(address, bytes.len(), len))?;
        target.copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_read_bytes() {
        let memory = [0x10u8, 0x20, 0x30, 0x40];
        assert_eq!(memory[..].read_bytes(1, 2).unwrap(), vec![0x20, 0x30]);
        assert_eq!(memory[..].total_size(), 4);
        assert!(memory[..].read_bytes(3, 2).is_err());
        assert!(memory[..].read_bytes(u32::MAX, 2).is_err());
    }

    #[test]
    fn test_read_value() {
        let memory = vec![0x10u8, 0x20, 0x30, 0x40];
        assert_eq!(memory.read_value(0, SizeClass::SixteenBit).unwrap(), 0x2010);
        assert_eq!(
            memory.read_value(0, SizeClass::ThirtyTwoBitBigEndian).unwrap(),
            0x10203040
        );
        assert_eq!(memory.read_value(3, SizeClass::NibbleUpper).unwrap(), 0x4);
        assert!(memory.read_value(2, SizeClass::ThirtyTwoBit).is_err());
    }

    #[test]
    fn test_poke_nibble_keeps_other_half() {
        let mut memory = vec![0xABu8, 0x00];
        memory.poke(0, SizeClass::NibbleLower, 0x5).unwrap();
        assert_eq!(memory, vec![0xA5, 0x00]);

        memory.poke(0, SizeClass::NibbleUpper, 0x1).unwrap();
        assert_eq!(memory, vec![0x15, 0x00]);
    }

    #[test]
    fn test_poke_out_of_range() {
        let mut memory = vec![0u8; 2];
        assert!(memory.poke(1, SizeClass::SixteenBit, 1).is_err());
        assert!(memory.write_bytes(2, &[1]).is_err());
    }
}
