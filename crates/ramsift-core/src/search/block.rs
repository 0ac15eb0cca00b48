//! Captured memory blocks and the candidate slots that survive in them.
//!
//! A block owns the bytes of one contiguous span of memory as they were when
//! the generation was built, plus the set of candidate *slots* that still
//! match. For byte-granular classes a slot is the candidate's address; for
//! nibble classes it is `address * 2` for the lower half and `address * 2 + 1`
//! for the upper half, so ascending slot order is ascending address order with
//! `Lower` before `Upper`.

use super::SizeClass;
use crate::memory::ByteAddress;

/// Upper bound on candidate start bytes held by a single block (256 KiB)
pub const MAX_BLOCK_SIZE: u32 = 256 * 1024;

const WORD_BITS: u32 = u64::BITS;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MatchSet {
    All,
    Subset { bits: Vec<u64>, count: u32 },
}

#[derive(Debug, Clone)]
pub(crate) struct MemBlock {
    address: ByteAddress,
    bytes: Vec<u8>,
    size: SizeClass,
    slot_count: u32,
    matches: MatchSet,
}

impl MemBlock {
    /// Block in which every slot the bytes can hold is a candidate
    pub(crate) fn new(address: ByteAddress, bytes: Vec<u8>, size: SizeClass) -> Self {
        let start_bytes = bytes.len().saturating_sub(size.padding()) as u64;
        let slot_count = u32::try_from(start_bytes * size.slots_per_byte()).unwrap_or(u32::MAX);
        Self {
            address,
            bytes,
            size,
            slot_count,
            matches: MatchSet::All,
        }
    }

    /// Block in which only `slots` (absolute, ascending) are candidates
    pub(crate) fn with_matches(
        address: ByteAddress,
        bytes: Vec<u8>,
        size: SizeClass,
        slots: &[u64],
    ) -> Self {
        let mut block = Self::new(address, bytes, size);
        let first = block.first_slot();
        let mut bits = vec![0u64; block.slot_count.div_ceil(WORD_BITS) as usize];
        let mut count = 0;
        for &slot in slots {
            if !block.contains_slot(slot) {
                continue;
            }
            let offset = (slot - first) as usize;
            bits[offset / WORD_BITS as usize] |= 1 << (offset % WORD_BITS as usize);
            count += 1;
        }

        if count != block.slot_count {
            block.matches = MatchSet::Subset { bits, count };
        }
        block
    }

    pub(crate) fn address(&self) -> ByteAddress {
        self.address
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn first_slot(&self) -> u64 {
        u64::from(self.address) * self.size.slots_per_byte()
    }

    pub(crate) fn contains_slot(&self, slot: u64) -> bool {
        slot >= self.first_slot() && slot - self.first_slot() < u64::from(self.slot_count)
    }

    pub(crate) fn matching_count(&self) -> u32 {
        match &self.matches {
            MatchSet::All => self.slot_count,
            MatchSet::Subset { count, .. } => *count,
        }
    }

    pub(crate) fn is_match(&self, slot: u64) -> bool {
        if !self.contains_slot(slot) {
            return false;
        }
        match &self.matches {
            MatchSet::All => true,
            MatchSet::Subset { bits, .. } => {
                let offset = (slot - self.first_slot()) as usize;
                bits[offset / WORD_BITS as usize] & (1 << (offset % WORD_BITS as usize)) != 0
            }
        }
    }

    /// Remove `slot` from the candidates. Returns false if it was not one.
    pub(crate) fn exclude(&mut self, slot: u64) -> bool {
        if !self.is_match(slot) {
            return false;
        }

        if self.matches == MatchSet::All {
            let mut bits = vec![u64::MAX; self.slot_count.div_ceil(WORD_BITS) as usize];
            let tail = self.slot_count % WORD_BITS;
            if tail != 0
                && let Some(last) = bits.last_mut()
            {
                *last = (1 << tail) - 1;
            }
            self.matches = MatchSet::Subset {
                bits,
                count: self.slot_count,
            };
        }

        let offset = (slot - self.first_slot()) as usize;
        if let MatchSet::Subset { bits, count } = &mut self.matches {
            bits[offset / WORD_BITS as usize] &= !(1 << (offset % WORD_BITS as usize));
            *count -= 1;
        }
        true
    }

    /// Slot of the `index`-th surviving candidate in this block
    pub(crate) fn nth_match(&self, index: u32) -> Option<u64> {
        if index >= self.matching_count() {
            return None;
        }

        match &self.matches {
            MatchSet::All => Some(self.first_slot() + u64::from(index)),
            MatchSet::Subset { bits, .. } => {
                let mut remaining = index;
                for (word_index, &word) in bits.iter().enumerate() {
                    let ones = word.count_ones();
                    if remaining >= ones {
                        remaining -= ones;
                        continue;
                    }

                    let mut word = word;
                    for _ in 0..remaining {
                        word &= word - 1;
                    }
                    let offset = word_index as u64 * u64::from(WORD_BITS)
                        + u64::from(word.trailing_zeros());
                    return Some(self.first_slot() + offset);
                }
                None
            }
        }
    }

    pub(crate) fn matching_slots(&self) -> MatchingSlots<'_> {
        MatchingSlots {
            first_slot: self.first_slot(),
            slot_count: self.slot_count,
            bits: match &self.matches {
                MatchSet::All => None,
                MatchSet::Subset { bits, .. } => Some(bits.as_slice()),
            },
            next: 0,
            word: 0,
            pending: 0,
        }
    }

    /// Value of `slot` as captured when this block was built
    pub(crate) fn value_at(&self, slot: u64) -> Option<u32> {
        self.decode_slot(&self.bytes, slot)
    }

    /// Decode `slot` from `memory`, a buffer covering the same span as this block
    pub(crate) fn decode_slot(&self, memory: &[u8], slot: u64) -> Option<u32> {
        if !self.contains_slot(slot) {
            return None;
        }
        let offset = ((slot - self.first_slot()) / self.size.slots_per_byte()) as usize;
        slot_size(self.size, slot).decode(memory.get(offset..)?)
    }
}

/// Concrete size of the candidate in `slot` for a generation of class `size`
pub(crate) fn slot_size(size: SizeClass, slot: u64) -> SizeClass {
    match size {
        SizeClass::NibbleLower | SizeClass::NibbleUpper if slot & 1 == 1 => SizeClass::NibbleUpper,
        SizeClass::NibbleLower | SizeClass::NibbleUpper => SizeClass::NibbleLower,
        other => other,
    }
}

/// Slot holding the candidate `(address, size)` in a generation of class `generation`
pub(crate) fn slot_for(generation: SizeClass, address: ByteAddress, size: SizeClass) -> Option<u64> {
    match (generation.is_nibble(), size) {
        (true, SizeClass::NibbleLower) => Some(u64::from(address) * 2),
        (true, SizeClass::NibbleUpper) => Some(u64::from(address) * 2 + 1),
        (false, size) if size == generation => Some(u64::from(address)),
        _ => None,
    }
}

/// Ascending iterator over the surviving slots of a block
pub(crate) struct MatchingSlots<'a> {
    first_slot: u64,
    slot_count: u32,
    bits: Option<&'a [u64]>,
    next: u32,
    word: usize,
    pending: u64,
}

impl Iterator for MatchingSlots<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let Some(bits) = self.bits else {
            if self.next >= self.slot_count {
                return None;
            }
            let slot = self.first_slot + u64::from(self.next);
            self.next += 1;
            return Some(slot);
        };

        while self.pending == 0 {
            self.pending = *bits.get(self.word)?;
            self.word += 1;
        }

        let bit = self.pending.trailing_zeros();
        self.pending &= self.pending - 1;
        let word_base = (self.word as u64 - 1) * u64::from(WORD_BITS);
        Some(self.first_slot + word_base + u64::from(bit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_slot_count() {
        let block = MemBlock::new(10, vec![0; 5], SizeClass::SixteenBit);
        assert_eq!(block.matching_count(), 4);
        assert!(block.contains_slot(10));
        assert!(block.contains_slot(13));
        assert!(!block.contains_slot(14));

        let block = MemBlock::new(10, vec![0; 5], SizeClass::NibbleLower);
        assert_eq!(block.first_slot(), 20);
        assert_eq!(block.matching_count(), 10);
        assert!(block.contains_slot(29));
        assert!(!block.contains_slot(30));
    }

    #[test]
    fn test_padding_only_block_is_empty() {
        let block = MemBlock::new(0, vec![0; 3], SizeClass::ThirtyTwoBit);
        assert_eq!(block.matching_count(), 0);
        assert_eq!(block.matching_slots().count(), 0);
    }

    #[test]
    fn test_exclude_from_full_block() {
        let mut block = MemBlock::new(0, vec![0; 70], SizeClass::EightBit);
        assert!(block.exclude(3));
        assert!(!block.exclude(3));
        assert!(!block.exclude(500));
        assert_eq!(block.matching_count(), 69);
        assert!(!block.is_match(3));
        assert!(block.is_match(69));
        assert_eq!(block.matching_slots().count(), 69);
        assert_eq!(block.matching_slots().last(), Some(69));
    }

    #[test]
    fn test_with_matches_and_nth() {
        let slots = [101, 105, 170, 199];
        let block = MemBlock::with_matches(100, vec![0; 100], SizeClass::EightBit, &slots);
        assert_eq!(block.matching_count(), 4);
        assert_eq!(block.nth_match(0), Some(101));
        assert_eq!(block.nth_match(2), Some(170));
        assert_eq!(block.nth_match(3), Some(199));
        assert_eq!(block.nth_match(4), None);
        assert_eq!(block.matching_slots().collect::<Vec<_>>(), slots);
    }

    #[test]
    fn test_with_all_matches_collapses() {
        let block = MemBlock::with_matches(4, vec![0; 3], SizeClass::EightBit, &[4, 5, 6]);
        assert_eq!(block.matches, MatchSet::All);
    }

    #[test]
    fn test_nibble_slots_decode_both_halves() {
        let block = MemBlock::new(1, vec![0x12, 0x34], SizeClass::NibbleLower);
        let values: Vec<_> = block
            .matching_slots()
            .map(|slot| (slot, slot_size(SizeClass::NibbleLower, slot), block.value_at(slot)))
            .collect();
        assert_eq!(
            values,
            vec![
                (2, SizeClass::NibbleLower, Some(0x2)),
                (3, SizeClass::NibbleUpper, Some(0x1)),
                (4, SizeClass::NibbleLower, Some(0x4)),
                (5, SizeClass::NibbleUpper, Some(0x3)),
            ]
        );
    }

    #[test]
    fn test_decode_slot_uses_padding() {
        let block = MemBlock::new(0, vec![0x00, 0x12, 0x34], SizeClass::SixteenBit);
        assert_eq!(block.value_at(1), Some(0x3412));
        assert_eq!(block.decode_slot(&[0x00, 0xFF, 0x01], 1), Some(0x01FF));
        assert_eq!(block.value_at(2), None);
    }

    #[test]
    fn test_slot_for() {
        assert_eq!(slot_for(SizeClass::NibbleLower, 3, SizeClass::NibbleUpper), Some(7));
        assert_eq!(slot_for(SizeClass::NibbleLower, 3, SizeClass::NibbleLower), Some(6));
        assert_eq!(slot_for(SizeClass::SixteenBit, 3, SizeClass::SixteenBit), Some(3));
        assert_eq!(slot_for(SizeClass::SixteenBit, 3, SizeClass::EightBit), None);
        assert_eq!(slot_for(SizeClass::EightBit, 3, SizeClass::NibbleLower), None);
    }
}
