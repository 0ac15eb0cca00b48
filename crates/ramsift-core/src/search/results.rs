//! Search generations: the baseline scan, narrowing and exclusion.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::block::{MemBlock, slot_for, slot_size};
use super::{ComparisonType, FilterStep, SearchFilter, SizeClass};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::memory::{ByteAddress, ReadMemory};

/// One surviving candidate and the value it held when its generation was built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub address: ByteAddress,
    pub size: SizeClass,
    pub value: u32,
}

/// One generation of a RAM search.
///
/// Generation 0 comes from [`initialize`](Self::initialize); each later
/// generation is built from its predecessor by [`filter`](Self::filter).
/// A generation never changes after it is built except through the
/// `exclude_*` methods.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    blocks: Vec<MemBlock>,
    size: SizeClass,
    range_start: ByteAddress,
    range_length: u32,
    step: Option<FilterStep>,
    summary: String,
}

impl SearchResults {
    /// Capture every candidate of `size` in `length` bytes from `start`
    pub fn initialize<R: ReadMemory + ?Sized>(
        reader: &R,
        start: ByteAddress,
        length: u32,
        size: SizeClass,
    ) -> Result<Self> {
        Self::initialize_with_config(reader, start, length, size, &SearchConfig::default())
    }

    pub fn initialize_with_config<R: ReadMemory + ?Sized>(
        reader: &R,
        start: ByteAddress,
        length: u32,
        size: SizeClass,
        config: &SearchConfig,
    ) -> Result<Self> {
        let size = size.scan_class();
        let available = reader.total_size().saturating_sub(start);
        if length > available {
            debug!(
                "Clamping scan of {} bytes at {:#x} to {} bytes",
                length, start, available
            );
        }
        let length = length.min(available);

        let mut results = Self {
            size,
            range_start: start,
            range_length: length,
            ..Default::default()
        };

        let padding = size.padding() as u32;
        let max_block_size = config.block_size();
        let mut remaining = length.saturating_sub(padding);
        let mut address = start;
        while remaining > 0 {
            let block_size = remaining.min(max_block_size);
            let bytes = reader.read_exact(address, (block_size + padding) as usize)?;
            trace!("Captured block at {:#x} ({} bytes)", address, bytes.len());
            results.blocks.push(MemBlock::new(address, bytes, size));
            address += block_size;
            remaining -= block_size;
        }

        results.summary = format!(
            "Cleared: ({}) mode. Aware of {} RAM locations.",
            size.scan_label(),
            results.matching_address_count()
        );
        debug!("{} ({} blocks)", results.summary, results.blocks.len());
        Ok(results)
    }

    /// Keep the candidates of `prior` whose current value satisfies `comparison` against `constant`
    pub fn filter_by_constant<R: ReadMemory + ?Sized>(
        reader: &R,
        prior: &SearchResults,
        comparison: ComparisonType,
        constant: u32,
    ) -> Result<Self> {
        Self::filter(reader, prior, comparison, SearchFilter::Constant(constant))
    }

    /// Keep the candidates of `prior` whose current value satisfies `comparison` against their previous value
    pub fn filter_by_last_known<R: ReadMemory + ?Sized>(
        reader: &R,
        prior: &SearchResults,
        comparison: ComparisonType,
    ) -> Result<Self> {
        Self::filter(reader, prior, comparison, SearchFilter::LastKnownValue)
    }

    pub fn filter<R: ReadMemory + ?Sized>(
        reader: &R,
        prior: &SearchResults,
        comparison: ComparisonType,
        filter: SearchFilter,
    ) -> Result<Self> {
        Self::filter_with_config(
            reader,
            prior,
            FilterStep::new(comparison, filter),
            &SearchConfig::default(),
        )
    }

    /// Build the next generation from `prior` by applying `step`.
    ///
    /// Only blocks of `prior` that still hold candidates are re-read, each
    /// exactly once. `SearchFilter::InitialValue` compares against the values
    /// `prior` captured; use [`filter_against`](Self::filter_against) to
    /// compare with an earlier generation.
    pub fn filter_with_config<R: ReadMemory + ?Sized>(
        reader: &R,
        prior: &SearchResults,
        step: FilterStep,
        config: &SearchConfig,
    ) -> Result<Self> {
        Self::narrow(reader, prior, None, step, config)
    }

    /// Narrow the candidates of `addresses_from`, taking each candidate's
    /// reference value from the bytes `values_from` captured.
    ///
    /// Candidates whose bytes `values_from` does not hold are dropped. No
    /// candidate absent from `addresses_from` can appear.
    pub fn filter_against<R: ReadMemory + ?Sized>(
        reader: &R,
        values_from: &SearchResults,
        addresses_from: &SearchResults,
        step: FilterStep,
        config: &SearchConfig,
    ) -> Result<Self> {
        if values_from.size != addresses_from.size {
            return Err(Error::MismatchedGenerations {
                values: values_from.size,
                addresses: addresses_from.size,
            });
        }
        Self::narrow(reader, addresses_from, Some(values_from), step, config)
    }

    fn narrow<R: ReadMemory + ?Sized>(
        reader: &R,
        prior: &SearchResults,
        values_from: Option<&SearchResults>,
        step: FilterStep,
        config: &SearchConfig,
    ) -> Result<Self> {
        let mut results = Self {
            size: prior.size,
            range_start: prior.range_start,
            range_length: prior.range_length,
            step: Some(step),
            summary: step.describe(),
            blocks: Vec::new(),
        };

        let adjustment = step.filter.adjustment();
        let mut survivors = Vec::new();
        for block in &prior.blocks {
            if block.matching_count() == 0 {
                continue;
            }

            let current = reader.read_exact(block.address(), block.bytes().len())?;
            if values_from.is_none() && !step.filter.is_constant() && current == block.bytes() {
                if step.comparison.is_reflexive() {
                    if adjustment == 0 {
                        trace!("Block at {:#x} unchanged, keeping all", block.address());
                        results.blocks.push(block.clone());
                        continue;
                    }
                    if step.comparison == ComparisonType::Equals {
                        trace!("Block at {:#x} unchanged, dropping", block.address());
                        continue;
                    }
                } else if adjustment == 0 {
                    trace!("Block at {:#x} unchanged, dropping", block.address());
                    continue;
                }
            }

            for slot in block.matching_slots() {
                let previous = match values_from {
                    Some(values) => values.block_for_slot(slot).and_then(|b| b.value_at(slot)),
                    None => block.value_at(slot),
                };
                let (Some(value), Some(previous)) = (block.decode_slot(&current, slot), previous)
                else {
                    continue;
                };
                if step.matches(value, previous) {
                    survivors.push(slot);
                }
            }

            if !survivors.is_empty() {
                results.add_blocks(&survivors, &current, block.address(), config.group_span);
                survivors.clear();
            }
        }

        debug!(
            "{} {} -> {} candidates ({} blocks)",
            results.summary,
            prior.matching_address_count(),
            results.matching_address_count(),
            results.blocks.len()
        );
        Ok(results)
    }

    /// Group ascending `slots` into blocks that capture only the bytes they span
    fn add_blocks(
        &mut self,
        slots: &[u64],
        memory: &[u8],
        memory_address: ByteAddress,
        group_span: u32,
    ) {
        let slots_per_byte = self.size.slots_per_byte();
        let span = u64::from(group_span.max(1));
        let padding = self.size.padding();

        let mut first = 0;
        while first < slots.len() {
            let first_slot = slots[first];
            let mut last = first;
            while last + 1 < slots.len() && slots[last + 1] - first_slot < span {
                last += 1;
            }
            // both nibbles of a byte belong to the same block
            if slots_per_byte == 2
                && slots[last] % 2 == 0
                && slots.get(last + 1) == Some(&(slots[last] + 1))
            {
                last += 1;
            }

            let first_address = first_slot / slots_per_byte;
            let last_address = slots[last] / slots_per_byte;
            let offset = (first_address - u64::from(memory_address)) as usize;
            let length = (last_address - first_address) as usize + 1 + padding;
            match memory.get(offset..offset + length) {
                Some(bytes) => self.blocks.push(MemBlock::with_matches(
                    first_address as ByteAddress,
                    bytes.to_vec(),
                    self.size,
                    &slots[first..=last],
                )),
                None => warn!(
                    "Candidates at {:#x} fall outside their block, dropping",
                    first_address
                ),
            }
            first = last + 1;
        }
    }

    /// Remove every candidate at `address`. Does nothing on a baseline generation.
    pub fn exclude_address(&mut self, address: ByteAddress) {
        if !self.is_filtered() {
            return;
        }
        for slot in self.slots_at(address) {
            if let Some(block) = self.block_for_slot_mut(slot) {
                block.exclude(slot);
            }
        }
    }

    /// Remove the candidate at `index`. Does nothing on a baseline generation.
    pub fn exclude_matching_address(&mut self, index: usize) {
        if let Some(result) = self.get_matching_address(index) {
            self.exclude_result(&result);
        }
    }

    /// Remove exactly the `(address, size)` candidate of `result`
    pub fn exclude_result(&mut self, result: &SearchResult) -> bool {
        if !self.is_filtered() {
            return false;
        }
        let Some(slot) = slot_for(self.size, result.address, result.size) else {
            return false;
        };
        self.block_for_slot_mut(slot)
            .is_some_and(|block| block.exclude(slot))
    }

    pub fn matching_address_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| block.matching_count() as usize)
            .sum()
    }

    /// Whether any candidate at `address` survives, whatever its size
    pub fn contains_address(&self, address: ByteAddress) -> bool {
        self.slots_at(address)
            .any(|slot| self.block_for_slot(slot).is_some_and(|block| block.is_match(slot)))
    }

    /// The `index`-th candidate in ascending order
    pub fn get_matching_address(&self, index: usize) -> Option<SearchResult> {
        let mut index = index;
        for block in &self.blocks {
            let count = block.matching_count() as usize;
            if index < count {
                let slot = block.nth_match(index as u32)?;
                return self.result_for(block, slot);
            }
            index -= count;
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = SearchResult> + '_ {
        self.blocks.iter().flat_map(move |block| {
            block
                .matching_slots()
                .filter_map(move |slot| self.result_for(block, slot))
        })
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn size(&self) -> SizeClass {
        self.size
    }

    pub fn range_start(&self) -> ByteAddress {
        self.range_start
    }

    pub fn range_length(&self) -> u32 {
        self.range_length
    }

    /// The step that produced this generation, if it is not a baseline
    pub fn filter_step(&self) -> Option<FilterStep> {
        self.step
    }

    pub fn is_filtered(&self) -> bool {
        self.step.is_some()
    }

    /// Value captured for `(address, size)` if this generation holds its bytes
    pub fn captured_value(&self, address: ByteAddress, size: SizeClass) -> Option<u32> {
        let slot = slot_for(self.size, address, size)?;
        self.block_for_slot(slot)?.value_at(slot)
    }

    /// Re-read the current value of `result`. Returns true when it changed.
    pub fn update_value<R: ReadMemory + ?Sized>(
        &self,
        reader: &R,
        result: &mut SearchResult,
    ) -> Result<bool> {
        let value = reader.read_value(result.address, result.size)?;
        let changed = value != result.value;
        result.value = value;
        Ok(changed)
    }

    /// Whether `result`, holding a current value, passes the step that built
    /// this generation from `prior`
    pub fn matches_filter(&self, prior: &SearchResults, result: &SearchResult) -> bool {
        let Some(step) = self.step else {
            return true;
        };
        let previous = if step.filter.is_constant() {
            0
        } else {
            prior
                .captured_value(result.address, result.size)
                .unwrap_or_default()
        };
        step.matches(result.value, previous)
    }

    fn slots_at(&self, address: ByteAddress) -> Range<u64> {
        let slots_per_byte = self.size.slots_per_byte();
        let first = u64::from(address) * slots_per_byte;
        first..first + slots_per_byte
    }

    fn block_index(&self, slot: u64) -> Option<usize> {
        let index = self
            .blocks
            .partition_point(|block| block.first_slot() <= slot)
            .checked_sub(1)?;
        self.blocks[index].contains_slot(slot).then_some(index)
    }

    fn block_for_slot(&self, slot: u64) -> Option<&MemBlock> {
        self.block_index(slot).map(|index| &self.blocks[index])
    }

    fn block_for_slot_mut(&mut self, slot: u64) -> Option<&mut MemBlock> {
        self.block_index(slot).map(|index| &mut self.blocks[index])
    }

    fn result_for(&self, block: &MemBlock, slot: u64) -> Option<SearchResult> {
        Some(SearchResult {
            address: (slot / self.size.slots_per_byte()) as ByteAddress,
            size: slot_size(self.size, slot),
            value: block.value_at(slot)?,
        })
    }
}
