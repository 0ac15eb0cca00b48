//! CLI command implementations.

pub mod hex_utils;
pub mod scan;
pub mod session;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ramsift_core::{ByteAddress, FilterStep, SearchConfig, SearchFilter, SearchResults, SizeClass};

/// Range and size of a baseline scan
#[derive(Debug, Clone, Copy)]
pub struct ScanRange {
    pub size: SizeClass,
    pub start: ByteAddress,
    /// `None` scans to the end of the snapshot
    pub length: Option<u32>,
}

impl ScanRange {
    pub fn length(&self) -> u32 {
        self.length.unwrap_or(u32::MAX)
    }
}

/// Read a memory snapshot file
pub fn load_snapshot(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read snapshot {}", path.display()))
}

/// Narrow `current` with `step`. Initial value steps compare with `baseline`.
pub fn apply_step(
    memory: &[u8],
    baseline: &SearchResults,
    current: &SearchResults,
    step: FilterStep,
    config: &SearchConfig,
) -> Result<SearchResults> {
    let next = match step.filter {
        SearchFilter::InitialValue => {
            SearchResults::filter_against(memory, baseline, current, step, config)?
        }
        _ => SearchResults::filter_with_config(memory, current, step, config)?,
    };
    Ok(next)
}
