//! Tuning knobs for the search engine.

use serde::{Deserialize, Serialize};

use crate::search::MAX_BLOCK_SIZE;

/// Default slot distance within which narrowing survivors share a block
pub const DEFAULT_GROUP_SPAN: u32 = 64;

/// Largest block size honoured; keeps nibble slot counts within `u32`
pub const BLOCK_SIZE_LIMIT: u32 = 1 << 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate start bytes per baseline block
    pub max_block_size: u32,
    /// Survivors whose slot lies within this many slots of a group's first
    /// survivor are stored in the same block
    pub group_span: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_block_size: MAX_BLOCK_SIZE,
            group_span: DEFAULT_GROUP_SPAN,
        }
    }
}

impl SearchConfig {
    /// Create a builder for SearchConfig
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// `max_block_size` clamped to `1..=BLOCK_SIZE_LIMIT`
    pub fn block_size(&self) -> u32 {
        self.max_block_size.clamp(1, BLOCK_SIZE_LIMIT)
    }
}

/// Builder for SearchConfig
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    max_block_size: Option<u32>,
    group_span: Option<u32>,
}

impl SearchConfigBuilder {
    pub fn max_block_size(mut self, bytes: u32) -> Self {
        self.max_block_size = Some(bytes);
        self
    }

    pub fn group_span(mut self, slots: u32) -> Self {
        self.group_span = Some(slots);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SearchConfig {
        let default = SearchConfig::default();
        SearchConfig {
            max_block_size: self.max_block_size.unwrap_or(default.max_block_size),
            group_span: self.group_span.unwrap_or(default.group_span),
        }
    }
}
