//! # ramsift-core
//!
//! Incremental RAM search engine.
//!
//! This crate provides:
//! - A baseline scan that captures every candidate value of a chosen size
//!   (8/16/24/32-bit, big-endian variants and nibbles) in a memory range
//! - Narrowing steps that re-read surviving candidates and keep those that
//!   compare as requested against a constant, their last known value or the
//!   value the baseline captured
//! - Exclusion of individual candidates from a generation
//!
//! Memory is accessed through the [`ReadMemory`] trait, which callers pass to
//! every operation that touches memory.

pub mod config;
pub mod error;
pub mod memory;
pub mod search;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use error::{Error, Result};
pub use memory::{ByteAddress, ReadMemory, WriteMemory};
pub use search::{
    ComparisonType, FilterStep, MAX_BLOCK_SIZE, SearchFilter, SearchResult, SearchResults,
    SizeClass, parse_filter_value,
};
