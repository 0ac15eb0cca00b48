//! Candidate enumeration and narrowing.

mod block;
mod comparison;
mod filter;
mod results;
mod size;

pub use block::MAX_BLOCK_SIZE;
pub use comparison::ComparisonType;
pub use filter::{FilterStep, SearchFilter, parse_filter_value};
pub use results::{SearchResult, SearchResults};
pub use size::SizeClass;
