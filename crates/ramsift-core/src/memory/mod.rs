mod reader;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use reader::{ByteAddress, ReadMemory, WriteMemory};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
