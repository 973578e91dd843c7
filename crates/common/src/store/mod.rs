mod memory;
mod provider;

pub use memory::{MemoryDrawStore, MemoryDrawStoreError};
pub use provider::{DrawFilter, DrawStore, StoreError};
