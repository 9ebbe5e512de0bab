//! Cache provider implementations.
//!
//! - [`MemoryCacheProvider`]: process-local map, lost on exit
//! - [`DiskCacheProvider`]: one file per entry in a namespace directory

mod disk;
mod memory;

pub use disk::DiskCacheProvider;
pub use memory::MemoryCacheProvider;
