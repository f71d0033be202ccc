//! Application store backends.

pub mod memory;

pub use memory::MemoryStore;
