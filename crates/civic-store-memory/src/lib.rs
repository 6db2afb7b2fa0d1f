//! In-process backend for the civic petition store.
//!
//! Each petition and the rows it owns live behind their own async mutex, so
//! the mutex is the per-petition serialization point and signers of
//! different petitions never wait on each other. Nothing is persisted.

mod store;

pub use store::MemoryStore;
