//! Core types and trait definitions for the civic petition engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::PetitionStore`]; the lifecycle rules
//! they apply live in [`lifecycle`] so every backend computes identical
//! transitions.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod petition;
pub mod response;
pub mod signature;
pub mod store;
pub mod timeline;

pub use error::{Classify, Error, ErrorKind, Result};
