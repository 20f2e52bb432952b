//! Shared types for the warehouse inventory system.

pub mod types;

pub use types::{BatchId, Ean, Placement};
