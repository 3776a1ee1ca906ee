//! Configuration types and persistence.

pub mod persistence;
pub mod types;
