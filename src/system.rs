//! Subprocess execution and output parsing.

pub mod executor;
pub mod parser;
