//! Backup controller and tier rotation.

pub mod controller;
pub mod tiers;

pub use controller::{BackupController, BackupReport};
