//! Issue/fix data model shared by every validator.

pub mod types;

pub use types::*;
