//! # APT Data Manager Common Library
//!
//! Shared code for the APT data-management services:
//! - Error types
//! - Configuration loading and root folder resolution
//! - Metadata documents and their validation rules
//! - The on-disk dataset → sample → reconstruction → analysis hierarchy
//! - Naming and date utilities

pub mod config;
pub mod error;
pub mod metadata;
pub mod names;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use store::DataStore;
