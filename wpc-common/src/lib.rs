//! # WPC Common Library
//!
//! Shared code for the Work Priority Catalog:
//! - Error types
//! - Configuration and data folder resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
