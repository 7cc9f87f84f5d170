//! Log Triage common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Common error type and error codes
//! - Output format specifications
//! - Schema versioning

pub mod error;
pub mod output;
pub mod schema;

pub use error::{Error, Result};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
