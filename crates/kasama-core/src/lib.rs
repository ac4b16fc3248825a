//! Core types and trait definitions for the Kasama family registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod duplicate;
pub mod error;
pub mod notify;
pub mod person;
pub mod registration;
pub mod relationship;
pub mod store;

pub use error::ValidationError;
