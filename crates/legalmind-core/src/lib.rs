//! legalmind-core - Core types and traits for the legalmind pipeline
//!
//! This crate provides the domain types (chunks, ranked and fused items,
//! citations, answers), the capability traits the pipeline consumes, the
//! configuration layer and error handling shared by every other crate.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RagError, Result};
pub use traits::*;
pub use types::*;
