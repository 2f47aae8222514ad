//! legalmind-store - SQLite storage layer
//!
//! This crate provides persistent storage for documents, chunks, and embeddings
//! using SQLite, with cosine nearest-neighbour search through a registered
//! SQL function.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

// Re-export schema for testing/migrations
pub use schema::{SCHEMA, SCHEMA_VERSION};
