//! Storage layer for the projection engine
//!
//! This module provides a clean abstraction over the SQLite database,
//! organized into logical components:
//! - `schema`: Database connection and schema management
//! - `queries`: Team, usage, efficiency and variance profiles (ingestion inputs)
//! - `projections`: Scenarios, projection records and override logs

pub mod projections;
pub mod queries;
pub mod schema;


pub use schema::ProjectionDatabase;
