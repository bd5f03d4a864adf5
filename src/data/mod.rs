//! Data layer module
//!
//! Handles account persistence and the directory view the
//! federation core reads:
//! - SQLite database operations
//! - In-memory directory

mod database;
mod directory;
mod models;

pub use database::Database;
pub use directory::{MemoryDirectory, UserDirectory};
pub use models::*;

#[cfg(test)]
pub use directory::MockUserDirectory;

#[cfg(test)]
mod database_test;
