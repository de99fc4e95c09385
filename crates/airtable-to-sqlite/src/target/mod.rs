//! Destination database implementations.

mod sqlite;

pub use sqlite::{SqliteDestination, SQLITE_MAX_PARAMS};
