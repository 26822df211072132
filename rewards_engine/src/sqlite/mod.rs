//! SQLite backend for the rewards engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
