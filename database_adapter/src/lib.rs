pub mod db;

pub use db::{DbError, KeyValueStore, SqliteStore};
