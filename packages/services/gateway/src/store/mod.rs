//! 저장소 구현

mod sqlite;

pub use sqlite::SqliteStore;
