//! Best-effort SQLite archive of generated posts.
//!
//! Write-through and read-back only: nothing here is fed back into the
//! engine, and losing the file loses nothing the engine needs.

pub mod error;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use store::PostArchive;
