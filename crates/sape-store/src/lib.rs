//! # sape-store
//!
//! Durable key-value storage for the SAPE client, backed by SQLite.
//!
//! Each entity store owns one string key and keeps its whole collection under
//! it as a JSON blob. The crate exposes a synchronous [`Database`] handle that
//! wraps a `rusqlite::Connection`, runs schema migrations on open and provides
//! `get/set/remove` over raw strings. Encoding is left to the caller.

pub mod database;
pub mod kv;
pub mod migrations;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
