//! # sape-shared
//!
//! Domain types shared by every SAPE crate: the entity records, their string
//! ids, `HH:MM` times, storage keys and the boundary validation rules.

pub mod constants;
pub mod error;
pub mod models;
pub mod time;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use models::*;
pub use time::TimeOfDay;
pub use types::{ActivityId, PlaceId, SportId, UserId};
