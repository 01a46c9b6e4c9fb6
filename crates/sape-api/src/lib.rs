//! # sape-api
//!
//! Client for the SAPE REST backend: bearer-authenticated JSON requests,
//! `/login`, and typed CRUD over the `/sport` and `/place` collections.

pub mod auth;
pub mod client;
pub mod resource;

mod error;

pub use client::{ApiClient, ApiConfig};
pub use error::{ApiError, Result};
pub use resource::{ApiResource, PlacePayload, SportPayload};
