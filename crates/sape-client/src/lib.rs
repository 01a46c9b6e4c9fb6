//! # sape-client
//!
//! Client-side state for SAPE: write-through entity stores for sports,
//! places and activities, the subscription and presence lists, the schedule
//! window and the authenticated session, all assembled by [`Sape`].

pub mod app;
pub mod backend;
pub mod config;
pub mod storage;
pub mod store;
pub mod stores;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use app::{ActivityView, Sape};
pub use config::{BackendKind, ClientConfig};
pub use error::{ClientError, Result};
pub use storage::{KeyValueStore, SqliteStorage};
pub use store::EntityStore;
pub use stores::{
    ActivityStore, AuthSessionStore, Authenticator, PlaceStore, PresenceStore,
    ScheduleConfigStore, SportStore, SubscriptionStore,
};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("sape_client=debug,sape_api=info,sape_store=info,warn")
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
