//! Room runtime for the blackjack table engine.
//!
//! Each room is an actor task owning one [`blackjack_engine::table::Table`];
//! [`RoomRegistry`] owns the rooms, [`Ledger`] receives their money deltas
//! and [`EventBus`] fans their snapshots out to subscribers. [`WebServer`]
//! exposes all of it over HTTP and server-sent events.

pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod room;
pub mod server;

pub use config::{AppConfig, ConfigError, ConfigResolved, ConfigSources, RoomSpec, ValueSource};
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{EventBus, EventSubscription, RoomEvent};
pub use ledger::{Ledger, LedgerEntry, LedgerSink};
pub use logging::{init_logging, init_test_logging, LogEntry, LogFormat, TestLogSubscriber};
pub use registry::{RegistryError, RoomInfo, RoomRegistry, TableDefaults};
pub use room::{
    PresenceEvent, Room, RoomCode, RoomCommand, RoomContext, RoomError, RoomHandle, RoomInput,
};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
