#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

//! Core crate for the TrackKit telemetry SDK.
//!
//! TrackKit establishes a durable anonymous identity and a timeout-governed
//! session for an application instance, assembles consent/event payloads
//! describing that state, and delivers them to a fixed collection endpoint.
//!
//! Host applications construct a [`Tracker`] with their [`TrackConfig`] and an
//! [`IdentifierStore`] implementation, wire the app lifecycle through
//! [`Tracker::attach_lifecycle`] or [`Tracker::notify_lifecycle`], and call
//! the async `send_*` operations.

mod clock;
pub use clock::*;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod identity;
pub use identity::*;

mod lifecycle;
pub use lifecycle::*;

pub mod logger;

mod payload;
pub use payload::*;

mod session;
pub use session::*;

mod store;
pub use store::*;

mod tracker;
pub use tracker::*;

mod transport;
pub use transport::*;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("trackkit_core");
