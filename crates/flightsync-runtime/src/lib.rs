//! `flightsync-runtime` – The Session Engine
//!
//! Wires fusion, paths and the scene into one single-owner [`Session`] and
//! drives it from the feeds, the user and a frame clock.
//!
//! # Modules
//!
//! - [`session`] – [`Session`][session::Session]: the composition root. All
//!   store and scene mutation goes through it, and every decision it makes
//!   is returned to the caller and published on the
//!   [`EventBus`][flightsync_middleware::EventBus].
//! - [`consumer`] – [`run`][consumer::run]: the async loop that starts the
//!   feeds, serialises their output, user commands and frame ticks onto the
//!   session, and stops the feeds on shutdown.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter. Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod consumer;
pub mod session;
pub mod telemetry;

pub use consumer::{Command, run};
pub use session::{Session, SessionConfig, SessionEvent, default_destinations};
pub use telemetry::{TracerProviderGuard, init_tracing};
