//! `flightsync-fusion` – Entity Reconciliation
//!
//! Merges fragments from independent, partially overlapping feeds into one
//! keyed store and surfaces an aircraft to the rest of the system only once
//! every feed has contributed its share.
//!
//! # Modules
//!
//! - [`store`] – The keyed entity store: merge, completeness gate, retention.
//! - [`pipeline`] – Batch ingestion on top of the store with the enable
//!   switch and status counters.

pub mod pipeline;
pub mod store;

pub use pipeline::{FusionEvent, FusionPipeline, FusionStatus};
pub use store::{EntityStore, RetentionPolicy, try_complete};
