//! `flightsync-scene` – The Rendered World
//!
//! Screen-space state derived from complete aircraft and the drawn path,
//! independent of any UI toolkit. A renderer only has to apply the
//! [`RenderCommand`][flightsync_types::RenderCommand]s this crate produces.
//!
//! # Modules
//!
//! - [`projection`] – Geographic to screen mapping and the visible viewport.
//! - [`render_sync`] – Create-vs-update diffing of aircraft against the node
//!   set, plus node transition animation.
//! - [`proximity`] – Destination arrival, collision checks and the rotating
//!   destination list.
//! - [`actor`] – The user-steered aircraft.

pub mod actor;
pub mod projection;
pub mod proximity;
pub mod render_sync;

pub use actor::{ActorState, ActorTick, Motion};
pub use projection::{GeoBounds, MercatorViewport, Projection, screen_heading};
pub use proximity::{CollisionReport, DestinationRing, ProximityChecker, ProximityConfig};
pub use render_sync::{RenderSync, RenderedNode};
