//! `flightsync-middleware` – Feeds and Routing
//!
//! Moves data in and out of the core: the external aircraft feeds come in
//! through [`FeedAdapter`]s, and everything the session decides goes out
//! over the [`EventBus`].
//!
//! # Modules
//!
//! - [`bus`] – Topic-based publish/subscribe event bus built on Tokio
//!   broadcast channels.
//! - [`adapter`] – The feed contract: [`FeedAdapter`], [`FeedSource`] and the
//!   stream item types.
//! - [`polling`] – [`PollingFeed`]: periodic HTTP polling with chunked,
//!   paced emission for any [`FeedSource`].
//! - [`opensky`] – State-vector feed (position + heading).
//! - [`adsbx`] – Aircraft-list feed (model + route).

pub mod adapter;
pub mod adsbx;
pub mod bus;
pub mod opensky;
pub mod polling;

pub use adapter::{FeedAdapter, FeedError, FeedEvent, FeedMessage, FeedReceiver, FeedSource, ParseFailure};
pub use adsbx::AdsbExchangeSource;
pub use bus::{EventBus, Topic, TopicReceiver};
pub use opensky::OpenSkySource;
pub use polling::{PollConfig, PollingFeed};
