//! The feed contract.
//!
//! The core never talks HTTP. A feed is anything implementing
//! [`FeedAdapter`]: it can be started and stopped and, while running,
//! pushes [`FeedMessage`]s into a broadcast channel that the consumer loop
//! drains.
//!
//! # Overview
//!
//! - [`FeedAdapter`] – lifecycle of a running feed.
//! - [`FeedSource`] – what a concrete endpoint contributes: where to fetch
//!   from and how to turn the body into [`Fragment`]s.
//!   [`PollingFeed`][crate::polling::PollingFeed] turns any source into an
//!   adapter.
//! - [`FeedEvent`] / [`FeedError`] – the items of the stream.

use async_trait::async_trait;
use flightsync_types::{FeedBatch, Fragment};
use thiserror::Error;
use tokio::sync::broadcast;

/// One item on a feed stream.
pub type FeedMessage = Result<FeedEvent, FeedError>;

/// Receiving end of a feed stream.
pub type FeedReceiver = broadcast::Receiver<FeedMessage>;

/// Successful output of one polling cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A chunk of parsed fragments.
    Batch(FeedBatch),
    /// The endpoint answered but the body could not be understood. `raw` is
    /// the lossy UTF-8 rendering of the body.
    ParseError { raw: String },
}

/// A failed polling cycle. The feed keeps polling afterwards.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("endpoint answered with HTTP {status}")]
    Endpoint { status: u16 },
}

/// Why a body was rejected by [`FeedSource::parse`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{details}")]
pub struct ParseFailure {
    pub details: String,
}

impl ParseFailure {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }
}

/// Every live feed must implement this trait.
///
/// # Contract
///
/// * `start` – begin polling and return a receiver of the feed's stream.
///   Calling it again while running does not spawn a second poller; it hands
///   out another receiver of the same channel.
/// * `stop` – cancel the poller. A stopped feed may be started again.
pub trait FeedAdapter: Send {
    fn name(&self) -> &str;

    fn start(&mut self) -> FeedReceiver;

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// A concrete endpoint.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    /// Short feed name used in batches and log fields.
    fn name(&self) -> &str;

    fn url(&self) -> &str;

    /// Fetch one body. The default issues a GET against [`url`][Self::url];
    /// any non-2xx status is reported as [`FeedError::Endpoint`].
    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<u8>, FeedError> {
        let response = client
            .get(self.url())
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Endpoint {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }

    /// Turn a body into fragments. Individual rows lacking a required field
    /// are dropped; only a body of the wrong overall shape is a failure.
    fn parse(&self, body: &[u8]) -> Result<Vec<Fragment>, ParseFailure>;
}
