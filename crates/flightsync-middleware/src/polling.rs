//! Periodic polling for any [`FeedSource`].
//!
//! [`PollingFeed`] owns one Tokio task per started feed. The task polls
//! immediately, then once per `poll_interval`; every successful poll is
//! parsed on the task and emitted as consecutive [`FeedBatch`]es of at most
//! `chunk_size` fragments with a `chunk_delay` pause between them, so a
//! consumer on a render cadence is never handed thousands of fragments at
//! once.
//!
//! # Example
//!
//! ```rust,no_run
//! use flightsync_middleware::{FeedAdapter, OpenSkySource, PollConfig, PollingFeed};
//!
//! # async fn demo() {
//! let mut feed = PollingFeed::new(OpenSkySource::default(), PollConfig::default());
//! let mut rx = feed.start();
//! while let Ok(message) = rx.recv().await {
//!     println!("{message:?}");
//! }
//! feed.stop();
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use flightsync_types::FeedBatch;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

use crate::adapter::{FeedAdapter, FeedEvent, FeedMessage, FeedReceiver, FeedSource};

/// Longest slice of a rejected body that goes into the log line.
const LOGGED_BODY_LIMIT: usize = 256;

/// Lower bound for the poll period; a zero period would spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polling cadence and emission pacing.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    /// Buffered messages per feed before slow receivers start lagging.
    pub channel_capacity: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            chunk_size: 100,
            chunk_delay: Duration::from_millis(16),
            channel_capacity: 1024,
        }
    }
}

/// A [`FeedAdapter`] that polls a [`FeedSource`] over HTTP.
pub struct PollingFeed<S: FeedSource> {
    source: Arc<S>,
    config: PollConfig,
    client: reqwest::Client,
    sender: broadcast::Sender<FeedMessage>,
    task: Option<AbortHandle>,
}

impl<S: FeedSource> PollingFeed<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            source: Arc::new(source),
            config,
            client: reqwest::Client::new(),
            sender,
            task: None,
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxy, user agent).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: FeedSource> FeedAdapter for PollingFeed<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    /// Must be called from within a Tokio runtime.
    fn start(&mut self) -> FeedReceiver {
        let receiver = self.sender.subscribe();
        if self.is_running() {
            return receiver;
        }

        let source = Arc::clone(&self.source);
        let client = self.client.clone();
        let sender = self.sender.clone();
        let config = self.config.clone();
        let handle = tokio::spawn(async move {
            poll_loop(source, client, sender, config).await;
        });
        self.task = Some(handle.abort_handle());

        info!(feed = %self.source.name(), url = %self.source.url(), "feed started");
        receiver
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!(feed = %self.source.name(), "feed stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl<S: FeedSource> Drop for PollingFeed<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<S: FeedSource>(
    source: Arc<S>,
    client: reqwest::Client,
    sender: broadcast::Sender<FeedMessage>,
    config: PollConfig,
) {
    let mut ticker = interval(config.poll_interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        // The first tick completes immediately.
        ticker.tick().await;
        poll_once(source.as_ref(), &client, &sender, &config).await;
    }
}

/// One fetch / parse / emit cycle. Send failures (no receivers) are ignored.
async fn poll_once<S: FeedSource>(
    source: &S,
    client: &reqwest::Client,
    sender: &broadcast::Sender<FeedMessage>,
    config: &PollConfig,
) {
    let body = match source.fetch(client).await {
        Ok(body) => body,
        Err(e) => {
            warn!(feed = %source.name(), error = %e, "feed fetch failed");
            let _ = sender.send(Err(e));
            return;
        }
    };

    let fragments = match source.parse(&body) {
        Ok(fragments) => fragments,
        Err(failure) => {
            let raw = String::from_utf8_lossy(&body).into_owned();
            warn!(
                feed = %source.name(),
                error = %failure,
                body = %truncated(&raw, LOGGED_BODY_LIMIT),
                "feed payload rejected"
            );
            let _ = sender.send(Ok(FeedEvent::ParseError { raw }));
            return;
        }
    };

    debug!(feed = %source.name(), fragments = fragments.len(), "feed polled");

    for (i, chunk) in fragments.chunks(config.chunk_size.max(1)).enumerate() {
        if i > 0 {
            sleep(config.chunk_delay).await;
        }
        let batch = FeedBatch {
            feed: source.name().to_string(),
            fragments: chunk.to_vec(),
        };
        let _ = sender.send(Ok(FeedEvent::Batch(batch)));
    }
}

fn truncated(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
