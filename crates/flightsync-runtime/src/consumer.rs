//! The consumer loop.
//!
//! Every feed delivers on its own broadcast channel from its own polling
//! task. [`run`] starts the feeds, forwards each stream into one `mpsc`
//! channel and then serialises three inputs onto the [`Session`]:
//!
//! 1. feed messages, in arrival order,
//! 2. user [`Command`]s (gestures, the enable switch, status requests),
//! 3. frame ticks at [`FRAME_INTERVAL`].
//!
//! All session mutation therefore happens on the task running [`run`].
//! Flipping the shutdown watch to `true` stops every feed and returns the
//! session.

use std::time::{Duration, Instant};

use flightsync_middleware::{FeedAdapter, FeedMessage};
use flightsync_types::GestureEvent;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::session::Session;

/// 60 Hz frame clock.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Capacity of the merged feed channel.
const MERGED_CAPACITY: usize = 1024;

/// User input for the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Gesture(GestureEvent),
    SetEnabled(bool),
    ReportStatus,
}

/// Drive `session` until `shutdown` turns `true` (or its sender is dropped).
pub async fn run(
    mut session: Session,
    mut feeds: Vec<Box<dyn FeedAdapter>>,
    mut commands: mpsc::Receiver<Command>,
    mut shutdown: watch::Receiver<bool>,
) -> Session {
    let (merged_tx, mut merged_rx) = mpsc::channel::<(String, FeedMessage)>(MERGED_CAPACITY);
    let forwarders: Vec<JoinHandle<()>> = feeds
        .iter_mut()
        .map(|feed| {
            let name = feed.name().to_string();
            forward(name, feed.start(), merged_tx.clone())
        })
        .collect();
    drop(merged_tx);

    info!(feeds = feeds.len(), "consumer loop started");
    session.announce();

    let mut frames = interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    if !*shutdown.borrow() {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some((feed, message)) = merged_rx.recv() => {
                    session.on_feed_message(&feed, &message, Instant::now());
                }
                Some(command) = commands.recv() => {
                    apply_command(&mut session, command);
                }
                _ = frames.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_frame).as_secs_f64();
                    last_frame = now;
                    session.tick(dt, now);
                }
            }
        }
    }

    for feed in feeds.iter_mut() {
        feed.stop();
    }
    for forwarder in forwarders {
        forwarder.abort();
    }
    info!("consumer loop stopped");
    session
}

fn apply_command(session: &mut Session, command: Command) {
    debug!(?command, "command received");
    match command {
        Command::Gesture(gesture) => {
            session.on_gesture(gesture);
        }
        Command::SetEnabled(enabled) => {
            session.set_enabled(enabled);
        }
        Command::ReportStatus => {
            session.report_status();
        }
    }
}

/// Copy one feed's broadcast stream into the merged channel, tagged with the
/// feed name.
fn forward(
    name: String,
    mut receiver: broadcast::Receiver<FeedMessage>,
    merged: mpsc::Sender<(String, FeedMessage)>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    if merged.send((name.clone(), message)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(feed = %name, lagged_by = n, "consumer fell behind feed");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
