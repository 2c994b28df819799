//! Console printer for gameplay and diagnostics events.

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flightsync_middleware::TopicReceiver;
use flightsync_types::EventPayload;

/// One console line (possibly multi-line) for `payload`, or `None` when the
/// event is not worth showing. Status lines are shown only on request.
pub fn describe(payload: &EventPayload, show_status: bool) -> Option<String> {
    match payload {
        EventPayload::Collision { message, .. } => Some(format!(
            "{} {}",
            "✈  Collision!".red().bold(),
            message.replace('\n', "\n   ")
        )),
        EventPayload::DestinationReached { name } => {
            Some(format!("{} {}", "✓ Reached".green().bold(), name.bold()))
        }
        EventPayload::NewDestination(destination) => Some(format!(
            "  Next destination: {} ({:.3}, {:.3})",
            destination.name.bold().cyan(),
            destination.position.latitude,
            destination.position.longitude
        )),
        EventPayload::PathStarted { waypoints } => {
            Some(format!("  Following path with {waypoints} waypoint(s)").dimmed().to_string())
        }
        EventPayload::FeedFault { feed, message } => Some(format!(
            "{} {}: {}",
            "⚠  Feed fault".yellow().bold(),
            feed.bold(),
            message
        )),
        EventPayload::Status {
            complete,
            total,
            merges,
        } if show_status => Some(format!(
            "  Aircraft: {} complete / {} tracked, {} fragments merged",
            complete.to_string().bold(),
            total,
            merges
        )),
        _ => None,
    }
}

/// Print events from both lanes until both are closed.
pub async fn print_events(
    mut gameplay: TopicReceiver,
    mut diagnostics: TopicReceiver,
    status_requested: Arc<AtomicBool>,
) {
    let mut gameplay_open = true;
    let mut diagnostics_open = true;

    while gameplay_open || diagnostics_open {
        let event = tokio::select! {
            event = gameplay.next(), if gameplay_open => {
                if event.is_none() {
                    gameplay_open = false;
                }
                event
            }
            event = diagnostics.next(), if diagnostics_open => {
                if event.is_none() {
                    diagnostics_open = false;
                }
                event
            }
        };

        let Some(event) = event else { continue };
        let show_status = matches!(event.payload, EventPayload::Status { .. })
            && status_requested.swap(false, Ordering::SeqCst);
        if let Some(line) = describe(&event.payload, show_status) {
            println!("\n{line}");
        }
    }
}
