//! REPL – the interactive shell for a running session.
//!
//! Supported slash-commands:
//!   /help                 – show this list
//!   /status               – print fusion counters
//!   /enable  /disable     – resume or pause feed processing
//!   /draw x,y x,y …       – replay a drawn gesture through the resampler
//!   /tap                  – a gesture without samples (clears the trace)
//!   /config               – show where the config file lives
//!   /quit | /exit         – stop the session and exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flightsync_runtime::Command;
use flightsync_types::{GestureEvent, Vec2};
use tokio::sync::{mpsc, watch};

use crate::config;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Status,
    Enable,
    Disable,
    /// Screen points of a gesture, in drawing order. Empty for a tap.
    Draw(Vec<Vec2>),
    Config,
    Quit,
}

/// Parse one non-empty input line.
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();
    match head {
        "/help" => Ok(ReplCommand::Help),
        "/status" => Ok(ReplCommand::Status),
        "/enable" => Ok(ReplCommand::Enable),
        "/disable" => Ok(ReplCommand::Disable),
        "/config" => Ok(ReplCommand::Config),
        "/quit" | "/exit" => Ok(ReplCommand::Quit),
        "/tap" => Ok(ReplCommand::Draw(Vec::new())),
        "/draw" => {
            let points = parts.map(parse_point).collect::<Result<Vec<_>, _>>()?;
            if points.is_empty() {
                return Err("/draw needs at least one point, e.g. /draw 10,10 40,10".to_string());
            }
            Ok(ReplCommand::Draw(points))
        }
        other => Err(format!("Unknown command '{other}'")),
    }
}

fn parse_point(token: &str) -> Result<Vec2, String> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{token}'"))?;
    let coord = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{s}' is not a coordinate"))
    };
    Ok(Vec2::new(coord(x)?, coord(y)?))
}

/// The gesture a `/draw` line stands for.
pub fn gesture_for(points: &[Vec2]) -> Vec<GestureEvent> {
    let mut gesture = Vec::with_capacity(points.len() + 2);
    gesture.push(GestureEvent::Started);
    gesture.extend(points.iter().copied().map(GestureEvent::Sample));
    gesture.push(GestureEvent::Ended);
    gesture
}

/// Entry point for the interactive REPL. Blocks the calling thread.
///
/// Exits on EOF, `/quit`, or once `shutdown` reads `true`.
/// `status_requested` tells the event printer to show the next status line.
pub fn run(
    commands: mpsc::Sender<Command>,
    shutdown: Arc<watch::Sender<bool>>,
    status_requested: Arc<AtomicBool>,
) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if *shutdown.borrow() {
            break;
        }

        print!("{} ", "flightsync>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parsed = match parse_command(input) {
            Ok(c) => c,
            Err(e) => {
                println!("{} {}. Type {} for available commands.", "Error:".red(), e, "/help".bold());
                continue;
            }
        };

        let delivered = match parsed {
            ReplCommand::Help => {
                cmd_help();
                true
            }
            ReplCommand::Config => {
                println!("  Config file: {}", config::config_path().display().to_string().bold());
                true
            }
            ReplCommand::Status => {
                status_requested.store(true, Ordering::SeqCst);
                commands.blocking_send(Command::ReportStatus).is_ok()
            }
            ReplCommand::Enable => {
                println!("{}", "  Feed processing enabled.".green());
                commands.blocking_send(Command::SetEnabled(true)).is_ok()
            }
            ReplCommand::Disable => {
                println!("{}", "  Feed processing paused.".yellow());
                commands.blocking_send(Command::SetEnabled(false)).is_ok()
            }
            ReplCommand::Draw(points) => gesture_for(&points)
                .into_iter()
                .all(|g| commands.blocking_send(Command::Gesture(g)).is_ok()),
            ReplCommand::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.send_replace(true);
                break;
            }
        };

        if !delivered {
            println!("{}", "Session is no longer running.".yellow());
            break;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "FlightSync Commands".bold().underline());
    println!("  {}            – fusion counters", "/status".bold().cyan());
    println!("  {}  – resume or pause the feeds", "/enable  /disable".bold().cyan());
    println!("  {} – draw a path for the player", "/draw x,y x,y ...".bold().cyan());
    println!("  {}               – clear the current trace", "/tap".bold().cyan());
    println!("  {}            – show the config file path", "/config".bold().cyan());
    println!("  {}       – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(parse_command("/help"), Ok(ReplCommand::Help));
        assert_eq!(parse_command("/status"), Ok(ReplCommand::Status));
        assert_eq!(parse_command("/enable"), Ok(ReplCommand::Enable));
        assert_eq!(parse_command("/disable"), Ok(ReplCommand::Disable));
        assert_eq!(parse_command("/exit"), Ok(ReplCommand::Quit));
        assert_eq!(parse_command("/tap"), Ok(ReplCommand::Draw(Vec::new())));
    }

    #[test]
    fn parses_draw_points() {
        assert_eq!(
            parse_command("/draw 10,20  30.5,-4"),
            Ok(ReplCommand::Draw(vec![Vec2::new(10.0, 20.0), Vec2::new(30.5, -4.0)]))
        );
    }

    #[test]
    fn rejects_bad_draw_input() {
        assert!(parse_command("/draw").is_err());
        assert!(parse_command("/draw 10;20").is_err());
        assert!(parse_command("/draw 10,abc").is_err());
        assert!(parse_command("/draw 10,NaN").is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        let err = parse_command("/fly").unwrap_err();
        assert!(err.contains("/fly"));
    }

    #[test]
    fn gesture_wraps_samples() {
        let gesture = gesture_for(&[Vec2::new(1.0, 2.0)]);
        assert_eq!(
            gesture,
            vec![
                GestureEvent::Started,
                GestureEvent::Sample(Vec2::new(1.0, 2.0)),
                GestureEvent::Ended
            ]
        );
        assert_eq!(gesture_for(&[]), vec![GestureEvent::Started, GestureEvent::Ended]);
    }

    #[test]
    fn run_returns_when_already_shut_down() {
        // The loop checks the flag before reading stdin, so it returns at once.
        let (tx, _rx) = mpsc::channel(4);
        let (shutdown, _watch) = watch::channel(true);
        run(tx, Arc::new(shutdown), Arc::new(AtomicBool::new(false)));
    }
}
