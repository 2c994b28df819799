//! `flightsync-cli` – FlightSync Command Line Interface
//!
//! This binary runs one live session against the public flight feeds. It:
//!
//! 1. Checks for `~/.flightsync/config.toml`; runs a **First-Run Wizard**
//!    when the file is absent.
//! 2. Starts the OpenSky (positions) and ADS-B Exchange (model and route)
//!    polling feeds and fuses them in the session.
//! 3. Prints collisions, destination changes and feed faults as they happen.
//! 4. Drops the user into an **interactive REPL** with slash-commands
//!    (`/draw`, `/status`, `/enable`, `/disable`, `/help`).
//! 5. Intercepts **Ctrl-C** to stop the feeds and exit cleanly.

mod config;
mod display;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use flightsync_middleware::{AdsbExchangeSource, EventBus, FeedAdapter, OpenSkySource, PollingFeed, Topic};
use flightsync_runtime::{Command, Session};

/// Pending user commands before the REPL blocks.
const COMMAND_CAPACITY: usize = 64;

/// How long to wait for the event printer to drain after shutdown.
const PRINTER_DRAIN: Duration = Duration::from_secs(1);

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter, FLIGHTSYNC_LOG_FORMAT=json switches to
    // JSON lines, OTEL_EXPORTER_OTLP_ENDPOINT enables span export.
    let _telemetry = flightsync_runtime::init_tracing("flightsync");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    let (session_config, poll_config) = match (cfg.session_config(), cfg.poll_config()) {
        (Ok(session), Ok(poll)) => (session, poll),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{}: {}", "Invalid configuration".red().bold(), e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red().bold(), e);
            std::process::exit(1);
        }
    };

    // ── Session + event printer ───────────────────────────────────────────
    let bus = EventBus::default();
    let status_requested = Arc::new(AtomicBool::new(false));
    let printer = runtime.spawn(display::print_events(
        bus.subscribe_to(Topic::Gameplay),
        bus.subscribe_to(Topic::Diagnostics),
        Arc::clone(&status_requested),
    ));

    let session = match Session::new(session_config, bus) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}: {}", "Failed to create session".red().bold(), e);
            std::process::exit(1);
        }
    };

    let feeds: Vec<Box<dyn FeedAdapter>> = vec![
        Box::new(PollingFeed::new(OpenSkySource::new(&cfg.opensky_url), poll_config.clone())),
        Box::new(PollingFeed::new(AdsbExchangeSource::new(&cfg.adsbx_url), poll_config)),
    ];
    println!(
        "  Polling {} and {} every {}s",
        cfg.opensky_url.dimmed(),
        cfg.adsbx_url.dimmed(),
        cfg.poll_interval_secs
    );

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown = Arc::new(shutdown_tx);

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown_ctrlc = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping feeds …".yellow().bold());
        shutdown_ctrlc.send_replace(true);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; use /quit to exit");
    }

    // ── Interactive REPL ──────────────────────────────────────────────────
    let (command_tx, command_rx) = mpsc::channel::<Command>(COMMAND_CAPACITY);
    let shutdown_repl = Arc::clone(&shutdown);
    let status_repl = Arc::clone(&status_requested);
    std::thread::spawn(move || repl::run(command_tx, shutdown_repl, status_repl));

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Session loop ──────────────────────────────────────────────────────
    let session = runtime.block_on(flightsync_runtime::run(session, feeds, command_rx, shutdown_rx));

    let status = session.status();
    info!(
        complete = status.complete,
        total = status.total,
        merges = status.merges,
        "session finished"
    );
    println!(
        "\n  {} {} complete aircraft of {} tracked, {} fragments merged.",
        "✓".green().bold(),
        status.complete,
        status.total,
        status.merges
    );

    // Dropping the session closes the bus, which ends the printer.
    drop(session);
    runtime.block_on(async {
        if tokio::time::timeout(PRINTER_DRAIN, printer).await.is_err() {
            warn!("event printer did not stop in time");
        }
    });
    println!("{}", "  ✓ Exiting FlightSync.".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║     FlightSync First-Run Wizard      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up FlightSync.\n");

    let mut cfg = config::Config::default();

    // Poll interval
    let interval = prompt_line(
        &format!("  Feed poll interval in seconds [{}]: ", cfg.poll_interval_secs),
        &cfg.poll_interval_secs.to_string(),
    );
    if let Ok(secs) = interval.trim().parse::<u64>() {
        if secs > 0 {
            cfg.poll_interval_secs = secs;
        }
    }

    // Retention
    println!("  Aircraft that no feed mentions can be dropped after a while.");
    let retention = prompt_line("  Drop after how many seconds? [keep all]: ", "");
    cfg.retention_secs = retention.trim().parse::<u64>().ok();

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ______ _ _       _     _    _____                   "#.bold().cyan());
    println!("{}", r#"  |  ____| (_)     | |   | |  / ____|                  "#.bold().cyan());
    println!("{}", r#"  | |__  | |_  __ _| |__ | |_| (___  _   _ _ __   ___ "#.bold().cyan());
    println!("{}", r#"  |  __| | | |/ _` | '_ \| __|\___ \| | | | '_ \ / __|"#.bold().cyan());
    println!("{}", r#"  | |    | | | (_| | | | | |_ ____) | |_| | | | | (__ "#.bold().cyan());
    println!("{}", r#"  |_|    |_|_|\__, |_| |_|\__|_____/ \__, |_| |_|\___|"#.bold().cyan());
    println!("{}", r#"               __/ |                 __/ |           "#.bold().cyan());
    println!("{}", r#"              |___/                 |___/            "#.bold().cyan());
    println!();
    println!("  {} {}",
        "FlightSync".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Live air traffic, fused and on screen");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
