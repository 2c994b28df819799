//! Configuration Vault – reads/writes `~/.flightsync/config.toml`.

use flightsync_fusion::RetentionPolicy;
use flightsync_middleware::PollConfig;
use flightsync_middleware::adsbx::ADSBX_URL;
use flightsync_middleware::opensky::OPENSKY_URL;
use flightsync_runtime::{SessionConfig, default_destinations};
use flightsync_scene::{GeoBounds, MercatorViewport, ProximityConfig};
use flightsync_types::{Destination, FlightError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Screen size and the map box shown on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_screen_width")]
    pub screen_width: f64,

    #[serde(default = "default_screen_height")]
    pub screen_height: f64,

    #[serde(default)]
    pub bounds: GeoBounds,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            bounds: GeoBounds::default(),
        }
    }
}

/// Persisted user configuration stored in `~/.flightsync/config.toml`.
///
/// Scalar fields come first so the TOML output keeps plain keys ahead of
/// the `[viewport]` and `[[destinations]]` tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// State-vector endpoint (positions).
    #[serde(default = "default_opensky_url")]
    pub opensky_url: String,

    /// Aircraft-list endpoint (model and route).
    #[serde(default = "default_adsbx_url")]
    pub adsbx_url: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Fragments per emitted batch.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between two batches of the same poll.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    #[serde(default = "default_waypoint_step")]
    pub waypoint_step: f64,

    #[serde(default = "default_destination_radius")]
    pub destination_radius: f64,

    #[serde(default = "default_body_radius")]
    pub actor_radius: f64,

    #[serde(default = "default_body_radius")]
    pub aircraft_radius: f64,

    #[serde(default = "default_transition_secs")]
    pub transition_secs: f64,

    #[serde(default = "default_actor_speed")]
    pub actor_speed: f64,

    /// Drop aircraft no feed has mentioned for this long. Absent keeps
    /// every aircraft for the whole run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_secs: Option<u64>,

    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default = "default_destinations")]
    pub destinations: Vec<Destination>,
}

fn default_opensky_url() -> String {
    OPENSKY_URL.to_string()
}
fn default_adsbx_url() -> String {
    ADSBX_URL.to_string()
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_chunk_size() -> usize {
    100
}
fn default_chunk_delay_ms() -> u64 {
    16
}
fn default_waypoint_step() -> f64 {
    20.0
}
fn default_destination_radius() -> f64 {
    40.0
}
fn default_body_radius() -> f64 {
    10.0
}
fn default_transition_secs() -> f64 {
    12.0
}
fn default_actor_speed() -> f64 {
    40.0
}
fn default_screen_width() -> f64 {
    1024.0
}
fn default_screen_height() -> f64 {
    768.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opensky_url: default_opensky_url(),
            adsbx_url: default_adsbx_url(),
            poll_interval_secs: default_poll_interval_secs(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            waypoint_step: default_waypoint_step(),
            destination_radius: default_destination_radius(),
            actor_radius: default_body_radius(),
            aircraft_radius: default_body_radius(),
            transition_secs: default_transition_secs(),
            actor_speed: default_actor_speed(),
            retention_secs: None,
            viewport: ViewportConfig::default(),
            destinations: default_destinations(),
        }
    }
}

impl Config {
    /// Polling settings shared by both feeds.
    pub fn poll_config(&self) -> Result<PollConfig, FlightError> {
        if self.poll_interval_secs == 0 {
            return Err(FlightError::InvalidConfig(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(FlightError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(PollConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            chunk_size: self.chunk_size,
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            ..PollConfig::default()
        })
    }

    /// Validated session settings.
    pub fn session_config(&self) -> Result<SessionConfig, FlightError> {
        let transition = Duration::try_from_secs_f64(self.transition_secs).map_err(|_| {
            FlightError::InvalidConfig(format!(
                "transition_secs must be a non-negative number of seconds, got {}",
                self.transition_secs
            ))
        })?;
        MercatorViewport::new(
            self.viewport.screen_width,
            self.viewport.screen_height,
            self.viewport.bounds,
        )?;

        let session = SessionConfig {
            screen_width: self.viewport.screen_width,
            screen_height: self.viewport.screen_height,
            bounds: self.viewport.bounds,
            waypoint_step: self.waypoint_step,
            actor_speed: self.actor_speed,
            transition,
            proximity: ProximityConfig {
                destination_radius: self.destination_radius,
                actor_radius: self.actor_radius,
                aircraft_radius: self.aircraft_radius,
            },
            retention: match self.retention_secs {
                Some(secs) => RetentionPolicy::TimeToLive(Duration::from_secs(secs)),
                None => RetentionPolicy::Unbounded,
            },
            destinations: self.destinations.clone(),
            seed: None,
        };
        session.validate()?;
        Ok(session)
    }
}

/// Return the path to `~/.flightsync/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".flightsync").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `FLIGHTSYNC_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FLIGHTSYNC_OPENSKY_URL` | `opensky_url` |
/// | `FLIGHTSYNC_ADSBX_URL` | `adsbx_url` |
/// | `FLIGHTSYNC_POLL_INTERVAL_SECS` | `poll_interval_secs` |
/// | `FLIGHTSYNC_RETENTION_SECS` | `retention_secs` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("FLIGHTSYNC_OPENSKY_URL") {
        cfg.opensky_url = v;
    }
    if let Ok(v) = std::env::var("FLIGHTSYNC_ADSBX_URL") {
        cfg.adsbx_url = v;
    }
    if let Some(secs) = env_u64("FLIGHTSYNC_POLL_INTERVAL_SECS") {
        cfg.poll_interval_secs = secs;
    }
    if let Some(secs) = env_u64("FLIGHTSYNC_RETENTION_SECS") {
        cfg.retention_secs = Some(secs);
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Save the config to disk, creating `~/.flightsync/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.poll_interval_secs, 10);
        assert_eq!(loaded.chunk_size, 100);
        assert_eq!(loaded.waypoint_step, 20.0);
        assert_eq!(loaded.destinations.len(), 7);
        assert_eq!(loaded.destinations[0].name, "Gießen");
        assert_eq!(loaded.viewport, ViewportConfig::default());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");

        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700, "config directory must have 0o700 permissions");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(&path, "waypoint_step = 25.0\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.waypoint_step, 25.0);
        assert_eq!(loaded.actor_speed, 40.0);
        assert_eq!(loaded.destinations, default_destinations());
    }

    #[test]
    fn config_path_points_to_flightsync_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".flightsync"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn default_config_converts() {
        let cfg = Config::default();
        let session = cfg.session_config().expect("valid");
        assert_eq!(session.retention, RetentionPolicy::Unbounded);
        assert_eq!(session.transition, Duration::from_secs(12));
        assert_eq!(session.proximity.destination_radius, 40.0);

        let poll = cfg.poll_config().expect("valid");
        assert_eq!(poll.poll_interval, Duration::from_secs(10));
        assert_eq!(poll.chunk_delay, Duration::from_millis(16));
    }

    #[test]
    fn retention_maps_to_time_to_live() {
        let cfg = Config {
            retention_secs: Some(120),
            ..Config::default()
        };
        assert_eq!(
            cfg.session_config().expect("valid").retention,
            RetentionPolicy::TimeToLive(Duration::from_secs(120))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero_step = Config {
            waypoint_step: 0.0,
            ..Config::default()
        };
        assert!(zero_step.session_config().is_err());

        let no_destinations = Config {
            destinations: Vec::new(),
            ..Config::default()
        };
        assert_eq!(
            no_destinations.session_config().unwrap_err(),
            FlightError::EmptyDestinations
        );

        let flat_screen = Config {
            viewport: ViewportConfig {
                screen_height: 0.0,
                ..ViewportConfig::default()
            },
            ..Config::default()
        };
        assert!(flat_screen.session_config().is_err());

        for transition_secs in [1e30, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = Config {
                transition_secs,
                ..Config::default()
            };
            assert!(
                matches!(cfg.session_config(), Err(FlightError::InvalidConfig(_))),
                "transition_secs = {transition_secs} accepted"
            );
        }

        let no_interval = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert!(no_interval.poll_config().is_err());
    }

    #[test]
    fn apply_env_overrides_changes_urls() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("FLIGHTSYNC_OPENSKY_URL", "http://localhost:8080/states") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.opensky_url, "http://localhost:8080/states");
        unsafe { std::env::remove_var("FLIGHTSYNC_OPENSKY_URL") };
    }

    #[test]
    fn apply_env_overrides_changes_retention() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("FLIGHTSYNC_RETENTION_SECS", "300") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.retention_secs, Some(300));
        unsafe { std::env::remove_var("FLIGHTSYNC_RETENTION_SECS") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_interval() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("FLIGHTSYNC_POLL_INTERVAL_SECS", "soon") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.poll_interval_secs, 10);
        unsafe { std::env::remove_var("FLIGHTSYNC_POLL_INTERVAL_SECS") };
    }
}
