//! State-vector feed: position and heading per transponder.
//!
//! The body is `{"time": …, "states": [[…], …]}` where every state is a
//! positional array. Only four columns are read:
//!
//! | Index | Field |
//! |---|---|
//! | 0 | ICAO24 address (lower-case hex) |
//! | 5 | longitude (degrees) |
//! | 6 | latitude (degrees) |
//! | 10 | true track (degrees clockwise from north) |
//!
//! Rows where any of those is missing or `null` are dropped.

use async_trait::async_trait;
use flightsync_types::{Fragment, IcaoCode, PositionReport};
use serde_json::Value;
use tracing::debug;

use crate::adapter::{FeedSource, ParseFailure};

pub const OPENSKY_URL: &str = "https://opensky-network.org/api/states/all";

const COL_ICAO: usize = 0;
const COL_LONGITUDE: usize = 5;
const COL_LATITUDE: usize = 6;
const COL_TRUE_TRACK: usize = 10;

#[derive(Debug, Clone)]
pub struct OpenSkySource {
    url: String,
}

impl OpenSkySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for OpenSkySource {
    fn default() -> Self {
        Self::new(OPENSKY_URL)
    }
}

#[async_trait]
impl FeedSource for OpenSkySource {
    fn name(&self) -> &str {
        "opensky"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn parse(&self, body: &[u8]) -> Result<Vec<Fragment>, ParseFailure> {
        let document: Value =
            serde_json::from_slice(body).map_err(|e| ParseFailure::new(e.to_string()))?;

        let rows = match document.get("states") {
            Some(Value::Array(rows)) => rows,
            // The endpoint reports an empty sky as `"states": null`.
            Some(Value::Null) => return Ok(Vec::new()),
            _ => return Err(ParseFailure::new("missing `states` array")),
        };

        let fragments: Vec<Fragment> = rows
            .iter()
            .filter_map(parse_state)
            .map(Fragment::Position)
            .collect();

        let dropped = rows.len() - fragments.len();
        if dropped > 0 {
            debug!(feed = "opensky", dropped, "incomplete state vectors dropped");
        }
        Ok(fragments)
    }
}

fn parse_state(row: &Value) -> Option<PositionReport> {
    let columns = row.as_array()?;
    Some(PositionReport {
        icao: IcaoCode::new(columns.get(COL_ICAO)?.as_str()?)?,
        longitude: columns.get(COL_LONGITUDE)?.as_f64()?,
        latitude: columns.get(COL_LATITUDE)?.as_f64()?,
        heading: columns.get(COL_TRUE_TRACK)?.as_f64()?,
    })
}
