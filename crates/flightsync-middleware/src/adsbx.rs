//! Aircraft-list feed: model and route per transponder.
//!
//! The body is `{"acList": [{"Icao": …, "Mdl": …, "From": …, "To": …}, …]}`.
//! Entries lacking any of the four string fields are dropped.

use async_trait::async_trait;
use flightsync_types::{FlightInfo, Fragment, IcaoCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::adapter::{FeedSource, ParseFailure};

pub const ADSBX_URL: &str = "https://public-api.adsbexchange.com/VirtualRadar/AircraftList.json";

#[derive(Debug, Deserialize)]
struct AircraftList {
    #[serde(rename = "acList")]
    ac_list: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct AdsbExchangeSource {
    url: String,
}

impl AdsbExchangeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for AdsbExchangeSource {
    fn default() -> Self {
        Self::new(ADSBX_URL)
    }
}

#[async_trait]
impl FeedSource for AdsbExchangeSource {
    fn name(&self) -> &str {
        "adsbx"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn parse(&self, body: &[u8]) -> Result<Vec<Fragment>, ParseFailure> {
        let list: AircraftList =
            serde_json::from_slice(body).map_err(|e| ParseFailure::new(e.to_string()))?;

        let fragments: Vec<Fragment> = list
            .ac_list
            .iter()
            .filter_map(parse_entry)
            .map(Fragment::Info)
            .collect();

        let dropped = list.ac_list.len() - fragments.len();
        if dropped > 0 {
            debug!(feed = "adsbx", dropped, "incomplete aircraft entries dropped");
        }
        Ok(fragments)
    }
}

fn parse_entry(entry: &Map<String, Value>) -> Option<FlightInfo> {
    let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
    Some(FlightInfo {
        icao: IcaoCode::new(entry.get("Icao")?.as_str()?)?,
        model: text("Mdl")?,
        origin: text("From")?,
        destination: text("To")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Vec<Fragment>, ParseFailure> {
        AdsbExchangeSource::default().parse(body.as_bytes())
    }

    #[test]
    fn reads_route_and_model() {
        let body = r#"{"totalAc": 1, "acList": [
            {"Id": 3957828, "Icao": "3C6444", "Mdl": "Airbus A320 214", "From": "EDDF Frankfurt", "To": "EGLL London", "Alt": 3000}
        ]}"#;
        let fragments = parse(body).unwrap();
        assert_eq!(
            fragments,
            vec![Fragment::Info(FlightInfo {
                icao: IcaoCode::new("3C6444").unwrap(),
                model: "Airbus A320 214".to_string(),
                origin: "EDDF Frankfurt".to_string(),
                destination: "EGLL London".to_string(),
            })]
        );
    }

    #[test]
    fn entries_missing_fields_are_dropped() {
        let body = r#"{"acList": [
            {"Icao": "AAAAAA", "Mdl": "B738", "From": "FRA"},
            {"Icao": "BBBBBB", "Mdl": 737, "From": "FRA", "To": "MUC"},
            {"Mdl": "B738", "From": "FRA", "To": "MUC"},
            {"Icao": "CCCCCC", "Mdl": "B738", "From": "FRA", "To": "MUC"}
        ]}"#;
        let fragments = parse(body).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].key().as_str(), "CCCCCC");
    }

    #[test]
    fn keys_are_normalised() {
        let body = r#"{"acList": [{"Icao": "3c6444", "Mdl": "B738", "From": "FRA", "To": "MUC"}]}"#;
        assert_eq!(parse(body).unwrap()[0].key().as_str(), "3C6444");
    }

    #[test]
    fn wrong_shape_is_a_parse_failure() {
        assert!(parse("not json").is_err());
        assert!(parse(r#"{"aircraft": []}"#).is_err());
        assert!(parse(r#"{"acList": {"Icao": "A"}}"#).is_err());
    }
}
