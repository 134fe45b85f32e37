use std::sync::LazyLock;

use anyhow::{bail, Context};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A resolved geographic location with coordinates and display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Matched address from the geocoder, or the original coordinate string.
    pub display_name: String,
    /// Latitude in degrees, range -90 to 90.
    pub latitude: f64,
    /// Longitude in degrees, range -180 to 180.
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    result: GeocodeResult,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(rename = "addressMatches", default)]
    address_matches: Vec<AddressMatch>,
}

#[derive(Debug, Deserialize)]
struct AddressMatch {
    #[serde(rename = "matchedAddress", default)]
    matched_address: String,
    coordinates: Coordinates,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    x: f64, // longitude
    y: f64, // latitude
}

/// Parse a coordinate string in "latitude,longitude" format.
///
/// Returns `None` if the string doesn't match the expected format or if
/// coordinates are out of valid ranges (latitude: -90 to 90, longitude: -180 to 180).
fn parse_coordinates(s: &str) -> Option<Location> {
    static COORD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"(?x)
            ^
            \s*
            (-?[0-9]+(?:\.[0-9]+)?)   # latitude: decimal number
            \s*,\s*
            (-?[0-9]+(?:\.[0-9]+)?)   # longitude: decimal number
            \s*
            $
        "#,
        )
        .unwrap()
    });

    let caps = COORD_RE.captures(s)?;
    let latitude: f64 = caps[1].parse().ok()?;
    let longitude: f64 = caps[2].parse().ok()?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(Location {
        display_name: s.trim().to_string(),
        latitude,
        longitude,
    })
}

/// Resolve an address to geographic coordinates.
///
/// A "latitude,longitude" pair is used directly. Anything else is sent as a one-line address
/// to the Census Bureau geocoder at `census_url`, and the first match wins.
pub async fn resolve_location(
    client: &reqwest::Client,
    census_url: &str,
    address: &str,
) -> anyhow::Result<Location> {
    if let Some(location) = parse_coordinates(address) {
        tracing::debug!(address, "address is a coordinate pair, skipping geocoding");
        return Ok(location);
    }

    #[derive(Serialize)]
    struct Query<'a> {
        format: &'a str,
        benchmark: &'a str,
        address: &'a str,
    }

    let url = format!(
        "{}/geocoder/locations/onelineaddress",
        census_url.trim_end_matches('/')
    );
    tracing::debug!(%url, address, "geocoding address");

    let response = client
        .get(&url)
        .query(&Query {
            format: "json",
            benchmark: "Public_AR_Current",
            address,
        })
        .send()
        .await
        .context("Geocoding request failed")?;

    if !response.status().is_success() {
        bail!("Geocoding API error: {}", response.status());
    }

    let data: GeocodeResponse = response
        .json()
        .await
        .context("Geocoding JSON parsing failed")?;

    let Some(found) = data.result.address_matches.into_iter().next() else {
        bail!("no matching coordinates for address");
    };
    let display_name = if found.matched_address.is_empty() {
        address.to_string()
    } else {
        found.matched_address
    };

    Ok(Location {
        display_name,
        latitude: found.coordinates.y,
        longitude: found.coordinates.x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coordinates_basic() {
        let loc = parse_coordinates("38.8894,-77.0352").unwrap();
        assert_eq!(loc.latitude, 38.8894);
        assert_eq!(loc.longitude, -77.0352);
        assert_eq!(loc.display_name, "38.8894,-77.0352");
    }

    #[test]
    fn parse_coordinates_with_whitespace() {
        let loc = parse_coordinates("  47 , -122.3  ").unwrap();
        assert_eq!(loc.latitude, 47.0);
        assert_eq!(loc.longitude, -122.3);
        assert_eq!(loc.display_name, "47 , -122.3");
    }

    #[test]
    fn parse_coordinates_out_of_range() {
        assert!(parse_coordinates("90,180").is_some());
        assert!(parse_coordinates("91,0").is_none());
        assert!(parse_coordinates("0,-181").is_none());
    }

    #[test]
    fn parse_coordinates_addresses_are_not_coordinates() {
        assert!(parse_coordinates("1600 Pennsylvania Ave NW, Washington, DC").is_none());
        assert!(parse_coordinates("4600 Silver Hill Rd, 20233").is_none());
        assert!(parse_coordinates("").is_none());
        assert!(parse_coordinates("45,15,20").is_none());
    }
}
