use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::series::{GridLayer, PropertySeries};

pub const CENSUS_URL: &str = "https://geocoding.geo.census.gov";
pub const NWS_URL: &str = "https://api.weather.gov";

const USER_AGENT: &str = concat!("agcw/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Base URLs of the services used for a forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub census: String,
    pub nws: String,
}

/// HTTP client with the headers the weather service expects.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("could not initialize HTTP client")
}

/// Look up the forecast grid data URL for a coordinate pair.
pub async fn forecast_grid_url(
    client: &reqwest::Client,
    nws_url: &str,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<String> {
    #[derive(Debug, Deserialize)]
    struct Response {
        properties: PointProperties,
    }

    #[derive(Debug, Deserialize)]
    struct PointProperties {
        #[serde(rename = "forecastGridData")]
        forecast_grid_data: Option<String>,
    }

    // the points endpoint redirects requests with more than four decimals
    let url = format!(
        "{}/points/{latitude:.4},{longitude:.4}",
        nws_url.trim_end_matches('/')
    );
    tracing::debug!(%url, "resolving forecast grid");

    let response = client
        .get(&url)
        .header("Accept", "application/geo+json")
        .send()
        .await
        .context("HTTP request failed")?;

    if !response.status().is_success() {
        bail!("API error: {}", response.status());
    }

    let data: Response = response.json().await.context("JSON parsing failed")?;
    data.properties
        .forecast_grid_data
        .context("no forecast grid available for this location")
}

/// Download grid data and build one series per requested property, in request order.
///
/// A property that is absent from the response, or whose time ranges fail to parse, fails the
/// whole download.
pub async fn download_grid(
    client: &reqwest::Client,
    grid_url: &str,
    properties: &[String],
) -> anyhow::Result<Vec<PropertySeries>> {
    #[derive(Debug, Deserialize)]
    struct Response {
        properties: HashMap<String, serde_json::Value>,
    }

    tracing::debug!(url = grid_url, "downloading grid data");

    let response = client
        .get(grid_url)
        .header("Accept", "application/geo+json")
        .send()
        .await
        .context("HTTP request failed")?;

    if !response.status().is_success() {
        bail!("API error: {}", response.status());
    }

    let data: Response = response.json().await.context("JSON parsing failed")?;

    properties
        .iter()
        .map(|name| -> anyhow::Result<PropertySeries> {
            let raw = data
                .properties
                .get(name)
                .filter(|v| !v.is_null())
                .cloned()
                .with_context(|| format!("no data for requested property: {name}"))?;
            let layer: GridLayer = serde_json::from_value(raw)
                .with_context(|| format!("error parsing requested property '{name}'"))?;
            let series = PropertySeries::from_layer(name, &layer)
                .with_context(|| format!("error parsing time range of property '{name}'"))?;
            tracing::debug!(
                property = %name,
                points = series.points.len(),
                "built property series"
            );
            Ok(series)
        })
        .collect()
}
