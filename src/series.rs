use serde::Deserialize;

use crate::error::{Result, TimeError};
use crate::interval::Interval;

/// Grid properties that can be requested for display.
pub const PERMITTED_PROPERTIES: [&str; 14] = [
    "dewpoint",
    "heatIndex",
    "maxTemperature",
    "minTemperature",
    "pressure",
    "probabilityOfPrecipitation",
    "probabilityOfThunder",
    "quantitativePrecipitation",
    "relativeHumidity",
    "skyCover",
    "temperature",
    "windChill",
    "windDirection",
    "windSpeed",
];

/// Check that `name` is a displayable grid property, for use as a clap value parser.
pub fn parse_property(name: &str) -> std::result::Result<String, String> {
    if PERMITTED_PROPERTIES.contains(&name) {
        Ok(name.to_string())
    } else {
        Err(format!(
            "requested property '{name}' is not one of: {}",
            PERMITTED_PROPERTIES.join(", ")
        ))
    }
}

/// One property block of the grid response, e.g. `properties.temperature`.
#[derive(Debug, Clone, Deserialize)]
pub struct GridLayer {
    #[serde(default)]
    pub uom: String,
    #[serde(default)]
    pub values: Vec<GridValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridValue {
    #[serde(rename = "validTime")]
    pub valid_time: String,
    pub value: Option<f64>,
}

/// A single forecast value and the time range it is valid for.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPoint {
    pub interval: Interval,
    pub value: f64,
    pub unit: String,
}

/// All points of one grid property, sorted by interval start.
#[derive(Debug, Clone)]
pub struct PropertySeries {
    pub name: String,
    pub points: Vec<WeatherPoint>,
}

impl PropertySeries {
    /// Build a series from a raw grid layer.
    ///
    /// Every `validTime` must parse; a single bad entry fails the whole property. Entries with
    /// a `null` value are dropped so those hours show up as missing data.
    pub fn from_layer(name: &str, layer: &GridLayer) -> Result<Self> {
        let mut points = Vec::with_capacity(layer.values.len());
        for raw in &layer.values {
            let interval = Interval::from_valid_time(&raw.valid_time).map_err(|source| {
                TimeError::InvalidValidTime {
                    valid_time: raw.valid_time.clone(),
                    source: Box::new(source),
                }
            })?;
            let Some(value) = raw.value else {
                tracing::debug!(
                    property = name,
                    valid_time = %raw.valid_time,
                    "skipping null value"
                );
                continue;
            };
            points.push(WeatherPoint {
                interval,
                value,
                unit: layer.uom.clone(),
            });
        }
        Ok(PropertySeries::new(name, points))
    }

    /// Create a series, sorting `points` by interval start. The sort is stable, so points
    /// sharing a start keep their upstream order.
    pub fn new(name: impl Into<String>, mut points: Vec<WeatherPoint>) -> Self {
        points.sort_by_key(|p| p.interval.start);
        PropertySeries {
            name: name.into(),
            points,
        }
    }
}
