use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;
use clap::Parser;
use serde::Serialize;

use agcw::align::{align, Cell, HourlyClock, Row};
use agcw::fetch::{
    download_grid, forecast_grid_url, http_client, Endpoints, CENSUS_URL, NWS_URL,
};
use agcw::location::resolve_location;
use agcw::series::parse_property;
use agcw::table::{dedup, Table};
use agcw::units::{display_unit, to_imperial};

#[derive(Parser)]
#[command(name = "agcw")]
#[command(about = "Show the hourly National Weather Service grid forecast for an address")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Address at which to see the weather, or a lat,long pair
    #[arg(long)]
    address: String,

    /// Comma-separated weather properties to display
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "temperature",
        value_parser = parse_property
    )]
    properties: Vec<String>,

    /// Number of hours of predictions to show
    #[arg(long, default_value_t = 12)]
    hours: u32,

    /// Start predictions this many hours from now
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,

    /// Time zone in which to display predictions
    #[arg(long, default_value = "UTC")]
    displaytz: Tz,

    /// Use freedom units
    #[arg(long)]
    freedom: bool,

    /// Output one JSON object per hour instead of a table
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, hide = true, default_value = CENSUS_URL)]
    census_url: String,

    #[arg(long, hide = true, default_value = NWS_URL)]
    nws_url: String,
}

/// Hourly clock running from `now + offset` hours to `hours` hours after that.
fn resolve_clock(
    now: DateTime<FixedOffset>,
    offset: i64,
    hours: u32,
) -> anyhow::Result<HourlyClock> {
    let start = Duration::try_hours(offset)
        .and_then(|d| now.checked_add_signed(d))
        .context("offset is out of range")?;
    let end = start
        .checked_add_signed(Duration::hours(hours.into()))
        .context("hours is out of range")?;
    Ok(HourlyClock::new(start, end)?)
}

/// Build a table with Date and Time columns followed by one column per property.
///
/// Times are shown in `tz`; dates are deduped so only the first row of each day shows the date.
fn build_forecast_table(rows: &[Row], properties: &[String], tz: Tz, freedom: bool) -> Table {
    let dates = dedup(
        rows.iter()
            .map(|r| r.at.with_timezone(&tz).format("%Y-%m-%d").to_string()),
    );
    let times = rows
        .iter()
        .map(|r| r.at.with_timezone(&tz).format("%H:%M").to_string())
        .collect();

    let mut table = Table::new().column("Date", dates).column("Time", times);
    for (i, property) in properties.iter().enumerate() {
        let cells = rows.iter().map(|r| r.cells[i].format(freedom)).collect();
        table = table.column(property.as_str(), cells);
    }
    table
}

#[derive(Serialize)]
struct RowOutput<'a> {
    time: String,
    values: Vec<ValueOutput<'a>>,
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    property: &'a str,
    value: Option<f64>,
    unit: Option<&'a str>,
}

fn row_json<'a>(row: &'a Row, properties: &'a [String], tz: Tz, freedom: bool) -> RowOutput<'a> {
    let values = properties
        .iter()
        .zip(&row.cells)
        .map(|(property, cell)| match cell {
            Cell::Value { value, unit } => {
                let (value, unit) = if freedom {
                    to_imperial(*value, unit)
                } else {
                    (*value, display_unit(unit))
                };
                ValueOutput {
                    property,
                    value: Some(value),
                    unit: Some(unit),
                }
            }
            Cell::NoData => ValueOutput {
                property,
                value: None,
                unit: None,
            },
        })
        .collect();
    RowOutput {
        time: row.at.with_timezone(&tz).to_rfc3339(),
        values,
    }
}

/// Geocode the address, fetch the grid forecast and print the requested window.
async fn do_forecast(cli: &Cli) -> anyhow::Result<()> {
    let endpoints = Endpoints {
        census: cli.census_url.clone(),
        nws: cli.nws_url.clone(),
    };
    let client = http_client()?;

    // Reject a bad window before doing any network I/O.
    let clock = resolve_clock(Utc::now().fixed_offset(), cli.offset, cli.hours)?;
    tracing::debug!(
        start = %clock.start(),
        end = %clock.end(),
        rows = clock.hour_count(),
        "resolved display window"
    );

    let location = resolve_location(&client, &endpoints.census, &cli.address).await?;
    if cli.verbose {
        println!("Location: {}", location.display_name);
        println!("lat: {}", location.latitude);
        println!("long: {}", location.longitude);
    }

    let grid_url =
        forecast_grid_url(&client, &endpoints.nws, location.latitude, location.longitude).await?;
    if cli.verbose {
        println!("forecastGridDataURL: {grid_url}");
    }

    let series = download_grid(&client, &grid_url, &cli.properties).await?;
    let rows = align(&clock, &series);

    if cli.json {
        for row in &rows {
            let output = row_json(row, &cli.properties, cli.displaytz, cli.freedom);
            println!("{}", serde_json::to_string(&output)?);
        }
        return Ok(());
    }

    build_forecast_table(&rows, &cli.properties, cli.displaytz, cli.freedom).print();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    agcw::logging::init(cli.verbose);

    match do_forecast(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("agcw encountered an error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
