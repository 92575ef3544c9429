//! rio-stac CLI - create a STAC Item from a raster file

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

use rio_stac::core::{parse_key_value, parse_properties, AssetMediaType};
use rio_stac::{create_stac_item, Crs, DatetimeInput, ItemOptions, Source};

#[derive(Parser, Debug)]
#[command(name = "rio-stac")]
#[command(author, version, about = "Create a STAC Item from a raster dataset", long_about = None)]
struct Cli {
    /// Input raster file
    input: PathBuf,

    /// Item datetime, either one instant or a START/END range
    #[arg(short, long, value_parser = parse_datetime_arg)]
    datetime: Option<DatetimeInput>,

    /// Extension schema URL to declare (repeatable)
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Collection id
    #[arg(short, long)]
    collection: Option<String>,

    /// Link to the collection, defaults to the collection id
    #[arg(long)]
    collection_url: Option<String>,

    /// Extra property as NAME=VALUE (repeatable)
    #[arg(short, long = "property")]
    properties: Vec<String>,

    /// Item id, defaults to the input basename
    #[arg(long)]
    id: Option<String>,

    /// Asset name
    #[arg(short = 'n', long, default_value = "asset")]
    asset_name: String,

    /// Asset href, defaults to the input path
    #[arg(long)]
    asset_href: Option<String>,

    /// Asset media type name (COG, GEOTIFF, ...), "auto" or "none"
    #[arg(long = "asset-mediatype", default_value = "auto", value_parser = parse_media_type_arg)]
    asset_media_type: AssetMediaType,

    /// Asset role (repeatable)
    #[arg(long = "asset-role")]
    asset_roles: Vec<String>,

    /// Skip the projection extension
    #[arg(long)]
    without_proj: bool,

    /// Skip the raster extension
    #[arg(long)]
    without_raster: bool,

    /// Skip the eo extension
    #[arg(long)]
    without_eo: bool,

    /// Longest side of the array raster statistics are computed from
    #[arg(long, default_value_t = 1024)]
    max_raster_size: usize,

    /// Points added to each footprint edge before reprojection
    #[arg(long, default_value_t = 0)]
    densify_geom: i32,

    /// Decimal places kept in geometry coordinates (-1 keeps all)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    geom_precision: i32,

    /// Geographic CRS of the bbox and geometry
    #[arg(long, default_value = "EPSG:4326")]
    geographic_crs: String,

    /// Histogram bin count
    #[arg(long)]
    histogram_bins: Option<usize>,

    /// Histogram range as MIN,MAX
    #[arg(long, value_parser = parse_range_arg, allow_hyphen_values = true)]
    histogram_range: Option<(f64, f64)>,

    /// Output file, defaults to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GDAL configuration option as NAME=VALUE (repeatable)
    #[arg(long = "config")]
    config: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_datetime_arg(value: &str) -> Result<DatetimeInput, String> {
    value.parse().map_err(|e| format!("{}", e))
}

fn parse_media_type_arg(value: &str) -> Result<AssetMediaType, String> {
    value.parse().map_err(|e| format!("{}", e))
}

fn parse_range_arg(value: &str) -> Result<(f64, f64), String> {
    let (min, max) = value
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got '{}'", value))?;
    let min = min.trim().parse::<f64>().map_err(|e| format!("invalid minimum: {}", e))?;
    let max = max.trim().parse::<f64>().map_err(|e| format!("invalid maximum: {}", e))?;
    Ok((min, max))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("Parsed CLI args: {:?}", cli);

    for option in &cli.config {
        let (key, value) = parse_key_value(option)?;
        gdal::config::set_config_option(&key, &value)
            .with_context(|| format!("Failed to set GDAL option {}", key))?;
    }

    let geographic_crs = Crs::from_user_input(&cli.geographic_crs)
        .with_context(|| format!("Invalid geographic CRS: {}", cli.geographic_crs))?;

    let options = ItemOptions {
        input_datetime: cli.datetime,
        extensions: cli.extensions,
        collection: cli.collection,
        collection_url: cli.collection_url,
        properties: parse_properties(&cli.properties)?,
        id: cli.id,
        asset_name: cli.asset_name,
        asset_roles: cli.asset_roles,
        asset_media_type: cli.asset_media_type,
        asset_href: cli.asset_href,
        with_proj: !cli.without_proj,
        with_raster: !cli.without_raster,
        with_eo: !cli.without_eo,
        raster_max_size: cli.max_raster_size,
        geom_densify_pts: cli.densify_geom,
        geom_precision: cli.geom_precision,
        geographic_crs,
        histogram_bins: cli.histogram_bins,
        histogram_range: cli.histogram_range,
        ..ItemOptions::default()
    };

    let created = create_stac_item(Source::Path(&cli.input), &options)
        .with_context(|| format!("Failed to create STAC item from {}", cli.input.display()))?;
    info!(
        "Created item {} with {} warning(s)",
        created.item.id,
        created.warnings.len()
    );

    let json = created.item.to_json()?;
    match &cli.output {
        Some(path) => fs::write(path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}
