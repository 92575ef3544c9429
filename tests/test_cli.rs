use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("cli.tif");
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver.create_with_band_type::<u8, _>(&path, 16, 16, 1).unwrap();
    dataset
        .set_geo_transform(&[500000.0, 10.0, 0.0, 4000000.0, 0.0, -10.0])
        .unwrap();
    dataset.set_spatial_ref(&SpatialRef::from_epsg(32633).unwrap()).unwrap();
    let mut band = dataset.rasterband(1).unwrap();
    let data: Vec<u8> = (0..256).map(|v| v as u8).collect();
    band.write((0, 0), (16, 16), &Buffer::new((16, 16), data)).unwrap();
    path
}

fn run(args: &[&str], input: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rio-stac"))
        .arg(input)
        .args(args)
        .output()
        .expect("failed to run rio-stac")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "rio-stac failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_defaults() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let item = stdout_json(&run(&["--datetime", "2021-01-01T00:00:00Z"], &input));
    assert_eq!(item["id"], "cli.tif");
    assert_eq!(item["properties"]["datetime"], "2021-01-01T00:00:00Z");
    assert_eq!(item["properties"]["proj:epsg"], 32633);
    assert_eq!(item["stac_extensions"].as_array().unwrap().len(), 3);
    assert_eq!(item["assets"]["asset"]["type"], "image/tiff; application=geotiff");
    assert_eq!(item["assets"]["asset"]["raster:bands"][0]["data_type"], "uint8");
}

#[test]
fn test_cli_options() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let output_path = dir.path().join("item.json");

    let output = run(
        &[
            "--datetime",
            "2021-01-01/2021-01-02",
            "--without-raster",
            "--without-eo",
            "-p",
            "platform=sentinel-2",
            "-c",
            "mycollection",
            "--id",
            "my-item",
            "-n",
            "data",
            "--asset-href",
            "s3://bucket/cli.tif",
            "--asset-mediatype",
            "COG",
            "--asset-role",
            "data",
            "-o",
            output_path.to_str().unwrap(),
        ],
        &input,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let item: Value = serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(item["id"], "my-item");
    assert_eq!(item["collection"], "mycollection");
    assert_eq!(item["links"][0]["href"], "mycollection");
    assert_eq!(item["properties"]["platform"], "sentinel-2");
    assert!(item["properties"]["datetime"].is_null());
    assert_eq!(item["properties"]["start_datetime"], "2021-01-01T00:00:00Z");
    assert_eq!(
        item["stac_extensions"],
        serde_json::json!(["https://stac-extensions.github.io/projection/v1.1.0/schema.json"])
    );

    let asset = &item["assets"]["data"];
    assert_eq!(asset["href"], "s3://bucket/cli.tif");
    assert_eq!(asset["type"], "image/tiff; application=geotiff; profile=cloud-optimized");
    assert_eq!(asset["roles"], serde_json::json!(["data"]));
    assert!(asset.get("raster:bands").is_none());
}

#[test]
fn test_cli_omits_media_type() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let item = stdout_json(&run(&["--asset-mediatype", "none", "--datetime", "2021-01-01"], &input));
    let asset = &item["assets"]["asset"];
    assert!(asset.get("type").is_none());
    assert_eq!(asset["href"], input.to_str().unwrap());
}

#[test]
fn test_cli_rejects_bad_property() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let output = run(&["-p", "novalue"], &input);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("NAME=VALUE"));
}

#[test]
fn test_cli_histogram_range() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let item = stdout_json(&run(
        &["--histogram-bins", "4", "--histogram-range", "0,100", "--datetime", "2021-01-01"],
        &input,
    ));
    let histogram = &item["assets"]["asset"]["raster:bands"][0]["histogram"];
    assert_eq!(histogram["buckets"].as_array().unwrap().len(), 4);
    assert_eq!(histogram["max"], 100.0);

    let output = run(&["--histogram-range", "10,0"], &input);
    assert!(!output.status.success());
}
