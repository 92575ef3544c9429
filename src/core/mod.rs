//! Metadata extraction and STAC item assembly

pub mod datetime;
pub mod eo;
pub mod footprint;
pub mod geometry;
pub mod item;
pub mod media_type;
pub mod projection;
pub mod raster_stats;

// Re-export main types
pub use datetime::{parse_datetime, DatetimeInput};
pub use eo::{acquisition_datetime, get_cloud_cover, get_eobands_info, EoBand};
pub use footprint::{get_dataset_geom, Footprint, FootprintParams};
pub use geometry::{bbox_to_geom, densify, reproject_bounds, reproject_geometry};
pub use item::{
    create_stac_item, create_stac_items, parse_key_value, parse_properties, AssetMediaType, CreatedItem,
    ItemOptions, Source,
};
pub use media_type::{get_media_type, media_type_for_driver};
pub use projection::{get_projection_info, ProjectionInfo};
pub use raster_stats::{
    get_raster_info, BandStatistics, Histogram, RasterBandInfo, RasterStatsParams, Sampling,
    DEFAULT_HISTOGRAM_BINS, DEFAULT_RASTER_MAX_SIZE,
};
