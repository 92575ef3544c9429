//! Raster dataset access: the dataset trait and its GDAL, GCP-warped and in-memory forms

pub mod dataset;
pub mod gdal_raster;
pub mod memory;
pub mod warped;

pub use dataset::{BandMetadata, Gcp, GcpSet, MaskedBand, RasterDataset};
pub use gdal_raster::GdalRaster;
pub use memory::MemoryRaster;
pub use warped::GcpWarpedView;
