//! # rasterfeat core
//!
//! Core types for moving between vector geometries and raster grids.
//!
//! This crate provides:
//! - `RasterBuffer`: dtype-tagged 2-D pixel arrays
//! - `DataType`: numeric kinds and the burnable dtype lattice
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `Window`: pixel-space windows
//! - `Geometry` / `Feature`: GeoJSON-like vector types
//! - `RasterDataset`: the read-only dataset seam
//! - `CRS`: Coordinate Reference System handling

pub mod crs;
pub mod dataset;
pub mod error;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use dataset::{MemDataset, RasterDataset};
pub use error::{Error, Result};
pub use raster::{DataType, GeoTransform, RasterBuffer, RasterElement, Scalar, Window};
pub use vector::{Bounds, Feature, GeoInterface, Geometry};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::dataset::{MemDataset, RasterDataset};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{DataType, GeoTransform, RasterBuffer, RasterElement, Scalar, Window};
    pub use crate::vector::{AttributeValue, Bounds, Feature, GeoInterface, Geometry};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in rasterfeat.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
