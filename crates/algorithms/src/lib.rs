//! # rasterfeat algorithms
//!
//! Moving between vector geometries and raster grids.
//!
//! ## Modules
//!
//! - **features**: rasterize, geometry_mask, shapes, sieve, geometry_window,
//!   dataset_features
//! - **engine**: the raster/vector engine (component labelling, burning, tracing)
//! - **reproject**: geometry reprojection with antimeridian cutting

pub mod engine;
pub mod features;
pub mod reproject;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::{Connectivity, MergeAlg, RasterVectorEngine, ScanlineEngine};
    pub use crate::features::{
        bounds, dataset_features, geometry_mask, geometry_window, is_valid, is_valid_geom,
        rasterize, shapes, sieve,
        BurnTarget, FeatureParams, Rasterize, RasterizeParams, ShapeItem, Sieve, SieveParams,
        WindowParams,
    };
    pub use crate::reproject::{cut_antimeridian, GeometryReprojector, ProjReprojector};
    pub use rasterfeat_core::prelude::*;
}
