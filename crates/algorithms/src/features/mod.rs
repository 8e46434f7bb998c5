//! Raster/vector feature operations
//!
//! - Geometry validation
//! - Burn dtype negotiation
//! - Dataset windows covering a set of shapes
//! - Rasterize and geometry masks
//! - Shapes (polygonize) and sieve filtering
//! - GeoJSON features of a dataset

mod dtype;
mod extract;
mod rasterize;
mod shapes;
mod validate;
mod window;

pub use dtype::{BurnTarget, DtypeNegotiator};
pub use extract::{dataset_features, dataset_features_with, decimate, DatasetFeatures, FeatureParams};
pub use rasterize::{geometry_mask, rasterize, rasterize_with, Rasterize, RasterizeParams, Rasterized, ShapeItem};
pub use shapes::{shapes, shapes_with, sieve, sieve_with, Sieve, SieveParams};
pub use validate::{is_valid, is_valid_geom};
pub use window::{bounds, geometry_window, geometry_window_with, WindowParams};
