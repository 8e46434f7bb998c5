//! Features: a geometry plus attributes

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::geometry::{Bounds, GeoInterface, Geometry};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A GeoJSON feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    /// Optional feature ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Feature attributes
    #[serde(default)]
    pub properties: BTreeMap<String, AttributeValue>,
    /// Precomputed `[min_x, min_y, max_x, max_y]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    /// Feature geometry
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            properties: BTreeMap::new(),
            bbox: None,
            geometry: Some(geometry),
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

impl GeoInterface for Feature {
    fn geo_interface(&self) -> Option<Cow<'_, Geometry>> {
        self.geometry.as_ref().map(Cow::Borrowed)
    }

    fn bbox(&self) -> Option<Bounds> {
        self.bbox.map(Bounds::from_array)
    }

    fn is_feature(&self) -> bool {
        true
    }
}
