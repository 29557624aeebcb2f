//! Domain types for SOS capabilities and the features loaded from a service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed GetCapabilities document.
///
/// Only the parts the layer bootstrap needs are kept: the service
/// identification and the list of observation offerings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
  #[serde(default)]
  pub version: String,
  #[serde(default)]
  pub service_identification: Option<ServiceIdentification>,
  #[serde(default)]
  pub contents: Contents,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIdentification {
  pub title: Option<String>,
  #[serde(rename = "abstract")]
  pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contents {
  /// Offerings in document order
  #[serde(default)]
  pub offering_list: Vec<Offering>,
}

/// A named group of observations advertised by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
  pub id: String,
  pub name: Option<String>,
  #[serde(default)]
  pub procedures: Vec<String>,
  #[serde(default)]
  pub observed_properties: Vec<String>,
  #[serde(default)]
  pub feature_of_interest_ids: Vec<String>,
  #[serde(default)]
  pub response_formats: Vec<String>,
}

/// Coordinate reference system code, e.g. `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projection(String);

impl Projection {
  pub fn new(code: impl Into<String>) -> Self {
    Self(code.into())
  }

  pub fn code(&self) -> &str {
    &self.0
  }

  /// URN and URL forms of EPSG:4326 put latitude first; the short
  /// `EPSG:4326` form is treated as x/y.
  pub fn is_lat_lon(&self) -> bool {
    let code = self.0.as_str();
    (code.starts_with("urn:") && code.ends_with(":4326"))
      || (code.starts_with("http") && code.ends_with("/4326"))
  }
}

impl Default for Projection {
  fn default() -> Self {
    Self::new("EPSG:4326")
  }
}

impl fmt::Display for Projection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "POINT({} {})", self.x, self.y)
  }
}

/// A feature of interest as stored in a vector layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
  pub id: String,
  pub name: Option<String>,
  pub geometry: Option<Point>,
  pub projection: Option<Projection>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lat_lon_axis_order() {
    assert!(Projection::new("urn:ogc:def:crs:EPSG::4326").is_lat_lon());
    assert!(Projection::new("urn:ogc:def:crs:EPSG:4326").is_lat_lon());
    assert!(Projection::new("http://www.opengis.net/def/crs/EPSG/0/4326").is_lat_lon());
    assert!(!Projection::new("EPSG:4326").is_lat_lon());
    assert!(!Projection::new("EPSG:3857").is_lat_lon());
  }

  #[test]
  fn test_capabilities_from_json() {
    let json = serde_json::json!({
      "version": "1.0.0",
      "contents": {
        "offeringList": [
          { "id": "temperature", "featureOfInterestIds": ["a", "b"] }
        ]
      }
    });

    let capabilities: Capabilities = serde_json::from_value(json).unwrap();
    assert_eq!(capabilities.contents.offering_list.len(), 1);
    assert_eq!(
      capabilities.contents.offering_list[0].feature_of_interest_ids,
      vec!["a", "b"]
    );
    assert!(capabilities.service_identification.is_none());
  }
}
