//! Fetch protocols request feature data for a set of features of interest.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::sos::xml;
use crate::sos::{Feature, Point, Projection, Transport};

/// How decoded features are presented to the layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatOptions {
  /// Projection of the map the layer is displayed on
  pub internal_projection: Option<Projection>,
}

/// Options a protocol is constructed with
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolConfig {
  pub format_options: FormatOptions,
  pub url: String,
  pub fois: Vec<String>,
}

/// Requests and decodes the features for a layer.
pub trait FetchProtocol: Send + Sync {
  fn read(&self) -> BoxFuture<'static, Result<Vec<Feature>>>;
}

/// SOS 1.0.0 GetFeatureOfInterest over HTTP POST
pub struct SosProtocol {
  transport: Arc<dyn Transport>,
  config: ProtocolConfig,
}

impl SosProtocol {
  pub fn new(transport: Arc<dyn Transport>, config: ProtocolConfig) -> Self {
    Self { transport, config }
  }

  /// XML body of the GetFeatureOfInterest request
  pub fn request_body(&self) -> String {
    let mut body = String::from(
      r#"<GetFeatureOfInterest xmlns="http://www.opengis.net/sos/1.0" service="SOS" version="1.0.0">"#,
    );
    for foi in &self.config.fois {
      body.push_str("<FeatureOfInterestId>");
      body.push_str(&escape(foi.as_str()));
      body.push_str("</FeatureOfInterestId>");
    }
    body.push_str("</GetFeatureOfInterest>");
    body
  }
}

impl FetchProtocol for SosProtocol {
  fn read(&self) -> BoxFuture<'static, Result<Vec<Feature>>> {
    if self.config.fois.is_empty() {
      debug!(url = %self.config.url, "No features of interest, skipping request");
      return Box::pin(async { Ok(Vec::new()) });
    }

    let transport = Arc::clone(&self.transport);
    let url = self.config.url.clone();
    let body = self.request_body();
    let options = self.config.format_options.clone();

    Box::pin(async move {
      let url = Url::parse(&url).map_err(|e| eyre!("Invalid service URL '{}': {}", url, e))?;
      debug!(%url, "Requesting features of interest");
      let response = transport.post_xml(url, body).await?;
      decode_features(&response, &options)
    })
  }
}

/// Decode `sa:SamplingPoint` members of a GetFeatureOfInterest response.
///
/// Positions in a lat/lon CRS are swapped so `x` is always the easting.
/// Points without an `srsName` are taken to be in the internal projection.
pub fn decode_features(source: &str, options: &FormatOptions) -> Result<Vec<Feature>> {
  let mut reader = Reader::from_str(source);
  reader.config_mut().trim_text(true);

  let mut state = FeatureReader::default();

  loop {
    match reader.read_event() {
      Ok(Event::Start(e)) => state.open(&e)?,
      Ok(Event::Empty(e)) => {
        state.open(&e)?;
        state.close(options)?;
      }
      Ok(Event::Text(t)) => state.text(xml::text(&t)?),
      Ok(Event::End(_)) => state.close(options)?,
      Ok(Event::Eof) => break,
      Err(e) => {
        return Err(eyre!(
          "Failed to parse feature response at position {}: {}",
          reader.buffer_position(),
          e
        ))
      }
      _ => {}
    }
  }

  if let Some(exception) = state.exception {
    return Err(eyre!("Service returned an exception report: {}", exception));
  }
  Ok(state.features)
}

#[derive(Default)]
struct FeatureReader {
  features: Vec<Feature>,
  path: Vec<String>,
  current: Option<PendingFeature>,
  exception: Option<String>,
}

#[derive(Default)]
struct PendingFeature {
  id: String,
  name: Option<String>,
  srs_name: Option<String>,
  pos: Option<String>,
}

impl FeatureReader {
  fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
    let name = xml::local_name(element);

    match name.as_str() {
      "SamplingPoint" => {
        self.current = Some(PendingFeature {
          id: xml::attribute(element, "id")?.unwrap_or_default(),
          ..PendingFeature::default()
        });
      }
      "Point" | "pos" => {
        if let (Some(feature), Some(srs)) =
          (self.current.as_mut(), xml::attribute(element, "srsName")?)
        {
          feature.srs_name = Some(srs);
        }
      }
      _ => {}
    }

    self.path.push(name);
    Ok(())
  }

  fn text(&mut self, text: String) {
    let Some(current) = self.path.last() else {
      return;
    };
    let parent = self
      .path
      .len()
      .checked_sub(2)
      .and_then(|i| self.path.get(i))
      .map(String::as_str);

    match (parent, current.as_str()) {
      (Some("SamplingPoint"), "name") => {
        if let Some(feature) = self.current.as_mut() {
          feature.name = Some(text);
        }
      }
      (_, "pos") => {
        if let Some(feature) = self.current.as_mut() {
          feature.pos = Some(text);
        }
      }
      (_, "ExceptionText") => self.exception = Some(text),
      _ => {}
    }
  }

  fn close(&mut self, options: &FormatOptions) -> Result<()> {
    if self.path.pop().as_deref() == Some("SamplingPoint") {
      if let Some(pending) = self.current.take() {
        self.features.push(pending.into_feature(options)?);
      }
    }
    Ok(())
  }
}

impl PendingFeature {
  fn into_feature(self, options: &FormatOptions) -> Result<Feature> {
    let projection = self
      .srs_name
      .map(Projection::new)
      .or_else(|| options.internal_projection.clone());

    let geometry = match self.pos.as_deref() {
      Some(pos) => Some(parse_pos(pos, projection.as_ref(), &self.id)?),
      None => None,
    };

    Ok(Feature {
      id: self.id,
      name: self.name,
      geometry,
      projection,
    })
  }
}

fn parse_pos(pos: &str, projection: Option<&Projection>, id: &str) -> Result<Point> {
  let coords = pos
    .split_whitespace()
    .map(str::parse::<f64>)
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(|e| eyre!("Invalid position '{}' for feature {}: {}", pos, id, e))?;

  let [first, second, ..] = coords.as_slice() else {
    return Err(eyre!("Position for feature {} needs two coordinates", id));
  };

  if projection.is_some_and(Projection::is_lat_lon) {
    Ok(Point {
      x: *second,
      y: *first,
    })
  } else {
    Ok(Point {
      x: *first,
      y: *second,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sos::client::tests::StaticTransport;
  use crate::sos::fixtures;

  fn config(fois: &[&str]) -> ProtocolConfig {
    ProtocolConfig {
      format_options: FormatOptions {
        internal_projection: Some(Projection::new("EPSG:4326")),
      },
      url: "http://host/sos".to_string(),
      fois: fois.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[test]
  fn test_request_body_lists_fois() {
    let protocol = SosProtocol::new(
      Arc::new(StaticTransport::new("", "")),
      config(&["urn:a", "b&c"]),
    );

    let body = protocol.request_body();
    assert!(body.starts_with("<GetFeatureOfInterest"));
    assert!(body.contains(r#"service="SOS""#));
    assert!(body.contains("<FeatureOfInterestId>urn:a</FeatureOfInterestId>"));
    assert!(body.contains("<FeatureOfInterestId>b&amp;c</FeatureOfInterestId>"));
  }

  #[test]
  fn test_decode_sampling_points() {
    let options = FormatOptions {
      internal_projection: Some(Projection::new("EPSG:3857")),
    };
    let features = decode_features(fixtures::FEATURES_XML, &options).unwrap();

    assert_eq!(features.len(), 2);

    assert_eq!(features[0].id, "urn:ogc:object:feature:station-1");
    assert_eq!(features[0].name.as_deref(), Some("Station 1"));
    // lat/lon swapped to x/y
    assert_eq!(features[0].geometry, Some(Point { x: 13.4, y: 52.5 }));
    assert_eq!(
      features[0].projection,
      Some(Projection::new("urn:ogc:def:crs:EPSG:4326"))
    );

    // no srsName: internal projection, axis order kept
    assert_eq!(features[1].geometry, Some(Point { x: 7.1, y: 50.7 }));
    assert_eq!(features[1].projection, Some(Projection::new("EPSG:3857")));
  }

  #[test]
  fn test_decode_exception() {
    let err = decode_features(fixtures::EXCEPTION_XML, &FormatOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Unknown request type"));
  }

  #[test]
  fn test_decode_bad_position() {
    let source = r#"<sa:SamplingPoint xmlns:sa="s" xmlns:gml="g" gml:id="x"><gml:pos>north</gml:pos></sa:SamplingPoint>"#;
    assert!(decode_features(source, &FormatOptions::default()).is_err());
  }

  #[tokio::test]
  async fn test_read_posts_request() {
    let transport = Arc::new(StaticTransport::new("", fixtures::FEATURES_XML));
    let protocol = SosProtocol::new(transport.clone(), config(&["urn:ogc:object:feature:station-1"]));

    let features = protocol.read().await.unwrap();

    assert_eq!(features.len(), 2);
    let posts = transport.post_bodies();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].contains("urn:ogc:object:feature:station-1"));
  }

  #[tokio::test]
  async fn test_read_without_fois_skips_request() {
    let transport = Arc::new(StaticTransport::new("", fixtures::FEATURES_XML));
    let protocol = SosProtocol::new(transport.clone(), config(&[]));

    assert!(protocol.read().await.unwrap().is_empty());
    assert!(transport.post_bodies().is_empty());
  }
}
