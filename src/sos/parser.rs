//! Capabilities document reader.
//!
//! Accepts either a structured (JSON) body or the raw response text. Raw text
//! is read as an SOS 1.0.0 `sos:Capabilities` XML document unless it looks
//! like JSON.

use color_eyre::{eyre::eyre, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::client::{CapabilitiesResponse, ResponseBody};
use super::types::{Capabilities, Offering, ServiceIdentification};
use super::xml;

/// Turns a capabilities response body into a [`Capabilities`] object.
pub trait CapabilitiesParser: Send + Sync {
  fn read(&self, body: ResponseBody<'_>) -> Result<Capabilities>;

  fn read_response(&self, response: &CapabilitiesResponse) -> Result<Capabilities> {
    self.read(response.body())
  }
}

/// Default parser for SOS 1.0.0 capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SosCapabilitiesParser;

impl CapabilitiesParser for SosCapabilitiesParser {
  fn read(&self, body: ResponseBody<'_>) -> Result<Capabilities> {
    match body {
      ResponseBody::Document(document) => serde_json::from_value(document.clone())
        .map_err(|e| eyre!("Failed to read capabilities document: {}", e)),
      ResponseBody::Text(text) if text.trim_start().starts_with('{') => {
        serde_json::from_str(text).map_err(|e| eyre!("Failed to read capabilities JSON: {}", e))
      }
      ResponseBody::Text(text) => read_xml(text),
    }
  }
}

fn read_xml(source: &str) -> Result<Capabilities> {
  let mut reader = Reader::from_str(source);
  reader.config_mut().trim_text(true);

  let mut state = CapabilitiesReader::default();

  loop {
    match reader.read_event() {
      Ok(Event::Start(e)) => state.open(&e)?,
      Ok(Event::Empty(e)) => {
        state.open(&e)?;
        state.close();
      }
      Ok(Event::Text(t)) => state.text(xml::text(&t)?),
      Ok(Event::End(_)) => state.close(),
      Ok(Event::Eof) => break,
      Err(e) => {
        return Err(eyre!(
          "Failed to parse capabilities XML at position {}: {}",
          reader.buffer_position(),
          e
        ))
      }
      _ => {}
    }
  }

  state.finish()
}

/// Streaming state while walking the capabilities XML
#[derive(Default)]
struct CapabilitiesReader {
  capabilities: Capabilities,
  root: Option<String>,
  /// Local names of the currently open elements
  path: Vec<String>,
  offering: Option<Offering>,
  exception: Option<String>,
}

impl CapabilitiesReader {
  fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
    let name = xml::local_name(element);

    if self.root.is_none() {
      if name == "Capabilities" {
        self.capabilities.version = xml::attribute(element, "version")?.unwrap_or_default();
      }
      self.root = Some(name.clone());
    }

    match name.as_str() {
      "ServiceIdentification" => {
        self.capabilities.service_identification = Some(ServiceIdentification::default());
      }
      "ObservationOffering" => {
        self.offering = Some(Offering {
          id: xml::attribute(element, "id")?.unwrap_or_default(),
          ..Offering::default()
        });
      }
      "procedure" | "observedProperty" | "featureOfInterest" => {
        if let (Some(offering), Some(href)) =
          (self.offering.as_mut(), xml::attribute(element, "href")?)
        {
          match name.as_str() {
            "procedure" => offering.procedures.push(href),
            "observedProperty" => offering.observed_properties.push(href),
            _ => offering.feature_of_interest_ids.push(href),
          }
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
      (Some("ObservationOffering"), "name") => {
        if let Some(offering) = self.offering.as_mut() {
          offering.name = Some(text);
        }
      }
      (Some("ObservationOffering"), "responseFormat") => {
        if let Some(offering) = self.offering.as_mut() {
          offering.response_formats.push(text);
        }
      }
      (Some("ServiceIdentification"), "Title") => {
        if let Some(ident) = self.capabilities.service_identification.as_mut() {
          ident.title = Some(text);
        }
      }
      (Some("ServiceIdentification"), "Abstract") => {
        if let Some(ident) = self.capabilities.service_identification.as_mut() {
          ident.summary = Some(text);
        }
      }
      (_, "ExceptionText") => self.exception = Some(text),
      _ => {}
    }
  }

  fn close(&mut self) {
    if let Some(name) = self.path.pop() {
      if name == "ObservationOffering" {
        if let Some(offering) = self.offering.take() {
          self.capabilities.contents.offering_list.push(offering);
        }
      }
    }
  }

  fn finish(self) -> Result<Capabilities> {
    match self.root.as_deref() {
      Some("Capabilities") => Ok(self.capabilities),
      Some("ExceptionReport") => Err(eyre!(
        "Service returned an exception report: {}",
        self.exception.as_deref().unwrap_or("no exception text")
      )),
      Some(other) => Err(eyre!(
        "Not an SOS capabilities document (root element <{}>)",
        other
      )),
      None => Err(eyre!("Capabilities response is empty")),
    }
  }
}
