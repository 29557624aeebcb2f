use crate::deferred::Deferred;
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Raw response to a GetCapabilities request
#[derive(Debug, Clone)]
pub struct CapabilitiesResponse {
  /// Structured body, when the service answered with JSON
  pub document: Option<serde_json::Value>,
  pub text: String,
}

/// The body a parser should read: the structured document when present,
/// the raw text otherwise.
#[derive(Debug, Clone, Copy)]
pub enum ResponseBody<'a> {
  Document(&'a serde_json::Value),
  Text(&'a str),
}

impl CapabilitiesResponse {
  pub fn from_text(text: impl Into<String>) -> Self {
    Self {
      document: None,
      text: text.into(),
    }
  }

  pub fn with_document(document: serde_json::Value, text: String) -> Self {
    Self {
      document: Some(document),
      text,
    }
  }

  pub fn body(&self) -> ResponseBody<'_> {
    match &self.document {
      Some(document) => ResponseBody::Document(document),
      None => ResponseBody::Text(&self.text),
    }
  }
}

/// HTTP operations the layer needs from its transport.
///
/// Kept as a trait so hosts can route requests through their own client
/// and tests can serve canned documents.
pub trait Transport: Send + Sync {
  fn get(&self, url: Url) -> BoxFuture<'static, Result<CapabilitiesResponse>>;

  /// POST an XML request body and return the response text.
  fn post_xml(&self, url: Url, body: String) -> BoxFuture<'static, Result<String>>;
}

/// Transport backed by reqwest
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  fn get(&self, url: Url) -> BoxFuture<'static, Result<CapabilitiesResponse>> {
    let client = self.client.clone();

    Box::pin(async move {
      let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

      let status = response.status();
      if !status.is_success() {
        return Err(eyre!("HTTP {} from {}", status, url));
      }

      let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

      let text = response
        .text()
        .await
        .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))?;

      // A JSON body that fails to decode is left to the parser to report
      let document = if is_json {
        serde_json::from_str(&text).ok()
      } else {
        None
      };

      match document {
        Some(document) => Ok(CapabilitiesResponse::with_document(document, text)),
        None => Ok(CapabilitiesResponse::from_text(text)),
      }
    })
  }

  fn post_xml(&self, url: Url, body: String) -> BoxFuture<'static, Result<String>> {
    let client = self.client.clone();

    Box::pin(async move {
      let response = client
        .post(url.clone())
        .header(CONTENT_TYPE, "text/xml")
        .body(body)
        .send()
        .await
        .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

      let status = response.status();
      if !status.is_success() {
        return Err(eyre!("HTTP {} from {}", status, url));
      }

      response
        .text()
        .await
        .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))
    })
  }
}

/// Build the GetCapabilities URL for a service, keeping any query
/// parameters already present on `base`.
pub fn capabilities_url(base: &str) -> Result<Url> {
  let mut url = Url::parse(base).map_err(|e| eyre!("Invalid service URL '{}': {}", base, e))?;

  url
    .query_pairs_mut()
    .append_pair("service", "SOS")
    .append_pair("request", "GetCapabilities");

  Ok(url)
}

/// Issues the one-time "describe yourself" request for a layer.
#[derive(Clone)]
pub struct CapabilitiesFetcher {
  transport: Arc<dyn Transport>,
}

impl CapabilitiesFetcher {
  pub fn new(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }

  /// Start the GetCapabilities request. The response is delivered through
  /// the returned [`Deferred`].
  pub fn request(&self, service_url: &str) -> Result<Deferred<CapabilitiesResponse>> {
    let url = capabilities_url(service_url)?;
    debug!(%url, "Requesting SOS capabilities");

    Deferred::spawn(self.transport.get(url))
  }
}
