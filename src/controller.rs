//! SOS layer: bootstraps a vector layer from a service's capabilities.
//!
//! Lifecycle:
//! 1. `SosLayer::new` stores the service URL; no network activity.
//! 2. `after_add` is called when the layer joins a map. It signals
//!    `LoadStart` and starts the GetCapabilities request.
//! 3. The response is delivered via `poll` (event loop tick) or `resolve`
//!    (await). The first valid response is parsed, cached under the layer id,
//!    and used to bind a loading pipeline for every feature of interest.
//! 4. `destroy` drops the cache entry and tears the layer down.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::CapabilitiesCache;
use crate::deferred::Deferred;
use crate::event::LayerEvent;
use crate::layer::{LayerId, LayerOptions, MapContext, VectorLayer};
use crate::pipeline::{self, FormatOptions, PipelineFactory, SosPipeline};
use crate::sos::{
  foi, Capabilities, CapabilitiesFetcher, CapabilitiesParser, CapabilitiesResponse, HttpTransport,
  SosCapabilitiesParser, Transport,
};

/// Where a layer is in its bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
  /// Constructed, not on a map yet
  Unattached,
  /// Capabilities requested, no response handled yet
  AwaitingCapabilities,
  /// Capabilities cached and pipeline bound
  Bound,
  /// Torn down; the layer can't be reused
  Destroyed,
}

/// Collaborators and options for an [`SosLayer`].
///
/// Anything left unset gets a default: a private cache, a reqwest transport
/// and the fixed-strategy SOS pipeline.
pub struct SosLayerOptions {
  pub layer: LayerOptions,
  pub timeout: Duration,
  cache: Option<CapabilitiesCache>,
  transport: Option<Arc<dyn Transport>>,
  pipeline: Option<Arc<dyn PipelineFactory>>,
  parser: Option<Arc<dyn CapabilitiesParser>>,
}

impl Default for SosLayerOptions {
  fn default() -> Self {
    Self {
      layer: LayerOptions::default(),
      timeout: Duration::from_secs(30),
      cache: None,
      transport: None,
      pipeline: None,
      parser: None,
    }
  }
}

impl SosLayerOptions {
  pub fn with_layer_options(mut self, layer: LayerOptions) -> Self {
    self.layer = layer;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Use `cache` instead of a private one, e.g. [`CapabilitiesCache::shared`].
  pub fn with_cache(mut self, cache: CapabilitiesCache) -> Self {
    self.cache = Some(cache);
    self
  }

  pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
    self.transport = Some(transport);
    self
  }

  pub fn with_pipeline(mut self, pipeline: Arc<dyn PipelineFactory>) -> Self {
    self.pipeline = Some(pipeline);
    self
  }

  pub fn with_parser(mut self, parser: Arc<dyn CapabilitiesParser>) -> Self {
    self.parser = Some(parser);
    self
  }
}

/// Vector layer fed from a Sensor Observation Service
pub struct SosLayer {
  url: String,
  layer: VectorLayer,
  parser: Arc<dyn CapabilitiesParser>,
  cache: CapabilitiesCache,
  fetcher: CapabilitiesFetcher,
  pipeline: Arc<dyn PipelineFactory>,
  pending: Option<Deferred<CapabilitiesResponse>>,
  state: LayerState,
}

impl SosLayer {
  /// Create a layer for the service at `url`.
  ///
  /// ```ignore
  /// let sos = SosLayer::new("Weather stations", "http://myhost/sos?", SosLayerOptions::default())?;
  /// ```
  pub fn new(name: &str, url: &str, options: SosLayerOptions) -> Result<Self> {
    let transport: Arc<dyn Transport> = match options.transport {
      Some(transport) => transport,
      None => Arc::new(HttpTransport::new(options.timeout)?),
    };
    let pipeline: Arc<dyn PipelineFactory> = match options.pipeline {
      Some(pipeline) => pipeline,
      None => Arc::new(SosPipeline::new(Arc::clone(&transport))),
    };
    let parser: Arc<dyn CapabilitiesParser> = match options.parser {
      Some(parser) => parser,
      None => Arc::new(SosCapabilitiesParser),
    };

    Ok(Self {
      url: url.to_string(),
      layer: VectorLayer::with_kind("SosLayer", name, options.layer),
      parser,
      cache: options.cache.unwrap_or_default(),
      fetcher: CapabilitiesFetcher::new(transport),
      pipeline,
      pending: None,
      state: LayerState::Unattached,
    })
  }

  pub fn id(&self) -> &LayerId {
    self.layer.id()
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  pub fn state(&self) -> LayerState {
    self.state
  }

  pub fn layer(&self) -> &VectorLayer {
    &self.layer
  }

  pub fn layer_mut(&mut self) -> &mut VectorLayer {
    &mut self.layer
  }

  pub fn cache(&self) -> &CapabilitiesCache {
    &self.cache
  }

  /// Called once the layer has been added to `map`: signal the load and
  /// request the service capabilities.
  pub fn after_add(&mut self, map: MapContext) -> Result<()> {
    if self.state != LayerState::Unattached {
      warn!(layer = %self.id(), state = ?self.state, "Layer already added, ignoring");
      return Ok(());
    }

    let pending = self.fetcher.request(&self.url)?;
    self.layer.set_map(map);
    self.layer.emit(LayerEvent::LoadStart);
    self.pending = Some(pending);
    self.state = LayerState::AwaitingCapabilities;

    info!(layer = %self.id(), url = %self.url, "Requested capabilities");
    Ok(())
  }

  /// Check for the capabilities response without waiting.
  ///
  /// Returns `true` when a response was handled. Transport and parse
  /// failures are returned as errors and leave the layer unbound.
  pub fn poll(&mut self) -> Result<bool> {
    let Some(result) = self.pending.as_mut().and_then(Deferred::poll) else {
      return Ok(false);
    };
    self.pending = None;
    self.deliver(result)?;
    Ok(true)
  }

  /// Wait for the capabilities response and handle it.
  pub async fn resolve(&mut self) -> Result<()> {
    let Some(mut pending) = self.pending.take() else {
      return Ok(());
    };
    if let Some(result) = pending.wait().await {
      self.deliver(result)?;
    }
    Ok(())
  }

  fn deliver(&mut self, result: Result<CapabilitiesResponse>) -> Result<()> {
    let outcome = result.and_then(|response| self.parse_capabilities(&response));
    if let Err(e) = &outcome {
      warn!(layer = %self.id(), error = %e, "Capabilities bootstrap failed");
      self.layer.emit(LayerEvent::LoadError(e.to_string()));
    }
    outcome
  }

  /// Handle a capabilities response.
  ///
  /// Only the first response for a live layer does anything: it is parsed,
  /// cached and used to bind the loading pipeline. Later responses, and any
  /// response arriving after `destroy`, are ignored.
  pub fn parse_capabilities(&mut self, response: &CapabilitiesResponse) -> Result<()> {
    if self.state == LayerState::Destroyed {
      debug!(layer = %self.id(), "Ignoring capabilities for destroyed layer");
      return Ok(());
    }
    if self.cache.contains(self.id())? {
      debug!(layer = %self.id(), "Capabilities already cached, ignoring response");
      return Ok(());
    }

    let capabilities = self.parser.read_response(response)?;
    self.cache.set(self.id().clone(), capabilities)?;

    let fois = self.features_of_interest()?;
    let format_options = FormatOptions {
      internal_projection: self.layer.map().map(|map| map.projection().clone()),
    };

    let bound = pipeline::bind(
      self.pipeline.as_ref(),
      &mut self.layer,
      &self.url,
      fois,
      format_options,
    );
    if let Err(e) = bound {
      // Without a pipeline the entry must go, or later responses are ignored
      self.cache.delete(self.id())?;
      return Err(e);
    }
    self.state = LayerState::Bound;
    Ok(())
  }

  /// Cached capabilities for this layer, if a response has been handled.
  pub fn capabilities(&self) -> Result<Option<Arc<Capabilities>>> {
    self.cache.get(self.id())
  }

  /// Distinct feature-of-interest ids from the cached capabilities.
  ///
  /// Empty until capabilities have been cached.
  pub fn features_of_interest(&self) -> Result<Vec<String>> {
    Ok(
      self
        .capabilities()?
        .map(|capabilities| foi::extract(&capabilities))
        .unwrap_or_default(),
    )
  }

  /// Drop the cached capabilities and tear down the layer.
  ///
  /// An in-flight capabilities request is not cancelled, but its response
  /// is discarded.
  pub fn destroy(&mut self) -> Result<()> {
    if self.state == LayerState::Destroyed {
      return Ok(());
    }

    self.cache.delete(self.id())?;
    self.pending = None;
    self.state = LayerState::Destroyed;
    self.layer.destroy()
  }
}

impl std::fmt::Debug for SosLayer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SosLayer")
      .field("url", &self.url)
      .field("layer", &self.layer)
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}
