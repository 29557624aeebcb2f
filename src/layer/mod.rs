//! In-memory vector layer that hosts loaded features.
//!
//! The layer is split in two halves: `VectorLayer` is owned by whoever put
//! the layer on a map, while `LayerHandle` is a cheap clone handed to loading
//! strategies so they can push features in from spawned tasks.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::event::{self, EventSender, LayerEvent, LayerEvents};
use crate::pipeline::{FetchProtocol, LoadingStrategy};
use crate::sos::{Feature, Projection};

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier unique to one layer instance for the life of the process
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(String);

impl LayerId {
  /// Allocate the next identifier for a layer of the given kind.
  pub fn next(kind: &str) -> Self {
    let n = NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed);
    Self(format!("{}_{}", kind, n))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for LayerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Extra options tagged onto a layer by its host
#[derive(Debug, Clone, Deserialize)]
pub struct LayerOptions {
  #[serde(default = "default_visibility")]
  pub visibility: bool,
  pub attribution: Option<String>,
}

fn default_visibility() -> bool {
  true
}

impl Default for LayerOptions {
  fn default() -> Self {
    Self {
      visibility: true,
      attribution: None,
    }
  }
}

/// The map a layer has been added to
#[derive(Debug, Clone, PartialEq)]
pub struct MapContext {
  projection: Projection,
}

impl MapContext {
  pub fn new(projection: Projection) -> Self {
    Self { projection }
  }

  pub fn projection(&self) -> &Projection {
    &self.projection
  }
}

struct LayerShared {
  features: Mutex<Vec<Feature>>,
  protocol: Mutex<Option<Arc<dyn FetchProtocol>>>,
  events: EventSender,
}

/// Shared access to a layer's feature store, protocol and event channel
#[derive(Clone)]
pub struct LayerHandle {
  id: LayerId,
  shared: Arc<LayerShared>,
}

impl LayerHandle {
  pub fn id(&self) -> &LayerId {
    &self.id
  }

  /// The protocol currently assigned to the layer
  pub fn protocol(&self) -> Result<Option<Arc<dyn FetchProtocol>>> {
    let protocol = self
      .shared
      .protocol
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(protocol.clone())
  }

  /// Append features to the layer, returning how many were added.
  ///
  /// Emits `FeaturesAdded` unless `features` is empty.
  pub fn add_features(&self, features: Vec<Feature>) -> Result<usize> {
    let count = features.len();
    {
      let mut store = self
        .shared
        .features
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;
      store.extend(features);
      debug!(layer = %self.id, count, total = store.len(), "Added features");
    }

    if count > 0 {
      self.emit(LayerEvent::FeaturesAdded(count));
    }
    Ok(count)
  }

  pub fn emit(&self, event: LayerEvent) {
    // Ignore send errors - nobody may be listening
    let _ = self.shared.events.send(event);
  }
}

/// Vector layer storing rendered features
pub struct VectorLayer {
  id: LayerId,
  name: String,
  options: LayerOptions,
  map: Option<MapContext>,
  strategies: Vec<Box<dyn LoadingStrategy>>,
  shared: Arc<LayerShared>,
  events: Option<LayerEvents>,
}

impl VectorLayer {
  pub fn new(name: &str, options: LayerOptions) -> Self {
    Self::with_kind("VectorLayer", name, options)
  }

  /// Create a layer whose id is prefixed with `kind` (e.g. `SosLayer_3`).
  pub fn with_kind(kind: &str, name: &str, options: LayerOptions) -> Self {
    let (tx, rx) = event::channel();

    Self {
      id: LayerId::next(kind),
      name: name.to_string(),
      options,
      map: None,
      strategies: Vec::new(),
      shared: Arc::new(LayerShared {
        features: Mutex::new(Vec::new()),
        protocol: Mutex::new(None),
        events: tx,
      }),
      events: Some(rx),
    }
  }

  pub fn id(&self) -> &LayerId {
    &self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn options(&self) -> &LayerOptions {
    &self.options
  }

  pub fn map(&self) -> Option<&MapContext> {
    self.map.as_ref()
  }

  pub fn set_map(&mut self, map: MapContext) {
    self.map = Some(map);
  }

  pub fn handle(&self) -> LayerHandle {
    LayerHandle {
      id: self.id.clone(),
      shared: Arc::clone(&self.shared),
    }
  }

  /// Take the receiving end of the event channel. Only the first call
  /// returns `Some`.
  pub fn take_events(&mut self) -> Option<LayerEvents> {
    self.events.take()
  }

  pub fn emit(&self, event: LayerEvent) {
    let _ = self.shared.events.send(event);
  }

  /// Snapshot of the features loaded so far
  pub fn features(&self) -> Result<Vec<Feature>> {
    let features = self
      .shared
      .features
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(features.clone())
  }

  pub fn protocol(&self) -> Result<Option<Arc<dyn FetchProtocol>>> {
    self.handle().protocol()
  }

  pub fn set_protocol(&mut self, protocol: Arc<dyn FetchProtocol>) -> Result<()> {
    let mut slot = self
      .shared
      .protocol
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *slot = Some(protocol);
    Ok(())
  }

  pub fn add_strategy(&mut self, strategy: Box<dyn LoadingStrategy>) {
    self.strategies.push(strategy);
  }

  pub fn strategies(&self) -> &[Box<dyn LoadingStrategy>] {
    &self.strategies
  }

  /// Deactivate strategies and release features, protocol and map.
  pub fn destroy(&mut self) -> Result<()> {
    for strategy in &mut self.strategies {
      strategy.deactivate();
    }
    self.strategies.clear();

    self
      .shared
      .features
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?
      .clear();
    *self
      .shared
      .protocol
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))? = None;
    self.map = None;

    debug!(layer = %self.id, name = %self.name, "Layer destroyed");
    self.emit(LayerEvent::Destroyed);
    Ok(())
  }
}

impl fmt::Debug for VectorLayer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("VectorLayer")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("options", &self.options)
      .field("map", &self.map)
      .field("strategies", &self.strategies.len())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sos::Point;

  fn feature(id: &str) -> Feature {
    Feature {
      id: id.to_string(),
      name: None,
      geometry: Some(Point { x: 1.0, y: 2.0 }),
      projection: None,
    }
  }

  #[test]
  fn test_ids_are_unique() {
    let a = VectorLayer::new("a", LayerOptions::default());
    let b = VectorLayer::new("a", LayerOptions::default());
    assert_ne!(a.id(), b.id());
    assert!(a.id().as_str().starts_with("VectorLayer_"));
  }

  #[test]
  fn test_handle_adds_features() {
    let mut layer = VectorLayer::new("stations", LayerOptions::default());
    let mut events = layer.take_events().unwrap();
    let handle = layer.handle();

    assert_eq!(handle.add_features(vec![feature("a"), feature("b")]).unwrap(), 2);
    assert_eq!(handle.add_features(Vec::new()).unwrap(), 0);

    assert_eq!(layer.features().unwrap().len(), 2);
    assert_eq!(events.drain(), vec![LayerEvent::FeaturesAdded(2)]);
  }

  #[test]
  fn test_destroy_clears_and_notifies() {
    let mut layer = VectorLayer::new("stations", LayerOptions::default());
    let mut events = layer.take_events().unwrap();
    layer.set_map(MapContext::new(Projection::default()));
    layer.handle().add_features(vec![feature("a")]).unwrap();

    layer.destroy().unwrap();

    assert!(layer.features().unwrap().is_empty());
    assert!(layer.map().is_none());
    assert!(layer.protocol().unwrap().is_none());
    assert_eq!(
      events.drain(),
      vec![LayerEvent::FeaturesAdded(1), LayerEvent::Destroyed]
    );
  }

  #[test]
  fn test_events_taken_once() {
    let mut layer = VectorLayer::new("stations", LayerOptions::default());
    assert!(layer.take_events().is_some());
    assert!(layer.take_events().is_none());
  }
}
