//! Loading strategies decide when a layer asks its protocol for data.

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::event::LayerEvent;
use crate::layer::LayerHandle;

/// Options a strategy is constructed with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyConfig {
  /// Don't emit `LoadStart` when a load begins; the caller already did.
  pub suppress_load_start: bool,
}

/// Drives loads from a layer's protocol into the layer.
pub trait LoadingStrategy: Send {
  fn set_layer(&mut self, layer: LayerHandle);

  /// Start loading. Returns `false` if the strategy was already active,
  /// has no layer to load into or can't start its load.
  fn activate(&mut self) -> bool;

  /// Stop loading. Returns `false` if the strategy was not active.
  fn deactivate(&mut self) -> bool;

  fn is_active(&self) -> bool;
}

/// Loads all features once, when activated.
#[derive(Default)]
pub struct FixedStrategy {
  config: StrategyConfig,
  layer: Option<LayerHandle>,
  task: Option<JoinHandle<()>>,
}

impl FixedStrategy {
  pub fn new(config: StrategyConfig) -> Self {
    Self {
      config,
      layer: None,
      task: None,
    }
  }

}

impl LoadingStrategy for FixedStrategy {
  fn set_layer(&mut self, layer: LayerHandle) {
    self.layer = Some(layer);
  }

  fn activate(&mut self) -> bool {
    if self.task.is_some() {
      return false;
    }
    let Some(layer) = self.layer.clone() else {
      warn!("Fixed strategy activated without a layer");
      return false;
    };
    let Ok(runtime) = Handle::try_current() else {
      warn!(layer = %layer.id(), "Fixed strategy activated outside an async runtime");
      return false;
    };

    self.task = Some(runtime.spawn(load(layer, self.config.suppress_load_start)));
    true
  }

  fn deactivate(&mut self) -> bool {
    match self.task.take() {
      Some(task) => {
        task.abort();
        true
      }
      None => false,
    }
  }

  fn is_active(&self) -> bool {
    self.task.is_some()
  }
}

async fn load(layer: LayerHandle, suppress_load_start: bool) {
  if !suppress_load_start {
    layer.emit(LayerEvent::LoadStart);
  }

  let protocol = match layer.protocol() {
    Ok(Some(protocol)) => protocol,
    Ok(None) => {
      warn!(layer = %layer.id(), "No protocol assigned, nothing to load");
      layer.emit(LayerEvent::LoadError("No protocol assigned".to_string()));
      return;
    }
    Err(e) => {
      layer.emit(LayerEvent::LoadError(e.to_string()));
      return;
    }
  };

  match protocol.read().await.and_then(|features| layer.add_features(features)) {
    Ok(count) => {
      info!(layer = %layer.id(), count, "Features loaded");
      layer.emit(LayerEvent::LoadEnd { features: count });
    }
    Err(e) => {
      warn!(layer = %layer.id(), error = %e, "Loading features failed");
      layer.emit(LayerEvent::LoadError(e.to_string()));
    }
  }
}
