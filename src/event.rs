use tokio::sync::mpsc;

/// Notifications emitted by a vector layer
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
  /// A load of layer data has started
  LoadStart,
  /// A load finished and this many features were added
  LoadEnd { features: usize },
  /// Features were appended to the layer's store
  FeaturesAdded(usize),
  /// A capabilities or feature request failed
  LoadError(String),
  /// The layer was torn down
  Destroyed,
}

pub type EventSender = mpsc::UnboundedSender<LayerEvent>;

/// Receiving side of a layer's event channel
#[derive(Debug)]
pub struct LayerEvents {
  rx: mpsc::UnboundedReceiver<LayerEvent>,
}

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, LayerEvents) {
  let (tx, rx) = mpsc::unbounded_channel();
  (tx, LayerEvents { rx })
}

impl LayerEvents {
  /// Receive the next event
  pub async fn next(&mut self) -> Option<LayerEvent> {
    self.rx.recv().await
  }

  /// Receive an already queued event without waiting
  pub fn try_next(&mut self) -> Option<LayerEvent> {
    self.rx.try_recv().ok()
  }

  /// Drain everything queued so far
  pub fn drain(&mut self) -> Vec<LayerEvent> {
    std::iter::from_fn(|| self.try_next()).collect()
  }
}
