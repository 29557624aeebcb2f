//! Wires a strategy and protocol onto a layer and starts loading.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{info, warn};

use super::protocol::{FetchProtocol, FormatOptions, ProtocolConfig, SosProtocol};
use super::strategy::{FixedStrategy, LoadingStrategy, StrategyConfig};
use crate::layer::VectorLayer;
use crate::sos::Transport;

/// Builds the collaborators of a loading pipeline.
pub trait PipelineFactory: Send + Sync {
  fn strategy(&self, config: StrategyConfig) -> Box<dyn LoadingStrategy>;

  fn protocol(&self, config: ProtocolConfig) -> Arc<dyn FetchProtocol>;
}

/// Default pipeline: load once with [`FixedStrategy`] through [`SosProtocol`].
pub struct SosPipeline {
  transport: Arc<dyn Transport>,
}

impl SosPipeline {
  pub fn new(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }
}

impl PipelineFactory for SosPipeline {
  fn strategy(&self, config: StrategyConfig) -> Box<dyn LoadingStrategy> {
    Box::new(FixedStrategy::new(config))
  }

  fn protocol(&self, config: ProtocolConfig) -> Arc<dyn FetchProtocol> {
    Arc::new(SosProtocol::new(Arc::clone(&self.transport), config))
  }
}

/// Bind a new pipeline to `layer` and activate it.
///
/// The strategy is told not to emit `LoadStart` since the layer signals that
/// itself when it starts bootstrapping. Callers must make sure this runs at
/// most once per layer.
///
/// Fails if the strategy refuses to activate; the strategy is not kept.
pub fn bind(
  factory: &dyn PipelineFactory,
  layer: &mut VectorLayer,
  url: &str,
  fois: Vec<String>,
  format_options: FormatOptions,
) -> Result<()> {
  let mut strategy = factory.strategy(StrategyConfig {
    suppress_load_start: true,
  });
  strategy.set_layer(layer.handle());

  let foi_count = fois.len();
  let protocol = factory.protocol(ProtocolConfig {
    format_options,
    url: url.to_string(),
    fois,
  });
  layer.set_protocol(protocol)?;

  if !strategy.activate() {
    warn!(layer = %layer.id(), url, "Loading strategy refused to activate");
    return Err(eyre!("Loading strategy for {} could not be activated", layer.id()));
  }
  layer.add_strategy(strategy);

  info!(layer = %layer.id(), url, fois = foi_count, "Pipeline bound");
  Ok(())
}
