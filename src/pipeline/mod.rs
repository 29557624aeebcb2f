//! Data-loading pipeline: a loading strategy bound to a fetch protocol.

pub mod binder;
pub mod protocol;
pub mod strategy;

pub use binder::{bind, PipelineFactory, SosPipeline};
pub use protocol::{FetchProtocol, FormatOptions, ProtocolConfig, SosProtocol};
pub use strategy::{FixedStrategy, LoadingStrategy, StrategyConfig};
