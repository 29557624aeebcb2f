//! Map layers bootstrapped from Sensor Observation Service capabilities.
//!
//! An [`SosLayer`] fetches a service's GetCapabilities document once, caches
//! the parsed result under its layer id, collects the distinct features of
//! interest and binds a loading strategy and fetch protocol that stream those
//! features into its vector layer.

pub mod cache;
pub mod config;
pub mod controller;
pub mod deferred;
pub mod event;
pub mod layer;
pub mod logging;
pub mod pipeline;
pub mod sos;

pub use cache::CapabilitiesCache;
pub use controller::{LayerState, SosLayer, SosLayerOptions};
pub use event::{LayerEvent, LayerEvents};
pub use layer::{LayerId, LayerOptions, MapContext, VectorLayer};
