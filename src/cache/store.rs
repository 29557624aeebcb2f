//! Capabilities cache keyed by layer id.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::layer::LayerId;
use crate::sos::Capabilities;

/// A parsed capabilities document and when it was stored.
#[derive(Debug, Clone)]
pub struct CachedCapabilities {
  pub capabilities: Arc<Capabilities>,
  pub cached_at: DateTime<Utc>,
}

/// Store of parsed capabilities, one entry per layer.
///
/// Clones share the same underlying map. A layer owns its entry from the
/// first parsed response until it is destroyed; there is no eviction.
#[derive(Debug, Clone, Default)]
pub struct CapabilitiesCache {
  entries: Arc<Mutex<HashMap<LayerId, CachedCapabilities>>>,
}

impl CapabilitiesCache {
  /// Create a cache private to whoever holds it.
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide cache, for hosts that want layers to share one store.
  pub fn shared() -> Self {
    static SHARED: OnceLock<CapabilitiesCache> = OnceLock::new();
    SHARED.get_or_init(CapabilitiesCache::new).clone()
  }

  fn entries(&self) -> Result<MutexGuard<'_, HashMap<LayerId, CachedCapabilities>>> {
    self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  pub fn get(&self, id: &LayerId) -> Result<Option<Arc<Capabilities>>> {
    Ok(self.entries()?.get(id).map(|e| Arc::clone(&e.capabilities)))
  }

  /// Get the entry including its timestamp.
  pub fn entry(&self, id: &LayerId) -> Result<Option<CachedCapabilities>> {
    Ok(self.entries()?.get(id).cloned())
  }

  /// Store capabilities for `id`, replacing any previous entry.
  pub fn set(&self, id: LayerId, capabilities: Capabilities) -> Result<Arc<Capabilities>> {
    let capabilities = Arc::new(capabilities);
    self.entries()?.insert(
      id,
      CachedCapabilities {
        capabilities: Arc::clone(&capabilities),
        cached_at: Utc::now(),
      },
    );
    Ok(capabilities)
  }

  /// Remove the entry for `id`. Returns whether one was present.
  pub fn delete(&self, id: &LayerId) -> Result<bool> {
    Ok(self.entries()?.remove(id).is_some())
  }

  pub fn contains(&self, id: &LayerId) -> Result<bool> {
    Ok(self.entries()?.contains_key(id))
  }

  pub fn len(&self) -> Result<usize> {
    Ok(self.entries()?.len())
  }

  pub fn is_empty(&self) -> Result<bool> {
    Ok(self.entries()?.is_empty())
  }
}
