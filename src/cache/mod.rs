//! Capabilities caching.
//!
//! Each layer stores its parsed capabilities under its own id. The entry
//! doubles as the "already bootstrapped" marker: a layer whose id is present
//! has bound its loading pipeline and ignores further responses.

mod store;

pub use store::{CachedCapabilities, CapabilitiesCache};
