pub mod client;
pub mod foi;
pub mod parser;
pub mod types;
pub(crate) mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

pub use client::{CapabilitiesFetcher, CapabilitiesResponse, HttpTransport, ResponseBody, Transport};
pub use parser::{CapabilitiesParser, SosCapabilitiesParser};
pub use types::{Capabilities, Feature, Offering, Point, Projection};
