//! Feature-of-interest extraction from parsed capabilities.

use super::types::Capabilities;

/// Collect the distinct feature-of-interest ids advertised by all offerings.
///
/// Ids keep the order in which they are first seen, walking offerings and
/// their ids in document order. Capability documents list tens to a few
/// hundred ids, so a linear membership check is enough.
pub fn extract(capabilities: &Capabilities) -> Vec<String> {
  let mut result: Vec<String> = Vec::new();

  for offering in &capabilities.contents.offering_list {
    for foi in &offering.feature_of_interest_ids {
      if !result.contains(foi) {
        result.push(foi.clone());
      }
    }
  }

  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sos::types::{Contents, Offering};

  fn capabilities(offerings: &[&[&str]]) -> Capabilities {
    Capabilities {
      contents: Contents {
        offering_list: offerings
          .iter()
          .enumerate()
          .map(|(i, fois)| Offering {
            id: format!("offering-{}", i),
            feature_of_interest_ids: fois.iter().map(|s| s.to_string()).collect(),
            ..Offering::default()
          })
          .collect(),
      },
      ..Capabilities::default()
    }
  }

  #[test]
  fn test_dedup_keeps_first_seen_order() {
    let caps = capabilities(&[&["a", "b"], &["b", "c"]]);
    assert_eq!(extract(&caps), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_duplicates_within_one_offering() {
    let caps = capabilities(&[&["b", "a", "b"], &["a"]]);
    assert_eq!(extract(&caps), vec!["b", "a"]);
  }

  #[test]
  fn test_empty_offering() {
    assert!(extract(&capabilities(&[&[]])).is_empty());
  }

  #[test]
  fn test_no_offerings() {
    assert!(extract(&Capabilities::default()).is_empty());
  }

  #[test]
  fn test_deterministic() {
    let caps = capabilities(&[&["z", "y"], &["x", "z"], &["w"]]);
    assert_eq!(extract(&caps), extract(&caps));
    assert_eq!(extract(&caps), vec!["z", "y", "x", "w"]);
  }
}
