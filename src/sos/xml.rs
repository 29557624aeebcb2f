//! Small helpers over quick-xml shared by the capabilities and feature readers.

use color_eyre::{eyre::eyre, Result};
use quick_xml::events::{BytesStart, BytesText};

/// Element name without its namespace prefix
pub fn local_name(element: &BytesStart<'_>) -> String {
  String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Look up an attribute by local name, ignoring its prefix (`gml:id`, `xlink:href`).
pub fn attribute(element: &BytesStart<'_>, local: &str) -> Result<Option<String>> {
  for attr in element.attributes() {
    let attr = attr.map_err(|e| eyre!("Malformed XML attribute: {}", e))?;
    if attr.key.local_name().as_ref() == local.as_bytes() {
      let value = attr
        .unescape_value()
        .map_err(|e| eyre!("Malformed XML attribute value: {}", e))?;
      return Ok(Some(value.into_owned()));
    }
  }
  Ok(None)
}

pub fn text(text: &BytesText<'_>) -> Result<String> {
  text
    .unescape()
    .map(|t| t.into_owned())
    .map_err(|e| eyre!("Malformed XML text: {}", e))
}
