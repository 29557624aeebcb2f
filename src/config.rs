use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::layer::LayerOptions;
use crate::sos::Projection;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub service: ServiceConfig,
  #[serde(default)]
  pub map: MapConfig,
  #[serde(default)]
  pub http: HttpConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Base URL of the Sensor Observation Service
  pub url: String,
  /// Layer name (defaults to "SOS")
  #[serde(default = "default_layer_name")]
  pub name: String,
  #[serde(default)]
  pub layer: LayerOptions,
}

fn default_layer_name() -> String {
  "SOS".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapConfig {
  /// Projection of the map the layer is added to
  #[serde(default)]
  pub projection: Projection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  30
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl HttpConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter used when RUST_LOG is not set
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write logs to this file (rotated daily) instead of stderr
  pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sos-layer.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sos-layer/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match Self::load_found(path.as_deref())? {
      Some(config) => Ok(config),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/sos-layer/config.yaml\n\
                 or pass the service URL with --url."
      )),
    }
  }

  /// Load the first config file in the search order, if there is one.
  ///
  /// A file that exists but can't be read or parsed is still an error.
  pub fn discover() -> Result<Option<Self>> {
    Self::load_found(Self::find_config_file().as_deref())
  }

  fn load_found(path: Option<&Path>) -> Result<Option<Self>> {
    path.map(Self::load_from_path).transpose()
  }

  /// Configuration for a single service URL with everything else defaulted.
  pub fn for_url(url: &str) -> Self {
    Self {
      service: ServiceConfig {
        url: url.to_string(),
        name: default_layer_name(),
        layer: LayerOptions::default(),
      },
      map: MapConfig::default(),
      http: HttpConfig::default(),
      log: LogConfig::default(),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("sos-layer.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sos-layer").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_defaults() {
    let config = Config::from_yaml("service:\n  url: http://host/sos\n").unwrap();

    assert_eq!(config.service.url, "http://host/sos");
    assert_eq!(config.service.name, "SOS");
    assert!(config.service.layer.visibility);
    assert_eq!(config.map.projection, Projection::new("EPSG:4326"));
    assert_eq!(config.http.timeout(), Duration::from_secs(30));
    assert_eq!(config.log.level, "info");
    assert!(config.log.file.is_none());
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
service:
  url: http://host/sos?
  name: Weather stations
  layer:
    visibility: false
    attribution: Met office
map:
  projection: EPSG:3857
http:
  timeout_secs: 5
log:
  level: debug
  file: /tmp/sos-layer.log
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.service.name, "Weather stations");
    assert!(!config.service.layer.visibility);
    assert_eq!(config.service.layer.attribution.as_deref(), Some("Met office"));
    assert_eq!(config.map.projection, Projection::new("EPSG:3857"));
    assert_eq!(config.http.timeout(), Duration::from_secs(5));
    assert_eq!(config.log.file, Some(PathBuf::from("/tmp/sos-layer.log")));
  }

  #[test]
  fn test_missing_service_url_is_error() {
    assert!(Config::from_yaml("map:\n  projection: EPSG:4326\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let err = Config::load(Some(Path::new("/nonexistent/sos-layer.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_no_config_file_found() {
    assert!(Config::load_found(None).unwrap().is_none());
  }

  #[test]
  fn test_broken_config_file_is_error() {
    let path = std::env::temp_dir().join(format!("sos-layer-broken-{}.yaml", std::process::id()));
    std::fs::write(&path, "service: [unterminated\n").unwrap();

    let result = Config::load_found(Some(&path));
    std::fs::remove_file(&path).unwrap();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
  }
}
