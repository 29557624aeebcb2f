use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use sos_layer::config::Config;
use sos_layer::{logging, LayerEvent, LayerState, MapContext, SosLayer, SosLayerOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sos-layer")]
#[command(about = "Load the features of interest of a Sensor Observation Service")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/sos-layer/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Service URL, overrides the config file
  #[arg(short, long)]
  url: Option<String>,

  /// Layer name
  #[arg(short, long)]
  name: Option<String>,

  /// Print features as JSON
  #[arg(long)]
  json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // A bare --url works without any config file
  let mut config = match (&args.config, &args.url) {
    (None, Some(url)) => Config::discover()?.unwrap_or_else(|| Config::for_url(url)),
    _ => Config::load(args.config.as_deref())?,
  };
  if let Some(url) = args.url {
    config.service.url = url;
  }
  if let Some(name) = args.name {
    config.service.name = name;
  }

  let _log_guard = logging::init(&config.log)?;

  let options = SosLayerOptions::default()
    .with_layer_options(config.service.layer.clone())
    .with_timeout(config.http.timeout());
  let mut layer = SosLayer::new(&config.service.name, &config.service.url, options)?;
  let mut events = layer
    .layer_mut()
    .take_events()
    .ok_or_else(|| eyre!("Layer events already taken"))?;

  layer.after_add(MapContext::new(config.map.projection.clone()))?;
  layer.resolve().await?;

  if layer.state() != LayerState::Bound {
    return Err(eyre!("Layer was not bound to {}", config.service.url));
  }
  if let Some(capabilities) = layer.capabilities()? {
    info!(
      version = %capabilities.version,
      offerings = capabilities.contents.offering_list.len(),
      fois = layer.features_of_interest()?.len(),
      "Capabilities loaded"
    );
  }

  while let Some(event) = events.next().await {
    match event {
      LayerEvent::LoadStart => info!("Loading features"),
      LayerEvent::FeaturesAdded(count) => info!(count, "Features added"),
      LayerEvent::LoadEnd { features } => {
        info!(features, "Loading finished");
        break;
      }
      LayerEvent::LoadError(message) => {
        layer.destroy()?;
        return Err(eyre!("Loading features failed: {}", message));
      }
      LayerEvent::Destroyed => break,
    }
  }

  let features = layer.layer().features()?;
  if args.json {
    println!("{}", serde_json::to_string_pretty(&features)?);
  } else {
    for feature in &features {
      let geometry = feature
        .geometry
        .map(|g| g.to_string())
        .unwrap_or_else(|| "-".to_string());
      println!(
        "{}\t{}\t{}",
        feature.id,
        feature.name.as_deref().unwrap_or("-"),
        geometry
      );
    }
  }

  layer.destroy()?;
  Ok(())
}
