extern crate log;
pub mod click;
pub mod feature;
pub mod geofile;
pub mod grouping;
pub mod hittest;
pub mod popup;
pub mod viewport;
use crate::click::arbitration::MapSession;
use crate::geofile::geojson::read_features_from_geojson;
use crate::hittest::geometry::HitTolerance;
use crate::popup::host::{PopupHost, TabSwitch};
use crate::viewport::transform::LinearViewport;
use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::{fs::read_to_string, path::Path};

/// Replay configured clicks against a GeoJSON feature set and report the
/// popups they would open.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: String,
}

#[derive(Deserialize, Debug)]
struct ViewportConfig {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    width_px: f64,
    height_px: f64,
}

#[derive(Deserialize, Debug)]
struct ClickConfig {
    lon: f64,
    lat: f64,
}

#[derive(Deserialize, Debug)]
struct Config {
    feature_geojson_path: PathBuf,
    viewport: ViewportConfig,
    tolerance_px: Option<f64>,
    clicks: Vec<ClickConfig>,
}

/// Popup host that reports popups on the console instead of mounting DOM.
#[derive(Default)]
struct ConsolePopupHost {
    open_markup: Option<String>,
}

impl PopupHost for ConsolePopupHost {
    fn open(&mut self, anchor: geo::Coord, markup: &str) {
        log::info!("Popup at ({:.6}, {:.6}):\n{}", anchor.x, anchor.y, markup);
        self.open_markup = Some(markup.to_string());
    }

    fn close(&mut self) {
        if self.open_markup.take().is_some() {
            log::debug!("Closed previous popup");
        }
    }

    fn apply_tab_switch(&mut self, switch: &TabSwitch) {
        log::info!("Active tab is now '{}'", switch.activate_key);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    if !Path::new(&args.config_filepath).exists() {
        return Err(anyhow!("Config file {} not found", &args.config_filepath));
    }
    let config_contents = read_to_string(args.config_filepath)?;
    let config: Config = serde_yaml::from_str(&config_contents)?;

    let viewport = LinearViewport::new(
        geo::Rect::new(
            geo::coord! { x: config.viewport.west, y: config.viewport.south },
            geo::coord! { x: config.viewport.east, y: config.viewport.north },
        ),
        config.viewport.width_px,
        config.viewport.height_px,
    )?;

    let features = read_features_from_geojson(&config.feature_geojson_path)?;
    log::info!("Read {} features", features.len());

    let tolerance = config
        .tolerance_px
        .map(|pixels| HitTolerance { pixels })
        .unwrap_or_default();
    let mut session =
        MapSession::new(viewport, ConsolePopupHost::default()).with_tolerance(tolerance);
    session.replace_registry(features);

    for click in &config.clicks {
        log::info!("Click at ({}, {})", click.lon, click.lat);
        session.on_map_click(geo::coord! { x: click.lon, y: click.lat });
        // The console host mounts synchronously, so the mount signal follows
        // immediately.
        session.on_popup_mounted();
    }
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
