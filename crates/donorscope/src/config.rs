//! Configuration management for donorscope.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::donor::Coordinates;
use crate::error::{Error, Result};
use crate::geo::{RegionTable, Viewport};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "donorscope";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DONORSCOPE_`, sections split on `__`)
/// 2. TOML config file at `~/.config/donorscope/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Donor source configuration.
    pub source: SourceConfig,
    /// Map viewport configuration.
    pub map: MapConfig,
}

/// Where donors are loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// HTTP(S) endpoint returning a JSON array of donors.
    pub url: Option<String>,
    /// Local JSON file; takes precedence over `url`.
    pub file: Option<PathBuf>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Map viewport defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Global default center as `[latitude, longitude]`.
    pub default_center: [f64; 2],
    /// Global default zoom.
    pub default_zoom: u8,
    /// Zoom used to frame donors when every city is selected.
    pub coarse_zoom: u8,
    /// Zoom used to frame donors of a single city.
    pub fine_zoom: u8,
    /// Per-city default viewports.
    pub regions: BTreeMap<String, RegionConfig>,
}

/// Default viewport of one named region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Center as `[latitude, longitude]`.
    pub center: [f64; 2],
    /// Zoom level.
    pub zoom: u8,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        let table = RegionTable::default();
        let regions = table
            .region_names()
            .filter_map(|name| {
                table
                    .region(name)
                    .map(|viewport| (name.to_string(), RegionConfig::from(viewport)))
            })
            .collect();
        let global = table.global();
        Self {
            default_center: [global.center().latitude(), global.center().longitude()],
            default_zoom: global.zoom(),
            coarse_zoom: 7,
            fine_zoom: 13,
            regions,
        }
    }
}

impl From<Viewport> for RegionConfig {
    fn from(viewport: Viewport) -> Self {
        let center = viewport.center();
        Self {
            center: [center.latitude(), center.longitude()],
            zoom: viewport.zoom(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("DONORSCOPE_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.source.timeout_secs == 0 {
            return Err(Error::config_validation(
                "source.timeout_secs must be greater than 0",
            ));
        }

        if let Some(url) = &self.source.url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| Error::config_validation(format!("invalid source.url '{url}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::config_validation(format!(
                    "source.url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        // Building the table checks every center and zoom.
        self.region_table().map(|_| ())
    }

    /// Build the viewport table described by the map section.
    ///
    /// # Errors
    ///
    /// Returns an error if a center is out of range or a zoom is zero.
    pub fn region_table(&self) -> Result<RegionTable> {
        let map = &self.map;
        let global = viewport_from("map.default_center", map.default_center, map.default_zoom)?;
        let mut table = RegionTable::new(global, map.coarse_zoom, map.fine_zoom)
            .map_err(|e| Error::config_validation(e.to_string()))?;
        for (name, region) in &map.regions {
            let viewport = viewport_from(&format!("map.regions.{name}"), region.center, region.zoom)?;
            table = table.with_region(name.clone(), viewport);
        }
        Ok(table)
    }
}

fn viewport_from(field: &str, center: [f64; 2], zoom: u8) -> Result<Viewport> {
    let [latitude, longitude] = center;
    let center = Coordinates::new(latitude, longitude).ok_or_else(|| {
        Error::config_validation(format!(
            "{field}: [{latitude}, {longitude}] is not a valid latitude/longitude"
        ))
    })?;
    Viewport::new(center, zoom).map_err(|e| Error::config_validation(format!("{field}: {e}")))
}
