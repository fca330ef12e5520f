use crate::adapter::{ExecutionLimits, PackageSettings};
use crate::geo::{BoundingBox, Location};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TesterConfig {
    /// Adapter selected at startup; falls back to the first registered
    pub default_adapter: Option<String>,
    pub server: ServerConfig,
    pub selection: SelectionConfig,
    pub limits: ExecutionLimits,
    pub packages: PackageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory with the browser UI build, served as fallback
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8787, static_dir: None }
    }
}

/// Initial map selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub center_lat: f64,
    pub center_lng: f64,
    /// Degrees from the center to each edge
    pub half_extent: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            center_lat: 51.50093,
            center_lng: -0.12411,
            half_extent: 0.005,
        }
    }
}

impl SelectionConfig {
    pub fn bounding_box(&self) -> crate::Result<BoundingBox> {
        let bbox = BoundingBox::around(Location::new(self.center_lat, self.center_lng), self.half_extent);
        bbox.validate()?;
        Ok(bbox)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("extension-tester.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TesterConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(crate::Error::Io)?;
    let config: TesterConfig = toml::from_str(&contents)
        .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TesterConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).map_err(crate::Error::Io)?;
    Ok(())
}
