use anyhow::{Context, Result};
use clap::Parser;
use iconpack::Compression;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "iconize.yaml";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub address: SocketAddr,
    pub max_upload_bytes: usize,
    pub compression: Compression,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            compression: Compression::default(),
            parallel: true,
        }
    }
}

impl Config {
    /// Reads a yaml config file. A missing file yields the defaults.
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_raw(RawConfig::parse(path)?, None)
    }

    /// `port` is the value of the `PORT` environment variable, used when the
    /// config doesn't name an address.
    fn from_raw(config: RawConfig, port: Option<&str>) -> Result<Self> {
        let default = Self::default();
        let address = match (config.address, port) {
            (Some(address), _) => address,
            (None, Some(port)) => {
                let port: u16 = port.parse().with_context(|| format!("invalid PORT {}", port))?;
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
            }
            (None, None) => default.address,
        };
        Ok(Self {
            address,
            max_upload_bytes: config.max_upload_bytes.unwrap_or(default.max_upload_bytes),
            compression: config.compression.unwrap_or(default.compression),
            parallel: config.parallel.unwrap_or(default.parallel),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    address: Option<SocketAddr>,
    max_upload_bytes: Option<usize>,
    compression: Option<Compression>,
    parallel: Option<bool>,
}

impl RawConfig {
    fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Default::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Clone, Debug, Default, Parser)]
pub struct ServeArgs {
    /// Path to a yaml config file, defaults to `iconize.yaml` when present
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Address to listen on
    #[clap(long, env = "ICONIZE_ADDR")]
    pub address: Option<SocketAddr>,
    /// Largest accepted upload in bytes
    #[clap(long)]
    pub max_upload_bytes: Option<usize>,
    /// Compression of the archive entries: stored or deflated
    #[clap(long)]
    pub compression: Option<Compression>,
    /// Render the icons one after another instead of in parallel
    #[clap(long)]
    pub sequential: bool,
}

impl ServeArgs {
    pub fn config(&self) -> Result<Config> {
        let raw = match &self.config {
            Some(path) => {
                anyhow::ensure!(path.exists(), "config {} not found", path.display());
                RawConfig::parse(path)?
            }
            None => RawConfig::parse(DEFAULT_CONFIG)?,
        };
        let port = std::env::var("PORT").ok();
        let config = Config::from_raw(raw, port.as_deref())?;
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(max_upload_bytes) = self.max_upload_bytes {
            config.max_upload_bytes = max_upload_bytes;
        }
        if let Some(compression) = self.compression {
            config.compression = compression;
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}
