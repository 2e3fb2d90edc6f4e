//! Application configuration
//!
//! Read from a TOML file. Every field has a default, so an empty or
//! missing file yields a working station on port 8080.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::*;
use crate::error::{Error, Result};

/// Environment variable overriding `server.port`
pub const PORT_ENV: &str = "RADIO_PORT";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Newline-delimited track list; read from stdin when unset
    pub playlist: Option<PathBuf>,
    pub server: ServerConfig,
    pub station: StationConfig,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub backlog: u32,
    /// Disable Nagle's algorithm on client sockets
    pub nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            nodelay: true,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|e| {
            Error::Config(format!("invalid bind address {:?}: {}", self.bind_address, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// What every connection plays and announces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Sent as `icy-name`
    pub name: String,
    pub genre: String,
    pub max_frames_per_track: usize,
    /// Fixed base seed for track selection; each connection mixes in its id
    pub seed: Option<u64>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STATION_NAME.to_string(),
            genre: DEFAULT_GENRE.to_string(),
            max_frames_per_track: MAX_FRAMES_PER_TRACK,
            seed: None,
        }
    }
}

impl AppConfig {
    /// Per-user config file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "random-radio").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from [`AppConfig::default_path`] when it exists,
    /// or fall back to defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    info!("No config file, using defaults");
                    Self::default()
                }
            },
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.override_port(&port)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn override_port(&mut self, value: &str) -> Result<()> {
        self.server.port = value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{PORT_ENV}={value:?}: {e}")))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.station.name.trim().is_empty() {
            return Err(Error::Config("station.name must not be empty".into()));
        }
        if self.station.max_frames_per_track == 0 {
            return Err(Error::Config(
                "station.max_frames_per_track must be at least 1".into(),
            ));
        }
        if self.server.backlog == 0 {
            return Err(Error::Config("server.backlog must be at least 1".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}
