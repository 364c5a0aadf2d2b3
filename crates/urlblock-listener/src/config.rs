//! Configuration for the report listener

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use urlblock_core::DEFAULT_CAPACITY;
use urlblock_logging::LogConfig;

use crate::error::{ListenerError, ListenerResult};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "listener.toml";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration for the listener process
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Interface to bind; loopback unless configured otherwise
    pub bind: IpAddr,
    /// TCP port to listen on
    pub port: u16,
    /// Number of blocked-URL events retained
    pub max_requests: NonZeroUsize,
    /// Logging configuration
    pub logging: LogConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            max_requests: DEFAULT_CAPACITY,
            logging: LogConfig::default(),
        }
    }
}

/// On-disk shape; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    bind: Option<IpAddr>,
    port: Option<u16>,
    max_requests: Option<usize>,
    logging: Option<LogConfig>,
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub max_requests: Option<usize>,
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file
    File(PathBuf),
    /// The default file was absent; built-in defaults were used
    Defaults { looked_for: PathBuf },
}

fn capacity(max_requests: usize) -> ListenerResult<NonZeroUsize> {
    NonZeroUsize::new(max_requests)
        .ok_or_else(|| ListenerError::Config("max_requests must be at least 1".to_string()))
}

impl ListenerConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str, path: &Path) -> ListenerResult<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ListenerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        let defaults = Self::default();
        Ok(Self {
            bind: file.bind.unwrap_or(defaults.bind),
            port: file.port.unwrap_or(defaults.port),
            max_requests: match file.max_requests {
                Some(n) => capacity(n)?,
                None => defaults.max_requests,
            },
            logging: file.logging.unwrap_or(defaults.logging),
        })
    }

    /// Read and parse a config file
    pub fn from_file(path: impl AsRef<Path>) -> ListenerResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ListenerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Resolve the configuration file.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
    /// the working directory is used when present, defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> ListenerResult<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        let path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if path.exists() {
            let config = Self::from_file(&path)?;
            Ok((config, ConfigSource::File(path)))
        } else {
            Ok((Self::default(), ConfigSource::Defaults { looked_for: path }))
        }
    }

    /// Apply command-line values over the loaded configuration
    pub fn apply(mut self, overrides: &ConfigOverrides) -> ListenerResult<Self> {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(max_requests) = overrides.max_requests {
            self.max_requests = capacity(max_requests)?;
        }
        Ok(self)
    }

    /// Set the bind interface
    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Set the listen port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the number of retained events
    pub fn with_max_requests(mut self, max_requests: NonZeroUsize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Address the server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ListenerConfig::default();
        assert_eq!(config.socket_addr(), "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.max_requests.get(), 10);
    }

    #[test]
    fn test_parse_full_file() {
        let config = ListenerConfig::from_toml(
            r#"
            bind = "0.0.0.0"
            port = 8080
            max_requests = 25

            [logging]
            default_level = "debug"
            "#,
            Path::new("listener.toml"),
        )
        .unwrap();

        assert_eq!(config.socket_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.max_requests.get(), 25);
        assert_eq!(config.logging.default_level, "debug");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ListenerConfig::from_toml("port = 4000", Path::new("listener.toml")).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.max_requests.get(), 10);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ListenerConfig::from_toml("max_requests = 0", Path::new("listener.toml")).unwrap_err();
        assert!(matches!(err, ListenerError::Config(_)));

        let err = ListenerConfig::default()
            .apply(&ConfigOverrides {
                max_requests: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ListenerError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = ListenerConfig::from_toml("port = \"not a port\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ListenerError::ConfigParse { .. }));

        let err = ListenerConfig::from_toml("unknown_key = 1", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ListenerError::ConfigParse { .. }));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = ListenerConfig::from_toml("port = 4000\nmax_requests = 5", Path::new("listener.toml"))
            .unwrap()
            .apply(&ConfigOverrides {
                bind: Some("0.0.0.0".parse().unwrap()),
                port: Some(5000),
                max_requests: None,
            })
            .unwrap();

        assert_eq!(config.socket_addr(), "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.max_requests.get(), 5);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_requests = 3").unwrap();

        let (config, source) = ListenerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_requests.get(), 3);
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ListenerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ListenerError::ConfigIo { .. }));
    }
}
