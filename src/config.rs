//! Configuration for the DNS server.
//!
//! Two layers: `ServerConfig` holds the runtime settings assembled from the
//! command line and environment, and `Configuration` is the zone file
//! (YAML or JSON) named by `--file`.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::codes::QType;
use crate::errors::DnsError;
use crate::name::Name;

/// Default TTL for configured records in seconds.
pub const DEFAULT_TTL: u32 = 600;

/// Receive buffer size for plain UDP DNS.
pub const MAX_PACKET_SIZE: usize = 512;

/// Upstream resolver used when none is configured.
pub const DEFAULT_FORWARDER: &str = "8.8.8.8:53";

/// How long to wait for an upstream answer.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(2);

/// Help text for `--man file-syntax`.
pub const FILE_SYNTAX: &str = r#"Configuration file syntax

The file format is chosen by extension: .yaml / .yml (YAML, also the default
when there is no extension) or .json (JSON). An empty file is an empty
configuration.

    zones:
      - name: example.com
        records:
          - name: www.example.com
            type: A          # any registered type name, or a numeric code
            value: 192.0.2.10
            ttl: 300         # optional, defaults to 600

Type names are case sensitive (A, AAAA, MX, ...).
"#;

/// Which listeners to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Udp,
    Tcp,
    Both,
}

impl Mode {
    pub fn udp(&self) -> bool {
        matches!(self, Mode::Udp | Mode::Both)
    }

    pub fn tcp(&self) -> bool {
        matches!(self, Mode::Tcp | Mode::Both)
    }
}

/// Log verbosity accepted by `--verbose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    /// Info and above.
    Info,
    /// Everything, including packet dumps.
    All,
}

impl Verbosity {
    pub fn filter(&self) -> &'static str {
        match self {
            Verbosity::Info => "info",
            Verbosity::All => "trace",
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP listener binds to.
    pub udp_addr: SocketAddr,

    /// Address the TCP listener binds to.
    pub tcp_addr: SocketAddr,

    pub mode: Mode,

    /// Upstream resolvers, tried in order.
    pub forwarders: Vec<SocketAddr>,

    /// Maximum size of UDP DNS packets.
    pub max_packet_size: usize,

    pub upstream_timeout: Duration,

    /// Zone configuration file, if any.
    pub zone_file: Option<PathBuf>,

    /// Where to serve Prometheus metrics, if anywhere.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            udp_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            tcp_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            mode: Mode::Udp,
            forwarders: vec![SocketAddr::from(([8, 8, 8, 8], 53))],
            max_packet_size: MAX_PACKET_SIZE,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            zone_file: None,
            metrics_addr: None,
        }
    }
}

/// Parse `host` and `port` into a socket address.
///
/// # Arguments
/// * `host` - An IPv4 or IPv6 literal.
/// * `port` - The port number.
///
/// # Returns
/// A `Result` containing the address or a configuration error.
pub fn socket_addr(host: &str, port: u16) -> Result<SocketAddr, DnsError> {
    let ip = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| DnsError::Config(format!("Invalid host address: {}", host)))?;
    Ok(SocketAddr::new(ip, port))
}

/// Parse a comma separated forwarder list. Entries without a port use 53.
pub fn parse_forwarders(list: &str) -> Result<Vec<SocketAddr>, DnsError> {
    let forwarders = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<SocketAddr>()
                .or_else(|_| socket_addr(s, 53))
                .map_err(|_| DnsError::Config(format!("Invalid forwarder address: {}", s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if forwarders.is_empty() {
        return Err(DnsError::Config("At least one forwarder is required".into()));
    }
    Ok(forwarders)
}

/// Zone file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, DnsError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            None => {
                info!("Format not found, default to yaml");
                Ok(Format::Yaml)
            }
            Some(other) => Err(DnsError::Config(format!(
                "Unsupported configuration format: .{}",
                other
            ))),
        }
    }
}

/// A record entry in a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: QType,
    pub value: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// A zone and its static records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// The zone configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Configuration {
    /// Parse configuration text. Empty input is an empty configuration.
    ///
    /// # Arguments
    /// * `content` - The file contents.
    /// * `format` - Whether `content` is YAML or JSON.
    ///
    /// # Returns
    /// A `Result` containing the validated configuration or an error.
    pub fn parse(content: &str, format: Format) -> Result<Self, DnsError> {
        debug!("Parsing {:?} configuration", format);
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Configuration = match format {
            Format::Yaml => serde_yaml_ng::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self, DnsError> {
        info!("Server configuration file '{}'", path.display());
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            DnsError::Config(format!("Error opening configuration file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content, format)?;
        info!(
            "Loaded {} zone(s) with {} record(s)",
            config.zones.len(),
            config.record_count()
        );
        Ok(config)
    }

    pub fn record_count(&self) -> usize {
        self.zones.iter().map(|z| z.records.len()).sum()
    }

    /// Check that every zone and record name is a valid domain name.
    pub fn validate(&self) -> Result<(), DnsError> {
        for zone in &self.zones {
            zone.name.parse::<Name>().map_err(|e| {
                DnsError::Config(format!("Invalid zone name {:?}: {}", zone.name, e))
            })?;
            for record in &zone.records {
                record.name.parse::<Name>().map_err(|e| {
                    DnsError::Config(format!("Invalid record name {:?}: {}", record.name, e))
                })?;
                if !record.rtype.is_assigned() {
                    warn!(
                        "Record {} uses unnamed type {}",
                        record.name,
                        record.rtype.code()
                    );
                }
            }
        }
        Ok(())
    }
}
