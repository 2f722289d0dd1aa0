//! gdns
//!
//! A forwarding DNS server that decodes and logs every query and answer it
//! relays.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::info;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;

use gdns::{
    config::{
        parse_forwarders, socket_addr, Configuration, Mode, ServerConfig, Verbosity,
        DEFAULT_FORWARDER, FILE_SYNTAX, MAX_PACKET_SIZE,
    },
    errors::DnsError,
    handlers::{run_tcp_server, run_udp_server},
};

/// Manual pages printed by `--man`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ManPage {
    FileSyntax,
}

#[derive(Parser, Debug)]
#[command(name = "gdns", version, about = "Forwarding DNS server with wire-format logging")]
struct Cli {
    /// UDP listen address.
    #[arg(short = 'H', long, env = "GDNS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// TCP listen address.
    #[arg(long, env = "GDNS_TCP_HOST", default_value = "127.0.0.1")]
    tcp_host: String,

    /// UDP listen port.
    #[arg(short, long, env = "GDNS_PORT", default_value_t = 3000)]
    port: u16,

    /// TCP listen port.
    #[arg(long, env = "GDNS_TCP_PORT", default_value_t = 3000)]
    tcp_port: u16,

    /// Zone configuration file (YAML or JSON).
    #[arg(short, long, env = "GDNS_CONFIG_FILE", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Listeners to start.
    #[arg(long, value_enum, env = "GDNS_MODE", default_value_t = Mode::Udp)]
    mode: Mode,

    /// Log level; RUST_LOG takes precedence when set.
    #[arg(short, long, value_enum, default_value_t = Verbosity::Info)]
    verbose: Verbosity,

    /// Comma separated upstream resolvers.
    #[arg(long, env = "GDNS_FORWARDERS", default_value = DEFAULT_FORWARDER)]
    forwarders: String,

    /// UDP receive buffer size.
    #[arg(long, env = "GDNS_MAX_PACKET_SIZE", default_value_t = MAX_PACKET_SIZE)]
    max_packet_size: usize,

    /// Upstream timeout in milliseconds.
    #[arg(long, env = "GDNS_UPSTREAM_TIMEOUT_MS", default_value_t = 2000)]
    upstream_timeout_ms: u64,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "GDNS_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Print a manual page and exit.
    #[arg(short, long, value_enum)]
    man: Option<ManPage>,
}

impl Cli {
    fn server_config(&self) -> Result<ServerConfig, DnsError> {
        Ok(ServerConfig {
            udp_addr: socket_addr(&self.host, self.port)?,
            tcp_addr: socket_addr(&self.tcp_host, self.tcp_port)?,
            mode: self.mode,
            forwarders: parse_forwarders(&self.forwarders)?,
            max_packet_size: self.max_packet_size,
            upstream_timeout: Duration::from_millis(self.upstream_timeout_ms),
            zone_file: self.file.clone(),
            metrics_addr: self.metrics_addr,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), DnsError> {
    let cli = Cli::parse();

    if let Some(ManPage::FileSyntax) = cli.man {
        println!("{}", FILE_SYNTAX);
        return Ok(());
    }

    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.verbose.filter()))
        .format_timestamp_micros()
        .init();

    let config = cli.server_config()?;
    info!("Forwarders: {:?}", config.forwarders);

    if let Some(path) = &config.zone_file {
        Configuration::load(path)?;
    }

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| DnsError::Config(format!("Cannot start metrics exporter: {}", e)))?;
        info!("Metrics exporter listening on {}", addr);
    }

    // Set up shutdown signal handler
    let shutdown_signal = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                log::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    let udp_server = async {
        if config.mode.udp() {
            run_udp_server(config.clone()).await
        } else {
            std::future::pending().await
        }
    };
    let tcp_server = async {
        if config.mode.tcp() {
            run_tcp_server(config.clone()).await
        } else {
            std::future::pending().await
        }
    };

    // Wait for either a shutdown signal or server error
    tokio::select! {
        _ = shutdown_signal => {
            info!("Initiating graceful shutdown...");
            Ok(())
        },
        res = udp_server => res,
        res = tcp_server => res,
    }
}
