//! Request handlers for the DNS server.
//!
//! This module provides functions for handling DNS requests over UDP and TCP.
//! Every query is decoded for logging and validation, then relayed verbatim
//! to the configured forwarders.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, log_enabled, trace, warn, Level};
use metrics::increment_counter;
use tokio::{
    net::{TcpListener, TcpStream, UdpSocket},
    task,
};

use crate::codes::RCode;
use crate::config::ServerConfig;
use crate::dns::{build_error_response, decode};
use crate::errors::DnsError;
use crate::forward::{forward_to_resolvers, forward_to_resolvers_tcp, read_framed, write_framed};
use crate::message::Message;
use crate::utils::hex_dump;

/// Transport a query arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Udp => "udp",
            Transport::Tcp => "tcp",
        }
    }
}

fn log_message(direction: &str, message: &Message) {
    if log_enabled!(Level::Debug) {
        match serde_json::to_string(message) {
            Ok(json) => debug!("{} message: {}", direction, json),
            Err(e) => debug!("{} message could not be rendered: {}", direction, e),
        }
    }
}

/// Decode, forward and answer one query.
///
/// # Arguments
/// * `query` - The raw DNS query.
/// * `src` - The client address, for logging.
/// * `transport` - Transport the query arrived on.
/// * `config` - The server configuration.
///
/// # Returns
/// The bytes to send back, or `None` if the query should be dropped.
pub async fn process_query(
    query: &[u8],
    src: SocketAddr,
    transport: Transport,
    config: &ServerConfig,
) -> Option<Vec<u8>> {
    increment_counter!("gdns_queries_total", "transport" => transport.as_str());
    trace!("{} query from {}:\n{}", transport.as_str(), src, hex_dump(query));

    match decode(query) {
        Ok(message) => {
            for question in &message.questions {
                info!(
                    "{} query from {}: {} {} {}",
                    transport.as_str(),
                    src,
                    question.name,
                    question.qtype,
                    question.qclass
                );
            }
            log_message("Query", &message);
        }
        Err(e) if e.source.is_malformed() => {
            increment_counter!("gdns_decode_errors_total", "section" => e.section.as_str());
            warn!("Malformed {} query from {}: {}", transport.as_str(), src, e);
            return build_error_response(query, RCode::FORMAT_ERROR);
        }
        Err(e) => {
            increment_counter!("gdns_decode_errors_total", "section" => e.section.as_str());
            debug!("Forwarding query from {} with unregistered code: {}", src, e);
        }
    }

    let response = match transport {
        Transport::Udp => {
            forward_to_resolvers(query, &config.forwarders, config.upstream_timeout).await
        }
        Transport::Tcp => {
            forward_to_resolvers_tcp(query, &config.forwarders, config.upstream_timeout).await
        }
    };

    match response {
        Some(response) => {
            match decode(&response) {
                Ok(message) => {
                    if let Some(name) = message.query_name() {
                        info!(
                            "Upstream answered {} for {} with {} record(s)",
                            message.header.rcode,
                            name,
                            message.answers.len()
                        );
                    }
                    log_message("Upstream", &message);
                }
                Err(e) => warn!("Upstream answer for {} did not decode: {}", src, e),
            }
            Some(response)
        }
        None => {
            increment_counter!("gdns_forward_failures_total");
            warn!("No forwarder answered the query from {}", src);
            build_error_response(query, RCode::SERVER_FAILURE)
        }
    }
}

/// Run the UDP DNS server.
///
/// # Arguments
/// * `config` - The server configuration.
///
/// # Returns
/// A `Result` indicating success or failure.
pub async fn run_udp_server(config: ServerConfig) -> Result<(), DnsError> {
    let socket = UdpSocket::bind(config.udp_addr).await?;
    serve_udp(socket, config).await
}

/// Serve DNS on an already bound UDP socket.
pub async fn serve_udp(socket: UdpSocket, config: ServerConfig) -> Result<(), DnsError> {
    info!("UDP DNS server listening on {}", socket.local_addr()?);
    let socket = Arc::new(socket);
    let config = Arc::new(config);
    let mut buf = vec![0u8; config.max_packet_size];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((amt, src)) => {
                if amt == buf.len() {
                    debug!(
                        "UDP query from {} filled the {}-byte buffer and may be cut short",
                        src, amt
                    );
                }
                let query = buf[..amt].to_vec();
                let socket = socket.clone();
                let config = config.clone();
                task::spawn(async move {
                    if let Err(e) = handle_udp_query(query, src, socket, &config).await {
                        warn!("UDP query error: {}", e);
                    }
                });
            }
            Err(e) => error!("UDP receive error: {}", e),
        }
    }
}

/// Handle a UDP DNS query.
///
/// # Arguments
/// * `query` - The DNS query.
/// * `src` - The source address of the query.
/// * `socket` - The UDP socket to send the response on.
/// * `config` - The server configuration.
///
/// # Returns
/// A `Result` indicating success or failure.
pub async fn handle_udp_query(
    query: Vec<u8>,
    src: SocketAddr,
    socket: Arc<UdpSocket>,
    config: &ServerConfig,
) -> Result<(), DnsError> {
    match process_query(&query, src, Transport::Udp, config).await {
        Some(response) => {
            socket.send_to(&response, src).await?;
        }
        None => debug!("Dropped unreadable UDP query from {}", src),
    }
    Ok(())
}

/// Run the TCP DNS server.
///
/// # Arguments
/// * `config` - The server configuration.
///
/// # Returns
/// A `Result` indicating success or failure.
pub async fn run_tcp_server(config: ServerConfig) -> Result<(), DnsError> {
    let listener = TcpListener::bind(config.tcp_addr).await?;
    serve_tcp(listener, config).await
}

/// Serve DNS on an already bound TCP listener.
pub async fn serve_tcp(listener: TcpListener, config: ServerConfig) -> Result<(), DnsError> {
    info!("TCP DNS server listening on {}", listener.local_addr()?);
    let config = Arc::new(config);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let config = config.clone();
                task::spawn(async move {
                    if let Err(e) = handle_tcp_connection(stream, addr, &config).await {
                        warn!("TCP connection error: {}", e);
                    }
                });
            }
            Err(e) => error!("TCP accept error: {}", e),
        }
    }
}

/// Handle a TCP DNS connection.
///
/// Length-prefixed queries are answered in order until the client closes
/// the connection or sends something that cannot be answered.
///
/// # Arguments
/// * `stream` - The TCP stream.
/// * `addr` - The client address.
/// * `config` - The server configuration.
///
/// # Returns
/// A `Result` indicating success or failure.
pub async fn handle_tcp_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    config: &ServerConfig,
) -> Result<(), DnsError> {
    loop {
        let query = match read_framed(&mut stream).await {
            Ok(query) => query,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        match process_query(&query, addr, Transport::Tcp, config).await {
            Some(response) => write_framed(&mut stream, &response).await?,
            None => {
                debug!("Received malformed TCP query from {}", addr);
                return Ok(());
            }
        }
    }
}
