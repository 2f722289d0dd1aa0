//! Static forwarding to upstream resolvers.
//!
//! Queries are relayed byte-for-byte; the codec is only used by the callers
//! for logging what went in and came back.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

/// Largest response accepted from an upstream over UDP.
const UPSTREAM_BUFFER_SIZE: usize = 4096;

fn timed_out(forwarder: SocketAddr) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("no answer from {} in time", forwarder),
    )
}

fn unspecified_for(forwarder: SocketAddr) -> SocketAddr {
    if forwarder.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    }
}

/// Forward a DNS query to an upstream resolver using UDP.
///
/// # Arguments
/// * `forwarder` - The upstream resolver to forward to.
/// * `query` - The DNS query to forward.
/// * `wait` - How long to wait for the answer.
///
/// # Returns
/// A `Result` containing the response or an error.
pub async fn forward_request_udp(
    forwarder: SocketAddr,
    query: &[u8],
    wait: Duration,
) -> io::Result<Vec<u8>> {
    let socket = UdpSocket::bind(unspecified_for(forwarder)).await?;
    socket.connect(forwarder).await?;
    socket.send(query).await?;

    let mut buf = vec![0u8; UPSTREAM_BUFFER_SIZE];
    let size = timeout(wait, socket.recv(&mut buf))
        .await
        .map_err(|_| timed_out(forwarder))??;
    buf.truncate(size);
    Ok(buf)
}

/// Forward a DNS query to an upstream resolver using TCP.
///
/// # Arguments
/// * `forwarder` - The upstream resolver to forward to.
/// * `query` - The DNS query to forward.
/// * `wait` - Deadline for the whole exchange.
///
/// # Returns
/// A `Result` containing the response or an error.
pub async fn forward_request_tcp(
    forwarder: SocketAddr,
    query: &[u8],
    wait: Duration,
) -> io::Result<Vec<u8>> {
    let exchange = async {
        let mut stream = TcpStream::connect(forwarder).await?;
        write_framed(&mut stream, query).await?;
        read_framed(&mut stream).await
    };
    timeout(wait, exchange)
        .await
        .map_err(|_| timed_out(forwarder))?
}

/// Forward a DNS query to each upstream resolver in turn over UDP, falling
/// back to TCP when the UDP answer is truncated or no resolver answered.
///
/// # Arguments
/// * `query` - The DNS query to forward.
/// * `forwarders` - List of upstream resolvers to try.
/// * `wait` - Per-resolver timeout.
///
/// # Returns
/// An `Option` containing the response if any resolver answered.
pub async fn forward_to_resolvers(
    query: &[u8],
    forwarders: &[SocketAddr],
    wait: Duration,
) -> Option<Vec<u8>> {
    for &forwarder in forwarders {
        info!("Forwarding query to resolver: {}", forwarder);
        match forward_request_udp(forwarder, query, wait).await {
            Ok(resp) if is_truncated(&resp) => {
                debug!("Truncated answer from {}, retrying over TCP", forwarder);
                if let Ok(full) = forward_request_tcp(forwarder, query, wait).await {
                    return Some(full);
                }
                return Some(resp);
            }
            Ok(resp) => {
                info!("Received response from resolver: {}", forwarder);
                return Some(resp);
            }
            Err(e) => warn!("UDP forward to {} failed: {}", forwarder, e),
        }
    }
    forward_to_resolvers_tcp(query, forwarders, wait).await
}

/// Forward a DNS query to each upstream resolver in turn over TCP.
pub async fn forward_to_resolvers_tcp(
    query: &[u8],
    forwarders: &[SocketAddr],
    wait: Duration,
) -> Option<Vec<u8>> {
    for &forwarder in forwarders {
        match forward_request_tcp(forwarder, query, wait).await {
            Ok(resp) => return Some(resp),
            Err(e) => warn!("TCP forward to {} failed: {}", forwarder, e),
        }
    }
    None
}

fn is_truncated(response: &[u8]) -> bool {
    response.get(2).map(|b| b & 0x02 != 0).unwrap_or(false)
}

/// Write one message with its 2-byte length prefix.
pub async fn write_framed(stream: &mut TcpStream, message: &[u8]) -> io::Result<()> {
    let len = u16::try_from(message.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "DNS message over 65535 bytes"))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(message).await
}

/// Read one length-prefixed message.
pub async fn read_framed(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut message = vec![0u8; len];
    stream.read_exact(&mut message).await?;
    Ok(message)
}
