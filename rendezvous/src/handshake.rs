
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use wire::{Catalog, LinkParameters};

use crate::error::{Error, Result};

/// The robot answers link-parameter requests on this port.
pub const HANDSHAKE_PORT: u16 = 9998;

/// How long the client waits for a reply before it abandons the
/// connection and opens a fresh one.
pub const RETRY_TIMEOUT: Duration = Duration::from_millis(2500);

/// How many times the client reopens before giving up.
pub const MAX_RETRIES: u32 = 10;

const REQUEST: &[u8] = b"pls";
const MAX_REPLY_LEN: u32 = 64 * 1024;

/// Robot side: answer exactly one request with the encoded link
/// parameters. The reply is length-prefixed on the stream.
pub async fn serve_link_parameters(
    addr: SocketAddr,
    params: &LinkParameters,
    catalog: &Catalog,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("handshake server listening on {}", listener.local_addr()?);

    let (mut stream, peer) = listener.accept().await?;

    let mut request = [0u8; 16];
    let n = stream.read(&mut request).await?;
    log::info!(
        "handshake request from {peer}: {}",
        String::from_utf8_lossy(&request[..n])
    );

    let encoded = wire::encode(catalog, &params.to_record())?;
    stream.write_u32(encoded.len() as u32).await?;
    stream.write_all(&encoded).await?;
    log::info!("sent link parameters to {peer}");

    Ok(())
}

/// Operator side, lazy pirate: request the link parameters from the robot,
/// reopening the connection and resending on every timeout, up to
/// `MAX_RETRIES` attempts.
pub async fn request_link_parameters(
    server_ip: &str,
    catalog: &Catalog,
) -> Result<LinkParameters> {
    let ip: Ipv4Addr = server_ip.parse()?;
    request_from(
        SocketAddr::new(ip.into(), HANDSHAKE_PORT),
        catalog,
        RETRY_TIMEOUT,
        MAX_RETRIES,
    )
    .await
}

pub async fn request_from(
    addr: SocketAddr,
    catalog: &Catalog,
    retry_timeout: Duration,
    max_retries: u32,
) -> Result<LinkParameters> {
    let mut retries_left = max_retries;

    loop {
        match attempt(addr, catalog, retry_timeout).await {
            Ok(params) => return Ok(params),
            // A reply that arrived but does not decode is not a flaky
            // server; surface it instead of hammering on.
            Err(Error::Wire(e)) => return Err(Error::Wire(e)),
            Err(e) => {
                retries_left = retries_left.saturating_sub(1);
                if retries_left == 0 {
                    log::error!("handshake server at {addr} is not answering, abandoning");
                    return Err(Error::ErrServerUnavailable);
                }
                log::warn!("no usable handshake reply ({e}), retrying ({retries_left} left)");
            }
        }
    }
}

/// One request over a fresh connection. Dropping the stream on any exit
/// path is what closes and removes the confused socket.
async fn attempt(
    addr: SocketAddr,
    catalog: &Catalog,
    retry_timeout: Duration,
) -> Result<LinkParameters> {
    let mut stream = time::timeout(retry_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::ErrHandshakeTimeout)??;

    stream.write_all(REQUEST).await?;

    let reply = time::timeout(retry_timeout, read_reply(&mut stream))
        .await
        .map_err(|_| Error::ErrHandshakeTimeout)??;

    let record = wire::decode(catalog, reply)?;
    Ok(LinkParameters::try_from(&record)?)
}

async fn read_reply(stream: &mut TcpStream) -> Result<Bytes> {
    let len = stream.read_u32().await?;
    if len > MAX_REPLY_LEN {
        return Err(Error::ErrReplyTooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
