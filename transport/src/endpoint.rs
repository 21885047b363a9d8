
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use socket2::SockAddr;
use tokio::net::UdpSocket;
use tokio::time;

use crate::error::{Error, Result};

const INBOUND_BUFFER_SIZE: usize = 65535;

/// A datagram endpoint over one UDP socket. This is the only type in the
/// workspace that touches the OS network stack.
pub struct Endpoint {
    socket: UdpSocket,
    label: String,
    peer: Option<SocketAddr>,
}

impl Endpoint {
    /// Binds a unicast endpoint.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = new_socket(addr, None)?;
        Ok(Endpoint {
            socket,
            label: String::new(),
            peer: None,
        })
    }

    /// Binds an endpoint and joins an IPv4 multicast group, with loopback
    /// enabled so peers on the same host hear each other.
    pub fn bind_multicast(addr: SocketAddr, group: Ipv4Addr) -> Result<Self> {
        let socket = new_socket(addr, Some(group))?;
        Ok(Endpoint {
            socket,
            label: String::new(),
            peer: None,
        })
    }

    /// Attaches a group label used in log lines.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    /// Sets the remote address `send` delivers to.
    pub fn connect(&mut self, remote: SocketAddr) {
        log::trace!("[{}] {:?} connecting to {remote}", self.label, self.socket.local_addr());
        self.peer = Some(remote);
    }

    pub async fn send(&self, payload: &[u8]) -> Result<usize> {
        let peer = self.peer.ok_or(Error::ErrNotConnected)?;
        let n = self.socket.send_to(payload, peer).await?;
        log::trace!("[{}] sent {n} bytes to {peer}", self.label);
        Ok(n)
    }

    /// Receives one datagram, waiting at most `timeout`. `ErrTimeout` is
    /// an expected outcome, never fatal.
    pub async fn recv(&self, timeout: Duration) -> Result<Bytes> {
        let mut buf = vec![0u8; INBOUND_BUFFER_SIZE];
        match time::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Err(_) => Err(Error::ErrTimeout),
            Ok(Ok((n, src))) => {
                log::trace!("[{}] received {n} bytes from {src}", self.label);
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Last-message-wins receive: waits for one datagram, then drains
    /// whatever else is queued and returns only the newest payload.
    /// Intended for high-rate streams where backlog is worse than loss.
    pub async fn recv_latest(&self, timeout: Duration) -> Result<Bytes> {
        let mut newest = self.recv(timeout).await?;
        let mut dropped = 0u32;

        let mut buf = vec![0u8; INBOUND_BUFFER_SIZE];
        loop {
            match self.socket.try_recv_from(&mut buf) {
                Ok((n, _)) => {
                    dropped += 1;
                    newest = Bytes::copy_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if dropped > 0 {
                        log::trace!("[{}] conflated {dropped} stale datagrams", self.label);
                    }
                    return Ok(newest);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Closes the endpoint by dropping the socket.
    pub fn close(self) {}
}

fn new_socket(addr: SocketAddr, group: Option<Ipv4Addr>) -> Result<UdpSocket> {
    let socket = socket2::Socket::new(
        socket2::Domain::IPV4,
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(target_family = "unix")]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;

    if let Some(group) = group {
        socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_multicast_loop_v4(true)?;
    }

    socket.bind(&SockAddr::from(addr))?;

    Ok(UdpSocket::from_std(socket.into())?)
}
