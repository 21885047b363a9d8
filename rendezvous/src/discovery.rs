#[cfg(test)]
mod discovery_test;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use transport::{Endpoint, GROUP_DISCOVERY};

use crate::error::{Error, Result};

/// Shared multicast group both peers join to find each other.
pub const DISCOVERY_GROUP: Ipv4Addr = Ipv4Addr::new(239, 0, 0, 1);

/// The robot listens here; the operator transmits here.
pub const ROBOT_PORT: u16 = 9998;

/// The operator listens here; the robot transmits here.
pub const OPERATOR_PORT: u16 = 9999;

const PING_PREFIX: &str = "PING from server";
const PONG_PREFIX: &str = "PING_RESPONSE from client";

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub group: Ipv4Addr,
    pub robot_port: u16,
    pub operator_port: u16,
    pub ping_interval: Duration,
    pub recv_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            group: DISCOVERY_GROUP,
            robot_port: ROBOT_PORT,
            operator_port: OPERATOR_PORT,
            ping_interval: Duration::from_secs(1),
            recv_timeout: Duration::from_secs(1),
        }
    }
}

/// Robot side: announce our ip to the group about once a second until an
/// operator responds, then return the operator's ip.
pub async fn discover_operator(
    config: &DiscoveryConfig,
    local_ip: &str,
    close_rx: &mut mpsc::Receiver<()>,
) -> Result<String> {
    let mut endpoint = Endpoint::bind_multicast(
        SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), config.robot_port),
        config.group,
    )?
    .with_label(GROUP_DISCOVERY);
    endpoint.connect(SocketAddr::new(config.group.into(), config.operator_port));

    loop {
        let ping = format!("{PING_PREFIX}: {local_ip}");
        endpoint.send(ping.as_bytes()).await?;
        log::info!("sent: {ping}");

        tokio::select! {
            _ = close_rx.recv() => return Err(Error::ErrClosed),
            _ = time::sleep(config.ping_interval) => {}
        }

        tokio::select! {
            _ = close_rx.recv() => return Err(Error::ErrClosed),
            res = endpoint.recv(config.recv_timeout) => match res {
                Ok(datagram) => {
                    let message = String::from_utf8_lossy(&datagram).into_owned();
                    log::info!("received {GROUP_DISCOVERY}: {message}");
                    if message.contains(PONG_PREFIX) {
                        if let Some(ip) = peer_ip(&message) {
                            log::info!("discovered operator ip: {ip}");
                            return Ok(ip);
                        }
                    }
                }
                Err(transport::Error::ErrTimeout) => log::info!("no operator response yet"),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Operator side: wait for a robot announcement, answer it once with our
/// own ip, and return the robot's ip.
pub async fn discover_robot(
    config: &DiscoveryConfig,
    local_ip: &str,
    close_rx: &mut mpsc::Receiver<()>,
) -> Result<String> {
    let mut endpoint = Endpoint::bind_multicast(
        SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), config.operator_port),
        config.group,
    )?
    .with_label(GROUP_DISCOVERY);
    endpoint.connect(SocketAddr::new(config.group.into(), config.robot_port));

    loop {
        tokio::select! {
            _ = close_rx.recv() => return Err(Error::ErrClosed),
            res = endpoint.recv(config.recv_timeout) => match res {
                Ok(datagram) => {
                    let message = String::from_utf8_lossy(&datagram).into_owned();
                    log::info!("received {GROUP_DISCOVERY}: {message}");

                    let robot_ip = match peer_ip(&message) {
                        Some(ip) if message.contains(PING_PREFIX) => ip,
                        _ => continue,
                    };
                    log::info!("discovered robot ip: {robot_ip}");

                    let response = format!("{PONG_PREFIX}: {local_ip}");
                    endpoint.send(response.as_bytes()).await?;
                    log::info!("responded: {response}");

                    return Ok(robot_ip);
                }
                Err(transport::Error::ErrTimeout) => log::info!("no ping received from server"),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// The announcing messages end in `: <ipv4>`.
fn peer_ip(message: &str) -> Option<String> {
    let ip = message.rsplit(':').next()?.trim();
    if ip.is_empty() {
        return None;
    }
    Some(ip.to_owned())
}
