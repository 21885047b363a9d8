
pub mod strategy;

use std::net::SocketAddr;
use std::sync::Arc;

use rendezvous::{
    discover_operator, discover_robot, request_link_parameters, serve_link_parameters,
    DiscoveryConfig, HANDSHAKE_PORT,
};
use tokio::sync::mpsc;
use wire::{Catalog, LinkParameters};

pub use strategy::{AdHocNetwork, ExistingNetwork, NetworkRestore, NetworkStrategy};

use crate::error::Result;
use crate::session::{Dispatcher, SampleSource, Session, SessionConfig, SessionStats};

/// Which side of the link this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Robot,
    Operator,
}

/// The robot: announces itself, hands out the link parameters, brings the
/// ad-hoc network up as its server side, and runs the session.
pub struct RobotPeer {
    pub discovery: DiscoveryConfig,
    pub params: LinkParameters,
    /// Last-message-wins receive mode for the session.
    pub conflate: bool,
}

impl RobotPeer {
    pub fn new(params: LinkParameters) -> Self {
        RobotPeer {
            discovery: DiscoveryConfig::default(),
            params,
            conflate: false,
        }
    }

    pub async fn run<S: NetworkStrategy>(
        self,
        strategy: &S,
        catalog: Arc<Catalog>,
        source: Box<dyn SampleSource>,
        dispatcher: Dispatcher,
        mut close_rx: mpsc::Receiver<()>,
    ) -> Result<SessionStats> {
        let local_ip = local_ipv4()?;
        log::info!("robot starting, local ip {local_ip}");

        let operator_ip = discover_operator(&self.discovery, &local_ip, &mut close_rx).await?;
        log::info!("operator found at {operator_ip}, serving link parameters");

        serve_link_parameters(
            SocketAddr::new(local_ip.parse()?, HANDSHAKE_PORT),
            &self.params,
            &catalog,
        )
        .await?;

        let restore = strategy.engage(Role::Robot, &self.params).await?;
        let config = SessionConfig::robot(
            self.params.server_ip.parse()?,
            self.params.client_ip.parse()?,
        )
        .with_conflate(self.conflate);

        // The network comes back no matter how the session ends.
        let result = Session::run(config, catalog, source, dispatcher, close_rx).await;
        strategy.restore(restore).await;
        result
    }
}

/// The operator: finds the robot, fetches the link parameters, joins the
/// ad-hoc network as its client side, and runs the session.
pub struct OperatorPeer {
    pub discovery: DiscoveryConfig,
    /// Last-message-wins receive mode, intended for high-rate camera and
    /// FFT streams where backlog is worse than loss.
    pub conflate: bool,
}

impl OperatorPeer {
    pub fn new() -> Self {
        OperatorPeer {
            discovery: DiscoveryConfig::default(),
            conflate: false,
        }
    }

    pub async fn run<S: NetworkStrategy>(
        self,
        strategy: &S,
        catalog: Arc<Catalog>,
        source: Box<dyn SampleSource>,
        dispatcher: Dispatcher,
        mut close_rx: mpsc::Receiver<()>,
    ) -> Result<SessionStats> {
        let local_ip = local_ipv4()?;
        log::info!("operator starting, local ip {local_ip}");

        let robot_ip = discover_robot(&self.discovery, &local_ip, &mut close_rx).await?;
        log::info!("robot found at {robot_ip}, requesting link parameters");

        let params = request_link_parameters(&robot_ip, &catalog).await?;
        log::info!("received link parameters for ssid {}", params.ssid);

        let restore = strategy.engage(Role::Operator, &params).await?;
        let config = SessionConfig::operator(params.client_ip.parse()?, params.server_ip.parse()?)
            .with_conflate(self.conflate);

        let result = Session::run(config, catalog, source, dispatcher, close_rx).await;
        strategy.restore(restore).await;
        result
    }
}

impl Default for OperatorPeer {
    fn default() -> Self {
        OperatorPeer::new()
    }
}

/// The local IPv4 address the default route would use. The connect never
/// sends a packet; it only picks the source address.
fn local_ipv4() -> Result<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip().to_string())
}
