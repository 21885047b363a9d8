#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod discovery;
pub mod error;
pub mod handshake;
pub mod stateless;

pub use discovery::{
    discover_operator, discover_robot, DiscoveryConfig, DISCOVERY_GROUP, OPERATOR_PORT, ROBOT_PORT,
};
pub use error::{Error, Result};
pub use handshake::{
    request_link_parameters, serve_link_parameters, HANDSHAKE_PORT, MAX_RETRIES, RETRY_TIMEOUT,
};
pub use stateless::{await_link_parameters, offer_link_parameters, HandshakeState};
