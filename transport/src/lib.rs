#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod endpoint;
pub mod error;

pub use endpoint::Endpoint;
pub use error::{Error, Result};

/// Group label for the rendezvous channel. UDP itself has no groups; the
/// labels only give log lines their context.
pub const GROUP_DISCOVERY: &str = "discovery";

/// Group label for the direct session channel.
pub const GROUP_DIRECT: &str = "direct";
