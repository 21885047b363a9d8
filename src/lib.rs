#![warn(rust_2018_idioms)]
#![allow(dead_code)]

// re-export sub-crates
pub use burst;
pub use netctl;
pub use rendezvous;
pub use transport;
pub use wire;

pub mod error;
pub mod peer;
pub mod sample;
pub mod session;

pub use error::Error;
