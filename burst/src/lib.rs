#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod error;
pub mod fragment;
pub mod fragmenter;
pub mod reassembly;

pub use error::{Error, Result};
pub use fragment::{Fragment, Role, HEADER_LEN};
pub use fragmenter::{Fragmenter, DEFAULT_CHUNK};
pub use reassembly::{Delivery, Reassembler, ReassemblyStats};
