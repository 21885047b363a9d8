use std::{io, net};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("handshake server seems to be offline, abandoning")]
    ErrServerUnavailable,
    #[error("handshake wait expired")]
    ErrHandshakeTimeout,
    #[error("rendezvous was closed")]
    ErrClosed,
    #[error("handshake reply is too large: {0} bytes")]
    ErrReplyTooLarge(u32),
    #[error("{0}")]
    Wire(#[from] wire::Error),
    #[error("{0}")]
    Transport(#[from] transport::Error),
    #[error("parse addr: {0}")]
    ParseIp(#[from] net::AddrParseError),
    #[error("{0}")]
    Io(#[source] IoError),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}
