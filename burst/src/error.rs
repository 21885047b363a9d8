use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("datagram is too short to carry a fragment header: {0} bytes")]
    ErrShortDatagram(usize),
    #[error("unknown fragment role byte: {0:#04x}")]
    ErrInvalidRole(u8),
    #[error("chunk size must be non-zero")]
    ErrZeroChunk,
}
