use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// The first byte of every datagram: the fragment's role within a burst.
pub(crate) const ROLE_START: u8 = 0x01;
pub(crate) const ROLE_MIDDLE: u8 = 0x02;
pub(crate) const ROLE_END: u8 = 0x03;
pub(crate) const ROLE_SOLO: u8 = 0x04;

/// Role byte plus uid byte.
pub const HEADER_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// First fragment of a multi-fragment burst.
    Start,
    /// Interior fragment.
    Middle,
    /// Final fragment; completes the burst.
    End,
    /// The only fragment of a single-fragment message.
    Solo,
}

impl Role {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Role::Start => ROLE_START,
            Role::Middle => ROLE_MIDDLE,
            Role::End => ROLE_END,
            Role::Solo => ROLE_SOLO,
        }
    }

    pub(crate) fn from_u8(b: u8) -> Result<Self> {
        match b {
            ROLE_START => Ok(Role::Start),
            ROLE_MIDDLE => Ok(Role::Middle),
            ROLE_END => Ok(Role::End),
            ROLE_SOLO => Ok(Role::Solo),
            other => Err(Error::ErrInvalidRole(other)),
        }
    }
}

/// One datagram payload: `role (1 byte) || uid (1 byte) || body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub role: Role,
    pub uid: u8,
    pub body: Bytes,
}

impl Fragment {
    pub fn new(role: Role, uid: u8, body: Bytes) -> Self {
        Fragment { role, uid, body }
    }

    pub fn marshal(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.body.len());
        buf.put_u8(self.role.to_u8());
        buf.put_u8(self.uid);
        buf.put_slice(&self.body);
        buf.freeze()
    }

    pub fn unmarshal(datagram: &[u8]) -> Result<Self> {
        if datagram.len() < HEADER_LEN {
            return Err(Error::ErrShortDatagram(datagram.len()));
        }
        let role = Role::from_u8(datagram[0])?;
        Ok(Fragment {
            role,
            uid: datagram[1],
            body: Bytes::copy_from_slice(&datagram[HEADER_LEN..]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_marshal_layout() {
        let frag = Fragment::new(Role::Start, 7, Bytes::from_static(b"abc"));
        assert_eq!(&frag.marshal()[..], &[0x01, 0x07, b'a', b'b', b'c']);
    }

    #[test]
    fn test_fragment_unmarshal_roundtrip() -> Result<()> {
        for role in [Role::Start, Role::Middle, Role::End, Role::Solo] {
            let frag = Fragment::new(role, 0xfe, Bytes::from_static(b"payload"));
            assert_eq!(Fragment::unmarshal(&frag.marshal())?, frag);
        }
        Ok(())
    }

    #[test]
    fn test_fragment_unmarshal_short_datagram() {
        assert_eq!(Fragment::unmarshal(&[]), Err(Error::ErrShortDatagram(0)));
        assert_eq!(
            Fragment::unmarshal(&[0x01]),
            Err(Error::ErrShortDatagram(1))
        );
    }

    #[test]
    fn test_fragment_unmarshal_empty_body() -> Result<()> {
        let frag = Fragment::unmarshal(&[0x04, 0x00])?;
        assert_eq!(frag.role, Role::Solo);
        assert!(frag.body.is_empty());
        Ok(())
    }

    #[test]
    fn test_fragment_unmarshal_invalid_role() {
        assert_eq!(
            Fragment::unmarshal(&[0x09, 0x00, 0x01]),
            Err(Error::ErrInvalidRole(0x09))
        );
    }
}
