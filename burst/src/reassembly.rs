
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::fragment::{Fragment, Role};

/// What the reassembler hands back for an arriving datagram.
///
/// `Complete` messages were assembled through the end or solo path and are
/// safe to decode. `Partial` messages are the bytes salvaged from an
/// interrupted burst; they are surfaced for observability and the caller
/// decides whether to forward or discard them.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Complete(Bytes),
    Partial(Bytes),
}

/// Counters exposed by the reassembler. Corruption is recovered locally
/// and only ever reported here and in the log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReassemblyStats {
    pub completes: u64,
    pub partials: u64,
    pub corrupted: u64,
    pub short_datagrams: u64,
}

#[derive(Debug)]
enum State {
    WaitStart,
    Receiving { uid: u8, parts: Vec<Bytes> },
}

/// Receive-side state machine: collects the fragments of the current
/// in-flight message and tolerates loss, reordering and interleaving.
#[derive(Debug)]
pub struct Reassembler {
    state: State,
    stats: ReassemblyStats,
}

impl Default for Reassembler {
    fn default() -> Self {
        Reassembler::new()
    }
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler {
            state: State::WaitStart,
            stats: ReassemblyStats::default(),
        }
    }

    pub fn stats(&self) -> &ReassemblyStats {
        &self.stats
    }

    /// True when no message is in flight.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::WaitStart)
    }

    /// Feeds one raw datagram. Malformed datagrams are dropped without
    /// touching the in-flight message; a corrupted role byte abandons it
    /// as a partial.
    pub fn feed(&mut self, datagram: &[u8]) -> Vec<Delivery> {
        match Fragment::unmarshal(datagram) {
            Ok(fragment) => self.feed_fragment(fragment),
            Err(Error::ErrShortDatagram(len)) => {
                self.stats.short_datagrams += 1;
                log::warn!("dropping malformed {len}-byte datagram");
                vec![]
            }
            Err(_) => {
                self.stats.corrupted += 1;
                let state = std::mem::replace(&mut self.state, State::WaitStart);
                match state {
                    State::WaitStart => {
                        log::warn!("dropping datagram with corrupted role byte");
                        vec![]
                    }
                    State::Receiving { parts, .. } => {
                        log::warn!("corrupted role byte mid-burst, salvaging what we have");
                        self.stats.partials += 1;
                        vec![Delivery::Partial(concat(&parts))]
                    }
                }
            }
        }
    }

    pub fn feed_fragment(&mut self, fragment: Fragment) -> Vec<Delivery> {
        let state = std::mem::replace(&mut self.state, State::WaitStart);
        let mut out = vec![];

        self.state = match state {
            State::WaitStart => match fragment.role {
                Role::Solo => {
                    self.stats.completes += 1;
                    out.push(Delivery::Complete(fragment.body));
                    State::WaitStart
                }
                Role::Start => State::Receiving {
                    uid: fragment.uid,
                    parts: vec![fragment.body],
                },
                Role::Middle | Role::End => {
                    self.stats.corrupted += 1;
                    log::warn!(
                        "{:?} fragment (uid {}) outside a burst, dropping",
                        fragment.role,
                        fragment.uid
                    );
                    State::WaitStart
                }
            },
            State::Receiving { uid, mut parts } => match fragment.role {
                Role::Middle if fragment.uid == uid => {
                    parts.push(fragment.body);
                    State::Receiving { uid, parts }
                }
                Role::End if fragment.uid == uid => {
                    parts.push(fragment.body);
                    self.stats.completes += 1;
                    out.push(Delivery::Complete(concat(&parts)));
                    State::WaitStart
                }
                Role::Start => {
                    // A new burst arrived before this one finished.
                    log::warn!("burst {uid} interrupted by new start (uid {})", fragment.uid);
                    self.stats.partials += 1;
                    out.push(Delivery::Partial(concat(&parts)));
                    State::Receiving {
                        uid: fragment.uid,
                        parts: vec![fragment.body],
                    }
                }
                Role::Solo => {
                    log::warn!("burst {uid} interrupted by solo (uid {})", fragment.uid);
                    self.stats.partials += 1;
                    out.push(Delivery::Partial(concat(&parts)));
                    self.stats.completes += 1;
                    out.push(Delivery::Complete(fragment.body));
                    State::WaitStart
                }
                Role::Middle | Role::End => {
                    // uid mismatch: messages interleaved or corrupted.
                    self.stats.corrupted += 1;
                    self.stats.partials += 1;
                    log::warn!(
                        "{:?} fragment uid {} does not match burst {uid}, salvaging",
                        fragment.role,
                        fragment.uid
                    );
                    out.push(Delivery::Partial(concat(&parts)));
                    State::WaitStart
                }
            },
        };

        out
    }
}

fn concat(parts: &[Bytes]) -> Bytes {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut buf = BytesMut::with_capacity(total);
    for part in parts {
        buf.put_slice(part);
    }
    buf.freeze()
}
