#[cfg(test)]
mod stateless_test;

use std::time::Duration;

use tokio::sync::mpsc;
use transport::Endpoint;
use wire::{Catalog, LinkParameters};

use crate::error::{Error, Result};

/// States of the datagram handshake used when no reliable transport is
/// available. Every wait is bounded; expiry walks the machine back to
/// `SendObj`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    SendObj,
    WaitForObj,
    SendAck,
    SendNack,
    WaitForAck,
    Complete,
}

const ACK: &[u8] = b"ACK";
const NACK: &[u8] = b"NACK";

/// Default bound for each wait state.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Robot side: push the link parameters until the operator acknowledges
/// them. An echoed object is accepted only when it matches ours
/// field-for-field.
pub async fn offer_link_parameters(
    send: &Endpoint,
    recv: &Endpoint,
    params: &LinkParameters,
    catalog: &Catalog,
    wait_timeout: Duration,
    close_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let encoded = wire::encode(catalog, &params.to_record())?;
    let mut state = HandshakeState::SendObj;

    loop {
        match state {
            HandshakeState::SendObj => {
                send.send(&encoded).await?;
                log::info!("sent object: {}", LinkParameters::TYPE_NAME);
                state = HandshakeState::WaitForAck;
            }
            HandshakeState::WaitForAck => {
                let datagram = tokio::select! {
                    _ = close_rx.recv() => return Err(Error::ErrClosed),
                    res = recv.recv(wait_timeout) => match res {
                        Ok(d) => d,
                        Err(transport::Error::ErrTimeout) => {
                            log::warn!("{}", Error::ErrHandshakeTimeout);
                            state = HandshakeState::SendObj;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                };

                state = if datagram == ACK {
                    log::info!("received ACK");
                    HandshakeState::Complete
                } else if datagram == NACK {
                    log::info!("received NACK");
                    HandshakeState::SendObj
                } else if echo_matches(&datagram, params, catalog) {
                    HandshakeState::SendAck
                } else {
                    HandshakeState::SendNack
                };
            }
            HandshakeState::WaitForObj => {
                let datagram = tokio::select! {
                    _ = close_rx.recv() => return Err(Error::ErrClosed),
                    res = recv.recv(wait_timeout) => match res {
                        Ok(d) => d,
                        Err(transport::Error::ErrTimeout) => {
                            log::warn!("{}", Error::ErrHandshakeTimeout);
                            state = HandshakeState::SendObj;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                };

                state = if echo_matches(&datagram, params, catalog) {
                    HandshakeState::SendAck
                } else {
                    HandshakeState::SendNack
                };
            }
            HandshakeState::SendAck => {
                send.send(ACK).await?;
                log::info!("sent ACK");
                state = HandshakeState::Complete;
            }
            HandshakeState::SendNack => {
                send.send(NACK).await?;
                log::info!("sent NACK");
                state = HandshakeState::WaitForObj;
            }
            HandshakeState::Complete => {
                log::info!("handshake complete");
                return Ok(());
            }
        }
    }
}

/// Operator side: wait for the link parameters and acknowledge them.
/// Whatever decodes cleanly is accepted.
pub async fn await_link_parameters(
    send: &Endpoint,
    recv: &Endpoint,
    catalog: &Catalog,
    wait_timeout: Duration,
    close_rx: &mut mpsc::Receiver<()>,
) -> Result<LinkParameters> {
    let mut state = HandshakeState::WaitForObj;
    let mut received: Option<LinkParameters> = None;

    loop {
        match state {
            HandshakeState::WaitForObj => {
                let datagram = tokio::select! {
                    _ = close_rx.recv() => return Err(Error::ErrClosed),
                    res = recv.recv(wait_timeout) => match res {
                        Ok(d) => d,
                        Err(transport::Error::ErrTimeout) => {
                            log::warn!("{}", Error::ErrHandshakeTimeout);
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                };

                if datagram == ACK || datagram == NACK {
                    continue;
                }

                match wire::decode(catalog, datagram)
                    .and_then(|record| LinkParameters::try_from(&record))
                {
                    Ok(params) => {
                        log::info!("received object: {}", LinkParameters::TYPE_NAME);
                        received = Some(params);
                        state = HandshakeState::SendAck;
                    }
                    Err(e) => {
                        log::warn!("error unpacking object ({e}), sending NACK");
                        state = HandshakeState::SendNack;
                    }
                }
            }
            HandshakeState::SendAck => {
                send.send(ACK).await?;
                log::info!("sent ACK");
                state = HandshakeState::Complete;
            }
            HandshakeState::SendNack => {
                send.send(NACK).await?;
                log::info!("sent NACK");
                state = HandshakeState::WaitForObj;
            }
            HandshakeState::Complete => {
                log::info!("handshake complete");
                // Complete is only reachable after an object was accepted.
                return received.ok_or(Error::ErrHandshakeTimeout);
            }
            HandshakeState::SendObj | HandshakeState::WaitForAck => {
                // The accepting side never originates the object.
                return Err(Error::ErrHandshakeTimeout);
            }
        }
    }
}

fn echo_matches(datagram: &[u8], params: &LinkParameters, catalog: &Catalog) -> bool {
    let record = match wire::decode(catalog, bytes::Bytes::copy_from_slice(datagram)) {
        Ok(record) => record,
        Err(e) => {
            log::warn!("error unpacking echoed object: {e}");
            return false;
        }
    };

    match LinkParameters::try_from(&record) {
        Ok(echoed) => echoed == *params,
        Err(e) => {
            log::warn!("echoed object is incomplete: {e}");
            false
        }
    }
}
