#[cfg(test)]
mod session_test;

pub mod dispatch;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use burst::{Delivery, Fragmenter, Reassembler, DEFAULT_CHUNK};
use tokio::sync::{mpsc, Mutex};
use tokio::time;
use transport::{Endpoint, GROUP_DIRECT};
use wire::{Catalog, Record};

pub use dispatch::{Dispatcher, PartialObserver, RecordHandler};

use crate::error::{Error, Result};

/// Target producer rate.
pub const DEFAULT_PACE_HZ: u32 = 120;

const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Where a producer gets its samples from. Returning `None` ends the
/// session; errors tear it down.
#[async_trait]
pub trait SampleSource: Send {
    async fn next_sample(&mut self) -> Result<Option<Record>>;
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local address the receive socket binds.
    pub bind_addr: SocketAddr,
    /// Remote address bursts are sent to.
    pub peer_addr: SocketAddr,
    pub chunk: usize,
    pub pace_hz: u32,
    pub recv_timeout: Duration,
    /// Last-message-wins receive mode for high-rate streams.
    pub conflate: bool,
}

impl SessionConfig {
    /// Robot side of the direct link: listen on the server port, transmit
    /// to the operator's client port.
    pub fn robot(local_ip: IpAddr, operator_ip: IpAddr) -> Self {
        SessionConfig {
            bind_addr: SocketAddr::new(local_ip, rendezvous::ROBOT_PORT),
            peer_addr: SocketAddr::new(operator_ip, rendezvous::OPERATOR_PORT),
            chunk: DEFAULT_CHUNK,
            pace_hz: DEFAULT_PACE_HZ,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            conflate: false,
        }
    }

    /// Operator side: the mirror image of [`SessionConfig::robot`].
    pub fn operator(local_ip: IpAddr, robot_ip: IpAddr) -> Self {
        SessionConfig {
            bind_addr: SocketAddr::new(local_ip, rendezvous::OPERATOR_PORT),
            peer_addr: SocketAddr::new(robot_ip, rendezvous::ROBOT_PORT),
            chunk: DEFAULT_CHUNK,
            pace_hz: DEFAULT_PACE_HZ,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            conflate: false,
        }
    }

    pub fn with_pace_hz(mut self, pace_hz: u32) -> Self {
        self.pace_hz = pace_hz;
        self
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn with_conflate(mut self, conflate: bool) -> Self {
        self.conflate = conflate;
        self
    }

    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionStats {
    pub sent: u64,
    pub received: u64,
    pub decode_failures: u64,
    pub partials: u64,
}

/// Owns the direct-link sockets for their whole lifetime and drives the
/// producer and consumer as two tasks. Both sockets are closed on every
/// exit path, including cancellation; dropping the close channel's sender
/// cancels the session.
pub struct Session;

impl Session {
    pub async fn run(
        config: SessionConfig,
        catalog: Arc<Catalog>,
        source: Box<dyn SampleSource>,
        dispatcher: Dispatcher,
        mut close_rx: mpsc::Receiver<()>,
    ) -> Result<SessionStats> {
        let mut send_endpoint = Endpoint::bind(SocketAddr::new(config.bind_addr.ip(), 0))?
            .with_label(GROUP_DIRECT);
        send_endpoint.connect(config.peer_addr);
        let recv_endpoint = Endpoint::bind(config.bind_addr)?.with_label(GROUP_DIRECT);

        log::info!(
            "session up: recv {}, peer {}",
            config.bind_addr,
            config.peer_addr
        );

        // Single-owner discipline on the send socket: a whole burst is
        // emitted under one lock acquisition.
        let sender = Arc::new(Mutex::new(send_endpoint));

        let (close_producer_tx, close_producer_rx) = mpsc::channel(1);
        let (close_consumer_tx, close_consumer_rx) = mpsc::channel(1);

        let producer = tokio::spawn(produce_loop(
            config.clone(),
            Arc::clone(&catalog),
            Arc::clone(&sender),
            source,
            close_producer_rx,
        ));
        let consumer = tokio::spawn(consume_loop(
            config,
            catalog,
            recv_endpoint,
            dispatcher,
            close_consumer_rx,
        ));

        // Fan the external close signal out to both tasks.
        let relay_producer = close_producer_tx.clone();
        let relay_consumer = close_consumer_tx.clone();
        let relay = tokio::spawn(async move {
            let _ = close_rx.recv().await;
            let _ = relay_producer.send(()).await;
            let _ = relay_consumer.send(()).await;
        });

        // The producer ends the session: when it stops (end of source,
        // cancellation, error), the consumer is told to wind down too.
        let produced = producer.await;
        let _ = close_consumer_tx.send(()).await;
        let consumed = consumer.await;
        relay.abort();

        let sent =
            produced.map_err(|e| Error::Other(format!("producer task failed: {e}")))??;
        let (received, decode_failures, partials) =
            consumed.map_err(|e| Error::Other(format!("consumer task failed: {e}")))??;

        log::info!("session closed: sent {sent}, received {received}");
        Ok(SessionStats {
            sent,
            received,
            decode_failures,
            partials,
        })
    }
}

async fn produce_loop(
    config: SessionConfig,
    catalog: Arc<Catalog>,
    sender: Arc<Mutex<Endpoint>>,
    mut source: Box<dyn SampleSource>,
    mut close_rx: mpsc::Receiver<()>,
) -> Result<u64> {
    let mut fragmenter = Fragmenter::with_chunk(config.chunk)?;
    let period = Duration::from_secs(1) / config.pace_hz.max(1);
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    let mut sent = 0u64;
    loop {
        tokio::select! {
            _ = close_rx.recv() => break,
            _ = ticker.tick() => {}
        }

        let record = tokio::select! {
            _ = close_rx.recv() => break,
            res = source.next_sample() => match res? {
                Some(record) => record,
                None => break,
            }
        };

        let payload = wire::encode(&catalog, &record)?;
        let (uid, fragments) = fragmenter.split(payload);

        // Critical section: no other burst may interleave on this socket
        // between our start and end fragments.
        {
            let endpoint = sender.lock().await;
            for fragment in &fragments {
                endpoint.send(&fragment.marshal()).await?;
            }
        }

        sent += 1;
        log::trace!("sent burst uid {uid} ({} fragments)", fragments.len());
    }

    log::info!("producer exiting after {sent} records");
    Ok(sent)
}

async fn consume_loop(
    config: SessionConfig,
    catalog: Arc<Catalog>,
    endpoint: Endpoint,
    dispatcher: Dispatcher,
    mut close_rx: mpsc::Receiver<()>,
) -> Result<(u64, u64, u64)> {
    let mut reassembler = Reassembler::new();
    let mut received = 0u64;
    let mut decode_failures = 0u64;
    let mut partials = 0u64;

    loop {
        let datagram = tokio::select! {
            _ = close_rx.recv() => break,
            res = recv_one(&endpoint, &config) => match res {
                Ok(datagram) => datagram,
                Err(transport::Error::ErrTimeout) => continue,
                Err(e) => return Err(e.into()),
            }
        };

        for delivery in reassembler.feed(&datagram) {
            match delivery {
                Delivery::Complete(payload) => match wire::decode(&catalog, payload) {
                    Ok(record) => {
                        received += 1;
                        dispatcher.dispatch(record).await;
                    }
                    Err(e) => {
                        // Not fatal: drop the record, the framer is back
                        // in its idle state already.
                        decode_failures += 1;
                        log::warn!("dropping undecodable message: {e}");
                    }
                },
                Delivery::Partial(bytes) => {
                    partials += 1;
                    dispatcher.partial(bytes).await;
                }
            }
        }
    }

    let stats = reassembler.stats();
    log::info!(
        "consumer exiting: {received} records, {} corrupted, {} partials",
        stats.corrupted,
        partials
    );
    Ok((received, decode_failures, partials))
}

async fn recv_one(endpoint: &Endpoint, config: &SessionConfig) -> transport::Result<bytes::Bytes> {
    if config.conflate {
        endpoint.recv_latest(config.recv_timeout).await
    } else {
        endpoint.recv(config.recv_timeout).await
    }
}
