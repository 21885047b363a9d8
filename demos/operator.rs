use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Arg, Command};
use robolink::peer::{AdHocNetwork, ExistingNetwork, OperatorPeer};
use robolink::sample::IdleSource;
use robolink::session::{Dispatcher, RecordHandler};
use robolink::wire::{Catalog, ImuSample, MjpegFrame, Record};
use tokio::sync::mpsc;

/// Prints a line every `report_every` frames instead of rendering.
struct FrameMeter {
    frames: AtomicU64,
    report_every: u64,
}

#[async_trait]
impl RecordHandler for FrameMeter {
    async fn handle(&self, record: Record) {
        let n = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.report_every == 0 {
            match MjpegFrame::try_from(&record) {
                Ok(frame) => println!("frame {n}: {} bytes", frame.mjpeg.len()),
                Err(e) => eprintln!("bad frame record: {e}"),
            }
        }
    }
}

struct ImuPrinter;

#[async_trait]
impl RecordHandler for ImuPrinter {
    async fn handle(&self, record: Record) {
        if let Ok(sample) = ImuSample::try_from(&record) {
            println!("imu: accel {:?} gyro {:?}", sample.accel_data, sample.gyro_data);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = Command::new("operator")
        .about("Find the robot and watch its telemetry stream")
        .arg(
            Arg::new("existing-network")
                .long("existing-network")
                .help("Skip the ad-hoc WiFi switch and stay on the current network"),
        )
        .arg(
            Arg::new("conflate")
                .long("conflate")
                .help("Keep only the newest datagram under backlog (realtime mode)"),
        )
        .get_matches();

    let catalog = Arc::new(Catalog::with_builtin_types());

    let (close_tx, close_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
        println!("interrupted, shutting down");
        let _ = close_tx.send(()).await;
    });

    let mut peer = OperatorPeer::new();
    peer.conflate = matches.is_present("conflate");

    let dispatcher = Dispatcher::new()
        .on(
            MjpegFrame::TYPE_NAME,
            Box::new(FrameMeter {
                frames: AtomicU64::new(0),
                report_every: 30,
            }),
        )
        .on(ImuSample::TYPE_NAME, Box::new(ImuPrinter));

    let result = if matches.is_present("existing-network") {
        peer.run(
            &ExistingNetwork,
            catalog,
            Box::new(IdleSource),
            dispatcher,
            close_rx,
        )
        .await
    } else {
        peer.run(
            &AdHocNetwork::system(),
            catalog,
            Box::new(IdleSource),
            dispatcher,
            close_rx,
        )
        .await
    };

    match result {
        Ok(stats) => println!("session finished: received {} records", stats.received),
        Err(e) => eprintln!("operator failed: {e}"),
    }
}
