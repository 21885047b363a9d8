use std::sync::Arc;

use clap::{Arg, Command};
use robolink::peer::{AdHocNetwork, ExistingNetwork, RobotPeer};
use robolink::sample::SyntheticCamera;
use robolink::session::Dispatcher;
use robolink::wire::{Catalog, LinkParameters};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = Command::new("robot")
        .about("Announce this host as the robot and stream synthetic camera frames")
        .arg(
            Arg::new("existing-network")
                .long("existing-network")
                .help("Skip the ad-hoc WiFi switch and stay on the current network"),
        )
        .arg(
            Arg::new("ssid")
                .long("ssid")
                .takes_value(true)
                .default_value("robot_wifi")
                .help("Name of the ad-hoc network to create"),
        )
        .arg(
            Arg::new("frame-bytes")
                .long("frame-bytes")
                .takes_value(true)
                .default_value("16384")
                .help("Synthetic frame payload size"),
        )
        .get_matches();

    let ssid = matches.value_of("ssid").unwrap();
    let frame_bytes: usize = matches
        .value_of("frame-bytes")
        .unwrap()
        .parse()
        .expect("frame-bytes must be a number");

    let params = LinkParameters::new(ssid, "192.168.2.1", "192.168.2.2");
    let catalog = Arc::new(Catalog::with_builtin_types());

    let (close_tx, close_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
        println!("interrupted, shutting down");
        let _ = close_tx.send(()).await;
    });

    let peer = RobotPeer::new(params);
    let source = Box::new(SyntheticCamera::new(frame_bytes));
    let dispatcher = Dispatcher::new();

    let result = if matches.is_present("existing-network") {
        peer.run(&ExistingNetwork, catalog, source, dispatcher, close_rx)
            .await
    } else {
        peer.run(
            &AdHocNetwork::system(),
            catalog,
            source,
            dispatcher,
            close_rx,
        )
        .await
    };

    match result {
        Ok(stats) => println!("session finished: sent {} records", stats.sent),
        Err(e) => eprintln!("robot failed: {e}"),
    }
}
