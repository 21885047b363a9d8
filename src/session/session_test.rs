use std::net::Ipv4Addr;

use tokio::time::timeout;
use wire::{MjpegFrame, Value};

use super::*;
use crate::sample::{IdleSource, ScriptedSource, SyntheticImu};

fn localhost() -> IpAddr {
    Ipv4Addr::LOCALHOST.into()
}

/// Robot/operator config pair on test-local ports.
fn config_pair(robot_port: u16, operator_port: u16) -> (SessionConfig, SessionConfig) {
    let robot = SessionConfig {
        bind_addr: SocketAddr::new(localhost(), robot_port),
        peer_addr: SocketAddr::new(localhost(), operator_port),
        chunk: DEFAULT_CHUNK,
        pace_hz: DEFAULT_PACE_HZ,
        recv_timeout: Duration::from_millis(200),
        conflate: false,
    };
    let operator = SessionConfig {
        bind_addr: SocketAddr::new(localhost(), operator_port),
        peer_addr: SocketAddr::new(localhost(), robot_port),
        chunk: DEFAULT_CHUNK,
        pace_hz: DEFAULT_PACE_HZ,
        recv_timeout: Duration::from_millis(200),
        conflate: false,
    };
    (robot, operator)
}

struct ForwardingHandler {
    tx: mpsc::Sender<Record>,
}

#[async_trait]
impl RecordHandler for ForwardingHandler {
    async fn handle(&self, record: Record) {
        let _ = self.tx.send(record).await;
    }
}

#[tokio::test]
async fn test_records_flow_end_to_end() {
    let (robot_config, operator_config) = config_pair(25998, 25999);
    let catalog = Arc::new(Catalog::with_builtin_types());

    let (record_tx, mut record_rx) = mpsc::channel(16);
    let dispatcher = Dispatcher::new().on(
        wire::ImuSample::TYPE_NAME,
        Box::new(ForwardingHandler { tx: record_tx }),
    );

    // Operator: consume-only until cancelled.
    let (operator_close_tx, operator_close_rx) = mpsc::channel(1);
    let operator_catalog = Arc::clone(&catalog);
    let operator = tokio::spawn(Session::run(
        operator_config,
        operator_catalog,
        Box::new(IdleSource),
        dispatcher,
        operator_close_rx,
    ));

    // Give the operator's receive socket a moment to bind.
    time::sleep(Duration::from_millis(100)).await;

    // Robot: five IMU samples, then end of source.
    let mut imu = SyntheticImu::new();
    let mut records = vec![];
    for _ in 0..5 {
        records.push(imu.next_sample().await.unwrap().unwrap());
    }
    let (_robot_close_tx, robot_close_rx) = mpsc::channel(1);
    let robot_stats = Session::run(
        robot_config,
        Arc::clone(&catalog),
        Box::new(ScriptedSource::new(records.clone())),
        Dispatcher::new(),
        robot_close_rx,
    )
    .await
    .unwrap();
    assert_eq!(robot_stats.sent, 5);

    // All five arrive typed and in order.
    for expected in &records {
        let got = timeout(Duration::from_secs(2), record_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&got, expected);
    }

    operator_close_tx.send(()).await.unwrap();
    let operator_stats = timeout(Duration::from_secs(2), operator)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(operator_stats.received, 5);
    assert_eq!(operator_stats.decode_failures, 0);
}

#[tokio::test]
async fn test_large_frame_crosses_fragmentation() {
    let (robot_config, operator_config) = config_pair(26998, 26999);
    let catalog = Arc::new(Catalog::with_builtin_types());

    let (record_tx, mut record_rx) = mpsc::channel(4);
    let dispatcher = Dispatcher::new().on(
        MjpegFrame::TYPE_NAME,
        Box::new(ForwardingHandler { tx: record_tx }),
    );

    let (operator_close_tx, operator_close_rx) = mpsc::channel(1);
    let operator = tokio::spawn(Session::run(
        operator_config,
        Arc::clone(&catalog),
        Box::new(IdleSource),
        dispatcher,
        operator_close_rx,
    ));
    time::sleep(Duration::from_millis(100)).await;

    // Well past one chunk: the burst is start/middle*/end.
    let frame = MjpegFrame {
        brightness: 128,
        exposure: 3,
        mjpeg: bytes::Bytes::from(vec![0xab; 3 * DEFAULT_CHUNK]),
    };
    let (_robot_close_tx, robot_close_rx) = mpsc::channel(1);
    Session::run(
        robot_config,
        Arc::clone(&catalog),
        Box::new(ScriptedSource::new(vec![frame.to_record()])),
        Dispatcher::new(),
        robot_close_rx,
    )
    .await
    .unwrap();

    let got = timeout(Duration::from_secs(2), record_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let got_frame = MjpegFrame::try_from(&got).unwrap();
    assert_eq!(got_frame, frame);
    match got.get("mjpeg") {
        Some(Value::Raw(raw)) => assert_eq!(raw.len(), 3 * DEFAULT_CHUNK),
        other => panic!("unexpected mjpeg field: {other:?}"),
    }

    operator_close_tx.send(()).await.unwrap();
    timeout(Duration::from_secs(2), operator)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_undecodable_record_is_not_fatal() {
    use wire::{FieldKind, FieldSpec, TypeDescriptor, Value};

    let (robot_config, operator_config) = config_pair(29998, 29999);

    // The robot knows one extra type the operator does not.
    let mut robot_catalog = Catalog::with_builtin_types();
    robot_catalog
        .register(
            TypeDescriptor::new(
                "Heartbeat",
                vec![FieldKind::U32],
                vec![FieldSpec::new("seq", 0)],
            )
            .unwrap(),
        )
        .unwrap();
    let robot_catalog = Arc::new(robot_catalog);
    let operator_catalog = Arc::new(Catalog::with_builtin_types());

    let (record_tx, mut record_rx) = mpsc::channel(4);
    let dispatcher = Dispatcher::new().on(
        wire::ImuSample::TYPE_NAME,
        Box::new(ForwardingHandler { tx: record_tx }),
    );

    let (operator_close_tx, operator_close_rx) = mpsc::channel(1);
    let operator = tokio::spawn(Session::run(
        operator_config,
        operator_catalog,
        Box::new(IdleSource),
        dispatcher,
        operator_close_rx,
    ));
    time::sleep(Duration::from_millis(100)).await;

    // An unknown record first, then a known one: the first is dropped,
    // the session keeps going.
    let heartbeat = Record::new("Heartbeat").with_field("seq", 0, Value::U32(1));
    let imu = SyntheticImu::new().next_sample().await.unwrap().unwrap();
    let (_robot_close_tx, robot_close_rx) = mpsc::channel(1);
    Session::run(
        robot_config,
        robot_catalog,
        Box::new(ScriptedSource::new(vec![heartbeat, imu.clone()])),
        Dispatcher::new(),
        robot_close_rx,
    )
    .await
    .unwrap();

    let got = timeout(Duration::from_secs(2), record_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got, imu);

    operator_close_tx.send(()).await.unwrap();
    let stats = timeout(Duration::from_secs(2), operator)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(stats.received, 1);
    assert_eq!(stats.decode_failures, 1);
}

#[tokio::test]
async fn test_cancellation_stops_an_infinite_producer() {
    let (robot_config, _) = config_pair(27998, 27999);
    let catalog = Arc::new(Catalog::with_builtin_types());

    let (close_tx, close_rx) = mpsc::channel(1);
    let session = tokio::spawn(Session::run(
        robot_config,
        catalog,
        Box::new(SyntheticImu::new()),
        Dispatcher::new(),
        close_rx,
    ));

    time::sleep(Duration::from_millis(200)).await;
    close_tx.send(()).await.unwrap();

    let stats = timeout(Duration::from_secs(2), session)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(stats.sent > 0);
}

#[tokio::test]
async fn test_dropping_close_sender_cancels() {
    let (robot_config, _) = config_pair(28998, 28999);
    let catalog = Arc::new(Catalog::with_builtin_types());

    let (close_tx, close_rx) = mpsc::channel(1);
    let session = tokio::spawn(Session::run(
        robot_config,
        catalog,
        Box::new(SyntheticImu::new()),
        Dispatcher::new(),
        close_rx,
    ));

    time::sleep(Duration::from_millis(100)).await;
    drop(close_tx);

    let stats = timeout(Duration::from_secs(2), session)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(stats.sent > 0);
}
