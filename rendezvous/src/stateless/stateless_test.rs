use std::net::{Ipv4Addr, SocketAddr};

use tokio::time::timeout;

use super::*;

fn loopback() -> SocketAddr {
    SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)
}

fn params() -> LinkParameters {
    LinkParameters::new("robot_wifi", "192.168.2.1", "192.168.2.2")
}

async fn endpoint_pair() -> (Endpoint, Endpoint) {
    let mut a = Endpoint::bind(loopback()).unwrap();
    let mut b = Endpoint::bind(loopback()).unwrap();
    let a_addr = a.local_addr().unwrap();
    let b_addr = b.local_addr().unwrap();
    a.connect(b_addr);
    b.connect(a_addr);
    (a, b)
}

#[tokio::test]
async fn test_offer_and_accept() {
    // robot_out -> operator_in, operator_out -> robot_in
    let (robot_out, operator_in) = endpoint_pair().await;
    let (operator_out, robot_in) = endpoint_pair().await;

    let operator = tokio::spawn(async move {
        let catalog = Catalog::with_builtin_types();
        let (_tx, mut rx) = tokio::sync::mpsc::channel(1);
        let got = await_link_parameters(
            &operator_out,
            &operator_in,
            &catalog,
            Duration::from_millis(500),
            &mut rx,
        )
        .await;
        drop(_tx);
        got
    });

    let catalog = Catalog::with_builtin_types();
    let (_tx, mut rx) = tokio::sync::mpsc::channel(1);
    timeout(
        Duration::from_secs(5),
        offer_link_parameters(
            &robot_out,
            &robot_in,
            &params(),
            &catalog,
            Duration::from_millis(500),
            &mut rx,
        ),
    )
    .await
    .unwrap()
    .unwrap();

    let got = timeout(Duration::from_secs(5), operator)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(got, params());
}

#[tokio::test]
async fn test_garbage_object_gets_nacked_then_recovers() {
    let (robot_out, operator_in) = endpoint_pair().await;
    let (operator_out, robot_in) = endpoint_pair().await;

    // Something that is not a record lands on the operator first.
    let mut intruder = Endpoint::bind(loopback()).unwrap();
    intruder.connect(operator_in.local_addr().unwrap());
    intruder.send(b"not a record").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let operator = tokio::spawn(async move {
        let catalog = Catalog::with_builtin_types();
        let (_tx, mut rx) = tokio::sync::mpsc::channel(1);
        let got = await_link_parameters(
            &operator_out,
            &operator_in,
            &catalog,
            Duration::from_millis(500),
            &mut rx,
        )
        .await;
        drop(_tx);
        got
    });

    let catalog = Catalog::with_builtin_types();
    let (_tx, mut rx) = tokio::sync::mpsc::channel(1);
    timeout(
        Duration::from_secs(5),
        offer_link_parameters(
            &robot_out,
            &robot_in,
            &params(),
            &catalog,
            Duration::from_millis(500),
            &mut rx,
        ),
    )
    .await
    .unwrap()
    .unwrap();

    let got = timeout(Duration::from_secs(5), operator)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(got, params());
}

#[tokio::test]
async fn test_close_interrupts_offer() {
    let (robot_out, _other_end) = endpoint_pair().await;
    let (_operator_out, robot_in) = endpoint_pair().await;

    let catalog = Catalog::with_builtin_types();
    let (close_tx, mut close_rx) = tokio::sync::mpsc::channel(1);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = close_tx.send(()).await;
    });

    let res = offer_link_parameters(
        &robot_out,
        &robot_in,
        &params(),
        &catalog,
        Duration::from_secs(5),
        &mut close_rx,
    )
    .await;
    assert_eq!(res, Err(Error::ErrClosed));
}
