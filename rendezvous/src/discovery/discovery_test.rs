use tokio::time::timeout;

use super::*;

fn test_config(robot_port: u16, operator_port: u16) -> DiscoveryConfig {
    DiscoveryConfig {
        robot_port,
        operator_port,
        ping_interval: Duration::from_millis(200),
        recv_timeout: Duration::from_millis(200),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_both_sides_learn_each_other() {
    let config = test_config(19998, 19999);

    let robot_config = config.clone();
    let robot = tokio::spawn(async move {
        let (_tx, mut rx) = mpsc::channel(1);
        // Keep the close channel alive for the duration of discovery.
        let result = discover_operator(&robot_config, "10.0.0.1", &mut rx).await;
        drop(_tx);
        result
    });

    let operator_config = config;
    let operator = tokio::spawn(async move {
        let (_tx, mut rx) = mpsc::channel(1);
        let result = discover_robot(&operator_config, "10.0.0.2", &mut rx).await;
        drop(_tx);
        result
    });

    // Both peers must converge well inside four seconds.
    let operator_ip = timeout(Duration::from_secs(4), robot)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let robot_ip = timeout(Duration::from_secs(4), operator)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(operator_ip, "10.0.0.2");
    assert_eq!(robot_ip, "10.0.0.1");
}

#[tokio::test]
async fn test_close_interrupts_discovery() {
    let config = test_config(20998, 20999);

    let (close_tx, mut close_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = close_tx.send(()).await;
    });

    let res = discover_operator(&config, "10.0.0.1", &mut close_rx).await;
    assert_eq!(res, Err(Error::ErrClosed));
}

#[test]
fn test_peer_ip_extraction() {
    assert_eq!(
        peer_ip("PING from server: 192.168.1.7"),
        Some("192.168.1.7".to_owned())
    );
    assert_eq!(
        peer_ip("PING_RESPONSE from client: 10.1.2.3"),
        Some("10.1.2.3".to_owned())
    );
    assert_eq!(peer_ip("PING from server: "), None);
}
