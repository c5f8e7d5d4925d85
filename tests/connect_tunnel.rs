//! CONNECT tunnelling through the proxy.

use std::time::Duration;

use forward_proxy::ProxyConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

mod common;

#[tokio::test]
async fn tunnel_relays_bytes_unmodified_both_ways() {
    let origin = common::start_echo_origin().await;
    let proxy = common::start_proxy("").await;

    let (stream, head) = common::send_connect(proxy.addr, &origin.to_string(), &[]).await;
    assert_eq!(common::status_of(&head), 200);
    assert!(head.starts_with("HTTP/1.1 200 Connection established\r\n"));

    let payload: Vec<u8> = (0..128 * 1024).map(|i| (i % 251) as u8).collect();
    let (mut rd, mut wr) = stream.into_split();
    let outgoing = payload.clone();
    let writer = tokio::spawn(async move {
        wr.write_all(&outgoing).await.unwrap();
        wr.shutdown().await.unwrap();
    });

    let mut echoed = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), rd.read_to_end(&mut echoed))
        .await
        .expect("tunnel should close after both sides finish")
        .unwrap();
    writer.await.unwrap();

    assert_eq!(echoed, payload);
}

#[tokio::test]
async fn tunnel_supports_interactive_exchange() {
    let origin = common::start_echo_origin().await;
    let proxy = common::start_proxy("").await;

    let (mut stream, head) = common::send_connect(proxy.addr, &origin.to_string(), &[]).await;
    assert_eq!(common::status_of(&head), 200);

    let messages: [&[u8]; 3] = [b"\x16\x03\x01 client hello", b"ping", b"GET / HTTP/1.1\r\n\r\n"];
    for message in messages {
        stream.write_all(message).await.unwrap();
        let mut reply = vec![0u8; message.len()];
        stream.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, message);
    }
}

#[tokio::test]
async fn unreachable_target_is_503_without_acknowledgement() {
    let dead = common::unused_addr().await;
    let proxy = common::start_proxy("").await;

    let (mut stream, head) = common::send_connect(proxy.addr, &dead.to_string(), &[]).await;

    assert!(!head.starts_with("HTTP/1.1 200"));
    assert_eq!(common::status_of(&head), 503);
    let body = common::read_body(&mut stream, &head).await;
    assert!(body.starts_with(&format!("dial tcp {dead}: ")), "body was {body:?}");
}

#[tokio::test]
async fn dial_timeout_is_503() {
    let mut config = ProxyConfig::default();
    config.timeouts.connect_secs = Some(1);
    let proxy = common::start_proxy_with(config).await;

    // TEST-NET-1 is unroutable; the dial either times out or fails outright.
    let (_stream, head) = common::send_connect(proxy.addr, "192.0.2.1:443", &[]).await;
    assert_eq!(common::status_of(&head), 503);
}
