//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use forward_proxy::{ProxyConfig, ProxyServer, Shutdown};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::{client::TlsStream, TlsConnector};

/// A proxy serving on an ephemeral port; stops accepting when dropped.
pub struct RunningProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a plain-HTTP proxy with the given auth specification.
pub async fn start_proxy(credentials: &str) -> RunningProxy {
    let mut config = ProxyConfig::default();
    config.auth.credentials = credentials.to_string();
    start_proxy_with(config).await
}

pub async fn start_proxy_with(config: ProxyConfig) -> RunningProxy {
    let server = ProxyServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningProxy { addr, shutdown }
}

/// Path of a file under `tests/fixtures`.
///
/// `ca.crt` is a test CA; `localhost.crt`/`localhost.key` is a leaf it signed
/// for `localhost` and `127.0.0.1`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

async fn localhost_tls() -> RustlsConfig {
    RustlsConfig::from_pem_file(fixture("localhost.crt"), fixture("localhost.key"))
        .await
        .unwrap()
}

/// Start a TLS-terminating proxy using the `localhost` fixture pair.
pub async fn start_tls_proxy(credentials: &str) -> RunningProxy {
    let mut config = ProxyConfig::default();
    config.auth.credentials = credentials.to_string();

    let server = ProxyServer::new(config).unwrap();
    let tls = localhost_tls().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run_tls(listener, tls, server_shutdown).await;
    });

    RunningProxy { addr, shutdown }
}

/// Open a TLS connection to `addr`, trusting only the fixture CA.
pub async fn tls_connect(addr: SocketAddr) -> TlsStream<TcpStream> {
    let mut roots = rustls::RootCertStore::empty();
    let ca = std::fs::read(fixture("ca.crt")).unwrap();
    for cert in rustls_pemfile::certs(&mut ca.as_slice()) {
        roots.add(cert.unwrap()).unwrap();
    }
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let tcp = TcpStream::connect(addr).await.unwrap();
    let name = rustls::pki_types::ServerName::try_from("localhost").unwrap();
    TlsConnector::from(Arc::new(config))
        .connect(name, tcp)
        .await
        .unwrap()
}

/// Start a raw TCP origin that echoes every byte back, then closes.
pub async fn start_echo_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut rd, mut wr) = socket.split();
                let _ = tokio::io::copy(&mut rd, &mut wr).await;
                let _ = wr.shutdown().await;
            });
        }
    });

    addr
}

/// Start an HTTP origin.
///
/// - `GET /headers` lists every received header as `name: value` lines
/// - `GET /teapot` answers 418 with a repeated `x-origin` header
/// - `POST /echo` returns the request body
pub async fn start_http_origin() -> SocketAddr {
    let app = origin_app();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// Start the same origin behind TLS with the `localhost` fixture pair.
pub async fn start_https_origin() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let server = axum_server::from_tcp_rustls(listener, localhost_tls().await);
    tokio::spawn(async move {
        let _ = server.serve(origin_app().into_make_service()).await;
    });

    addr
}

fn origin_app() -> Router {
    Router::new()
        .route("/headers", get(list_headers))
        .route("/teapot", get(teapot))
        .route("/echo", post(|body: String| async move { body }))
}

async fn list_headers(headers: HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}\n", name, value.to_str().unwrap_or("<binary>")))
        .collect()
}

async fn teapot() -> impl IntoResponse {
    (
        StatusCode::IM_A_TEAPOT,
        AppendHeaders([("x-origin", "first"), ("x-origin", "second")]),
        "short and stout",
    )
}

/// Values of `name` in a `/headers` listing, in order.
pub fn header_values(listing: &str, name: &str) -> Vec<String> {
    let prefix = format!("{name}: ");
    listing
        .lines()
        .filter_map(|line| line.strip_prefix(&prefix))
        .map(str::to_string)
        .collect()
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A reqwest client that reaches plain HTTP origins through a TLS proxy.
pub fn tls_proxied_client(proxy: SocketAddr) -> reqwest::Client {
    let ca = std::fs::read(fixture("ca.crt")).unwrap();
    let proxy = reqwest::Proxy::http(format!("https://localhost:{}", proxy.port())).unwrap();
    reqwest::Client::builder()
        .proxy(proxy)
        .add_root_certificate(reqwest::Certificate::from_pem(&ca).unwrap())
        .build()
        .unwrap()
}

/// A reqwest client that sends plain HTTP through the proxy.
pub fn proxied_client(proxy: SocketAddr, credentials: Option<(&str, &str)>) -> reqwest::Client {
    let mut proxy = reqwest::Proxy::http(format!("http://{proxy}")).unwrap();
    if let Some((username, password)) = credentials {
        proxy = proxy.basic_auth(username, password);
    }
    reqwest::Client::builder().proxy(proxy).build().unwrap()
}

/// Send `CONNECT target` and read the response head.
pub async fn send_connect(
    proxy: SocketAddr,
    target: &str,
    headers: &[(&str, &str)],
) -> (TcpStream, String) {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    let head = connect_over(&mut stream, target, headers).await;
    (stream, head)
}

/// Write `CONNECT target` on an open stream and read the response head.
pub async fn connect_over<S>(stream: &mut S, target: &str, headers: &[(&str, &str)]) -> String
where
    S: AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();
    read_head(stream).await
}

/// Read up to and including the blank line ending a response head.
pub async fn read_head<S: AsyncRead + Unpin>(stream: &mut S) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = stream.read(&mut byte).await.unwrap();
        assert_ne!(n, 0, "connection closed before response head completed");
        head.push(byte[0]);
    }
    String::from_utf8(head).unwrap()
}

/// Status code from a response head.
pub fn status_of(head: &str) -> u16 {
    head.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("malformed status line")
}

/// Read a `Content-Length` delimited body following `head`.
pub async fn read_body<S: AsyncRead + Unpin>(stream: &mut S, head: &str) -> String {
    let length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).await.unwrap();
    String::from_utf8(body).unwrap()
}
