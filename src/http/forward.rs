//! Plain HTTP forwarding.
//!
//! # Responsibilities
//! - Build the outbound copy of an absolute-form proxy request
//! - Append the client IP to `X-Forwarded-For`
//! - Strip proxy-hop headers so credentials never reach the origin
//! - Stream the origin response back unchanged
//! - Reach `https://` origins over rustls
//!
//! # Design Decisions
//! - Any transport failure (connect, timeout, protocol) becomes a bodyless 502
//! - Response bodies are never buffered
//! - No retries

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{HeaderName, PROXY_AUTHORIZATION},
        HeaderValue, Request, StatusCode,
    },
    response::{IntoResponse, Response},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

/// Client used for origin round trips.
pub type OriginClient = Client<HttpsConnector<HttpConnector>, Body>;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers addressed to this proxy rather than the origin.
const PROXY_HOP_HEADERS: [HeaderName; 2] = [
    PROXY_AUTHORIZATION,
    HeaderName::from_static("proxy-connection"),
];

/// Origin round-trip failure.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("origin request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("origin did not respond within {0:?}")]
    Timeout(Duration),
}

/// Build the origin client: plain TCP for `http://`, TLS for `https://`.
pub fn origin_client(connect_timeout: Option<Duration>, tls: rustls::ClientConfig) -> OriginClient {
    let mut http = HttpConnector::new();
    http.set_connect_timeout(connect_timeout);
    http.enforce_http(false);

    let https = HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(https)
}

/// Build the request sent to the origin.
///
/// Method, URI, version, headers and body are carried over; the peer's IP
/// (port stripped) is appended to any existing `X-Forwarded-For` values.
pub fn outbound_request(inbound: Request<Body>, peer: SocketAddr) -> Request<Body> {
    let (parts, body) = inbound.into_parts();

    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method;
    *outbound.uri_mut() = parts.uri;
    *outbound.version_mut() = parts.version;
    *outbound.headers_mut() = parts.headers;

    let headers = outbound.headers_mut();
    for name in &PROXY_HOP_HEADERS {
        headers.remove(name);
    }
    if let Ok(ip) = HeaderValue::from_str(&peer.ip().to_string()) {
        headers.append(X_FORWARDED_FOR, ip);
    }

    outbound
}

/// Perform the origin round trip, bounded by `deadline` when set.
pub async fn round_trip(
    client: &OriginClient,
    request: Request<Body>,
    deadline: Option<Duration>,
) -> Result<Response, ForwardError> {
    let response = match deadline {
        Some(limit) => tokio::time::timeout(limit, client.request(request))
            .await
            .map_err(|_| ForwardError::Timeout(limit))??,
        None => client.request(request).await?,
    };

    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}

/// Forward an admitted non-CONNECT request and produce the client response.
pub async fn forward(
    client: &OriginClient,
    peer: SocketAddr,
    request: Request<Body>,
    deadline: Option<Duration>,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let outbound = outbound_request(request, peer);

    match round_trip(client, outbound, deadline).await {
        Ok(response) => {
            tracing::debug!(
                peer = %peer,
                method = %method,
                uri = %uri,
                status = response.status().as_u16(),
                "Forwarded request"
            );
            response
        }
        Err(e) => {
            tracing::warn!(peer = %peer, method = %method, uri = %uri, error = %e, "Origin unreachable");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
