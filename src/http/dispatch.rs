//! Request dispatcher.
//!
//! Every inbound request passes through [`dispatch`]:
//!
//! ```text
//! RECEIVED → AUTH_CHECKED ─┬─ denied ─→ FORBIDDEN (403)
//!                          └─ admitted → DISPATCHED ─┬─ CONNECT → TUNNELED
//!                                                    └─ other   → FORWARDED
//! ```
//!
//! Each terminal state produces exactly one response and nothing else
//! happens for that request afterwards.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::forward;
use crate::http::server::AppState;
use crate::tunnel;

/// Where an admitted request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Relay as a plain HTTP request/response.
    Forward,
    /// Open a raw byte tunnel.
    Tunnel,
}

impl Route {
    pub fn classify(method: &Method) -> Self {
        if method == Method::CONNECT {
            Route::Tunnel
        } else {
            Route::Forward
        }
    }
}

/// Entry point for every proxied request.
pub async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    if !state.gate.admit(request.headers()) {
        tracing::warn!(
            peer = %peer,
            method = %request.method(),
            uri = %request.uri(),
            "Proxy authentication failed"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    match Route::classify(request.method()) {
        Route::Tunnel => tunnel::handle_connect(request, state.tunnel).await,
        Route::Forward => {
            forward::forward(&state.client, peer, request, state.timeouts.request()).await
        }
    }
}
