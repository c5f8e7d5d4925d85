//! Raw-stream upgrade capability.
//!
//! A tunnel needs exclusive control of the client's connection once the
//! CONNECT handshake is acknowledged. Whether the serving connection can
//! hand that over is a property of the server stack, so it is checked
//! explicitly instead of assumed.

use axum::http::Request;
use hyper::upgrade::OnUpgrade;

/// Something that may be able to surrender its underlying connection.
pub trait RawUpgrade {
    /// Take the pending upgrade, if the serving connection offers one.
    ///
    /// The returned future resolves to the raw stream once the response to
    /// this request has been written out.
    fn take_raw_upgrade(&mut self) -> Option<OnUpgrade>;
}

impl<B> RawUpgrade for Request<B> {
    fn take_raw_upgrade(&mut self) -> Option<OnUpgrade> {
        self.extensions_mut().remove::<OnUpgrade>()
    }
}
