//! Transport layer for the session server.
//!
//! HTTP is the only transport; it serves the login API.

pub mod http;

pub use http::HttpTransport;

use crate::error::DbResult;
use std::future::Future;

/// Trait for server transports.
pub trait Transport: Send + Sync {
    /// Start the transport and begin handling requests.
    ///
    /// This method should block until the transport is shut down.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}
