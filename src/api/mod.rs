pub mod connection;
pub mod operations;

use std::future::Future;
use thiserror::Error;

use crate::models::{LogResponse, Setpoint};

pub use connection::HttpApi;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Transport failure: connect, timeout, interrupted body
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Server responded with status {0}")]
    Server(u16),
    #[error("Malformed response body: {0}")]
    Malformed(String),
}

/// Remote grow API as seen by the poller and the setpoint synchronizer
pub trait GrowApi: Send + Sync + 'static {
    /// `GET /api/log`
    fn latest_log(&self) -> impl Future<Output = Result<LogResponse, ApiError>> + Send;

    /// `GET /api/setpoint`
    fn setpoint(&self) -> impl Future<Output = Result<Setpoint, ApiError>> + Send;

    /// `PUT /api/setpoint`; only the status of the response matters
    fn put_setpoint(&self, setpoint: Setpoint)
        -> impl Future<Output = Result<(), ApiError>> + Send;
}
