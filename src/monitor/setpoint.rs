//! Read and write of the temperature/humidity setpoints

use log::{error, info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{Duration, Instant};

use crate::api::{ApiError, GrowApi};
use crate::models::Setpoint;

pub const MSG_INVALID: &str = "Please enter valid values.";
pub const MSG_UPDATED: &str = "Setpoints updated successfully!";
pub const MSG_UPDATE_FAILED: &str = "Could not update setpoints.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetpointError {
    /// Rejected locally, nothing was sent
    #[error("Invalid setpoint: {0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: &'static str,
    expires_at: Option<Instant>,
}

/// Single-owner cache of the remote setpoints plus the operator's draft
pub struct SetpointSync<A> {
    api: Arc<A>,
    cached: Setpoint,
    draft: Setpoint,
    editing: bool,
    message: Option<StatusMessage>,
    message_ttl: Duration,
}

impl<A: GrowApi> SetpointSync<A> {
    pub fn new(api: Arc<A>, message_ttl: Duration) -> Self {
        SetpointSync {
            api,
            cached: Setpoint::default(),
            draft: Setpoint::default(),
            editing: false,
            message: None,
            message_ttl,
        }
    }

    pub fn cached(&self) -> Setpoint {
        self.cached
    }

    /// Values currently shown to the operator
    pub fn draft(&self) -> Setpoint {
        self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Current status message, if it has not expired yet
    pub fn message(&self) -> Option<&'static str> {
        let message = self.message.as_ref()?;
        match message.expires_at {
            Some(deadline) if Instant::now() >= deadline => None,
            _ => Some(message.text),
        }
    }

    /// Load the remote setpoints into the cache and the draft
    ///
    /// On failure the previous cache stays in effect.
    pub async fn fetch_setpoint(&mut self) -> Result<Setpoint, SetpointError> {
        match self.api.setpoint().await {
            Ok(setpoint) => {
                info!(
                    "Current setpoints: temp={:.1}°C, humidity={:.0}%",
                    setpoint.temperature_target, setpoint.humidity_target
                );
                self.cached = setpoint;
                self.draft = setpoint;
                Ok(setpoint)
            }
            Err(e) => {
                error!("Error fetching setpoint: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn begin_edit(&mut self) {
        self.draft = self.cached;
        self.editing = true;
        self.message = None;
    }

    /// Validate and send `buffer` as the new setpoints
    ///
    /// The buffer is kept as the draft whatever the outcome, so a failed
    /// save can be retried as is.
    pub async fn save_edit(&mut self, buffer: Setpoint) -> Result<(), SetpointError> {
        self.draft = buffer;

        if !buffer.temperature_target.is_finite() || !buffer.humidity_target.is_finite() {
            warn!("Rejected setpoints {:?}: not a number", buffer);
            self.set_message(MSG_INVALID, false);
            return Err(SetpointError::Validation(format!(
                "temperature {} / humidity {}",
                buffer.temperature_target, buffer.humidity_target
            )));
        }

        match self.api.put_setpoint(buffer).await {
            Ok(()) => {
                info!(
                    "Setpoints updated: temp={:.1}°C, humidity={:.0}%",
                    buffer.temperature_target, buffer.humidity_target
                );
                self.cached = buffer;
                self.editing = false;
                self.set_message(MSG_UPDATED, true);
                Ok(())
            }
            Err(e) => {
                match &e {
                    ApiError::Server(status) => {
                        error!("Error updating setpoint: server returned {}", status)
                    }
                    _ => error!("Error updating setpoint: {}", e),
                }
                self.set_message(MSG_UPDATE_FAILED, false);
                Err(e.into())
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.draft = self.cached;
        self.editing = false;
        self.message = None;
    }

    fn set_message(&mut self, text: &'static str, transient: bool) {
        let expires_at = transient.then(|| Instant::now() + self.message_ttl);
        self.message = Some(StatusMessage { text, expires_at });
    }
}
