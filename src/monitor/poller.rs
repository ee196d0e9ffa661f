//! Periodic polling of the latest environmental reading

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::{ApiError, GrowApi};
use crate::models::{ConnectionStatus, DashboardState, LogResponse, Reading};
use crate::utils::{fallback_snapshot, format_timestamp, live_snapshot};

/// Why a poll produced no live reading
#[derive(Debug)]
enum PollFailure {
    Api(ApiError),
    Malformed(String),
    Empty,
}

impl std::fmt::Display for PollFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollFailure::Api(e) => write!(f, "{}", e),
            PollFailure::Malformed(e) => write!(f, "Malformed newest log row: {}", e),
            PollFailure::Empty => write!(f, "No data received from API"),
        }
    }
}

/// Running poller
///
/// Dropping the handle aborts the task; [`Poller::stop`] additionally
/// waits for it to terminate.
pub struct Poller {
    handle: Option<JoinHandle<()>>,
    state: watch::Receiver<DashboardState>,
}

impl Poller {
    /// Spawn the polling task; the first request is issued immediately
    pub fn start<A: GrowApi>(api: Arc<A>, poll_interval: Duration) -> Self {
        let (tx, rx) = watch::channel(initial_state());
        let handle = tokio::spawn(run(api, poll_interval, tx));
        info!(
            "Reading poller started, interval {} s",
            poll_interval.as_secs()
        );
        Poller {
            handle: Some(handle),
            state: rx,
        }
    }

    /// Read-only view of the published state
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Cancel the timer and every in-flight request
    ///
    /// Returns once the task has terminated; nothing is published after.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            match handle.await {
                Err(e) if !e.is_cancelled() => error!("Poller task failed: {}", e),
                _ => info!("Reading poller stopped"),
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Reading poller dropped, aborting task");
            handle.abort();
        }
    }
}

pub fn initial_state() -> DashboardState {
    DashboardState {
        status: ConnectionStatus::Loading,
        current: fallback_snapshot(),
        last_good: None,
        last_applied_seq: 0,
    }
}

async fn run<A: GrowApi>(api: Arc<A>, poll_interval: Duration, tx: watch::Sender<DashboardState>) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight = JoinSet::new();
    let mut next_seq: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                next_seq += 1;
                let seq = next_seq;
                let api = Arc::clone(&api);
                debug!("Issuing poll #{}", seq);
                in_flight.spawn(async move { (seq, api.latest_log().await) });
            }
            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok((seq, result)) => {
                        tx.send_if_modified(|state| apply_poll(state, seq, result));
                    }
                    Err(e) => error!("Poll task failed: {}", e),
                }
            }
        }
    }
}

/// Fold one poll result into the published state
///
/// Failures are logged first, stale or not. Results older than the last
/// applied poll are then dropped so the most recently fired request wins
/// regardless of completion order. Returns whether the state changed.
fn apply_poll(
    state: &mut DashboardState,
    seq: u64,
    result: Result<LogResponse, ApiError>,
) -> bool {
    let outcome = latest_reading(result);
    if let Err(e) = &outcome {
        error!("Error fetching log data (poll #{}): {}", seq, e);
    }

    if seq <= state.last_applied_seq {
        debug!(
            "Discarding stale poll #{} (already applied #{})",
            seq, state.last_applied_seq
        );
        return false;
    }
    state.last_applied_seq = seq;

    match outcome {
        Ok(reading) => {
            let snapshot = live_snapshot(&reading);
            info!(
                "Reading #{} at {}: temp={:.1}°C, humidity={:.0}%, vpd={:.2} kPa",
                reading.id,
                format_timestamp(&reading.timestamp),
                snapshot.temperature,
                snapshot.humidity,
                snapshot.vpd
            );
            state.status = ConnectionStatus::Connected;
            state.last_good = Some(snapshot.clone());
            state.current = snapshot;
        }
        Err(_) => {
            warn!("Using fallback values until the API responds");
            state.status = ConnectionStatus::Disconnected;
            state.current = fallback_snapshot();
        }
    }
    true
}

fn latest_reading(result: Result<LogResponse, ApiError>) -> Result<Reading, PollFailure> {
    let log = result.map_err(PollFailure::Api)?;
    log.newest()
        .map_err(|e| PollFailure::Malformed(e.to_string()))?
        .ok_or(PollFailure::Empty)
}
