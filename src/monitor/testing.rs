//! Scripted in-memory API for poller and synchronizer tests
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::{sleep, Duration};

use crate::api::{ApiError, GrowApi};
use crate::models::{LogResponse, Setpoint};

type Scripted<T> = Mutex<VecDeque<(Result<T, ApiError>, Duration)>>;

#[derive(Default)]
pub struct FakeApi {
    logs: Scripted<LogResponse>,
    setpoints: Scripted<Setpoint>,
    puts: Scripted<()>,
    log_calls: AtomicUsize,
    setpoint_calls: AtomicUsize,
    put_bodies: Mutex<Vec<Setpoint>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_log(&self, result: Result<LogResponse, ApiError>) {
        self.push_log_delayed(result, Duration::ZERO);
    }

    pub fn push_log_delayed(&self, result: Result<LogResponse, ApiError>, delay: Duration) {
        self.logs.lock().unwrap().push_back((result, delay));
    }

    pub fn push_setpoint(&self, result: Result<Setpoint, ApiError>) {
        self.setpoints.lock().unwrap().push_back((result, Duration::ZERO));
    }

    pub fn push_put(&self, result: Result<(), ApiError>) {
        self.puts.lock().unwrap().push_back((result, Duration::ZERO));
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub fn setpoint_calls(&self) -> usize {
        self.setpoint_calls.load(Ordering::SeqCst)
    }

    pub fn put_bodies(&self) -> Vec<Setpoint> {
        self.put_bodies.lock().unwrap().clone()
    }
}

/// Pop the next scripted answer; an empty script behaves like a dead server
async fn next<T>(script: &Scripted<T>) -> Result<T, ApiError> {
    let entry = script.lock().unwrap().pop_front();
    match entry {
        Some((result, delay)) => {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            result
        }
        None => Err(ApiError::Request("no scripted response".into())),
    }
}

impl GrowApi for FakeApi {
    async fn latest_log(&self) -> Result<LogResponse, ApiError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.logs).await
    }

    async fn setpoint(&self) -> Result<Setpoint, ApiError> {
        self.setpoint_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.setpoints).await
    }

    async fn put_setpoint(&self, setpoint: Setpoint) -> Result<(), ApiError> {
        self.put_bodies.lock().unwrap().push(setpoint);
        next(&self.puts).await
    }
}

/// Process-wide logger that records every message for assertions
pub struct LogCapture {
    records: Mutex<Vec<(log::Level, String)>>,
}

static CAPTURE: LogCapture = LogCapture {
    records: Mutex::new(Vec::new()),
};

impl log::Log for LogCapture {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

impl LogCapture {
    pub fn contains(&self, level: log::Level, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

/// Install the capturing logger; repeated calls reuse it
pub fn capture_logs() -> &'static LogCapture {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(log::LevelFilter::Debug);
    &CAPTURE
}
