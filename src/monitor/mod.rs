pub mod poller;
pub mod setpoint;

#[cfg(test)]
pub(crate) mod testing;

pub use poller::Poller;
pub use setpoint::{SetpointError, SetpointSync};
