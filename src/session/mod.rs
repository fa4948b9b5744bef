//! Front-end state: the chat controller and the backend health monitor

pub mod controller;
pub mod health_monitor;

pub use controller::{ChatController, ControllerError};
pub use health_monitor::{BackendStatus, HealthMonitor, HealthMonitorHandle, HealthReport};
