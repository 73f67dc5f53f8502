//! Reconcile error reporting: turning reconcile results into structured log events and
//! Kubernetes events on the object being reconciled.
//!
//! Process-wide tracing/log initialization lives in `ramen_telemetry` instead.
pub mod controller;
mod k8s_events;

pub use k8s_events::publish_controller_error_as_k8s_event;
