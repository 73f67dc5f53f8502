#![warn(missing_docs)]

//! Tracing, logging, and `OpenTelemetry` primitives used to instrument the Ramen hub
//! controllers.
pub mod tracing;

pub use tracing::Tracing;
