//! A small, serializable [`Duration`] newtype used for scheduling intervals
//! (`DRPolicy.spec.schedulingInterval`) and requeue backoffs.
mod duration;

#[cfg(feature = "chrono")]
mod chrono_impl;

pub use duration::*;
