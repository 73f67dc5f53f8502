//! Well-known Kubernetes and Ramen label/annotation keys.
mod keys;

pub use keys::*;
