//! The hub-side `DRCluster` controller: a per-cluster fencing state machine, the manifest-work
//! delivery substrate it uses to reach managed clusters, and the managed-cluster-view substrate
//! it uses to read projections of their state back.
//!
//! ## Crate Features
//!
//! - `clap` enables the CLI argument types in [`cli`] used by the `ramen-hub` binary.

pub mod cidr;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod iter;
pub mod kvp;
pub mod logging;
pub mod mcv;
pub mod mwu;
pub mod namespace;
pub mod objectstore;
pub mod status;
pub mod utils;
pub mod validation;

// External re-exports
pub use k8s_openapi;
pub use kube;
pub use schemars;
// Internal re-exports
pub use ramen_shared as shared;
pub use ramen_shared::{crd::CustomResourceExt, yaml::YamlSchema};
