//! Helpers for building and updating the `status.conditions` lists carried by
//! `ManifestWork`, `DRCluster` and friends.
pub mod condition;

pub use condition::{get_condition, is_condition, set_condition, ConditionStatus};
