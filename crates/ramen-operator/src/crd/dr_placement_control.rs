//! `DRPlacementControl` (DRPC): out of scope beyond its event-filtering interface (§4.5, §6).
//! The `DRCluster` controller never reads or writes this resource's business fields; it only
//! watches for the specific transitions enumerated in the event-filtering predicates.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRPlacementControl",
    plural = "drplacementcontrols",
    namespaced,
    status = "DRPlacementControlStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct DRPlacementControlSpec {
    /// The requested placement action. Only `Failover` is meaningful to the event filter.
    pub action: Option<String>,

    /// The cluster a failover targets.
    pub failover_cluster: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DRPlacementControlStatus {
    #[serde(default)]
    pub conditions: Vec<k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition>,
}

/// The only `spec.action` value the event filter cares about.
pub const ACTION_FAILOVER: &str = "Failover";

/// Condition type reported once the placement has become available on its target cluster.
pub const CONDITION_AVAILABLE: &str = "Available";
