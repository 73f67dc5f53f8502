//! `DRCluster`: the hub-side declarative record of a single managed cluster's DR identity
//! and desired fence state.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The finalizer the reconciler adds to every `DRCluster` it has started managing, removed
/// only once undeploy and fence cleanup have both completed.
pub const DR_CLUSTER_FINALIZER: &str = "drclusters.ramendr.openshift.io/ramen";

/// Declares one managed cluster participating in disaster recovery.
///
/// Storage-provider details consumed when synthesizing a generic `NetworkFence` (driver, secret
/// reference, storage cluster ID) travel as annotations on this object rather than spec fields —
/// see the `drcluster.ramendr.openshift.io/storage-*` keys in [`crate::constants`].
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRCluster",
    plural = "drclusters",
    status = "DRClusterStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct DRClusterSpec {
    /// The failure-domain region of this cluster, used for peer selection fallback when no
    /// `DRPolicy` has yet recorded the pair as peered.
    pub region: String,

    /// CIDR blocks covering the cluster's storage network, validated as IP networks by the
    /// reconciler and copied verbatim onto a generic `NetworkFence`.
    #[serde(default, rename = "CIDRs")]
    pub cidrs: Vec<String>,

    /// Name of the S3 profile (resolved via the hub operator config-map) used to validate that
    /// this cluster's object store is reachable. The sentinel
    /// [`NO_S3_STORE_AVAILABLE`](crate::constants::NO_S3_STORE_AVAILABLE) skips validation.
    pub s3_profile_name: String,

    /// The operator-asserted or Ramen-driven fence intent. Absent or [`ClusterFenceState::Unknown`]
    /// asserts `Clean=True` with a distinct reason from [`ClusterFenceState::ManuallyUnfenced`] —
    /// see the reconciler's open-question handling of a freshly erased field.
    pub cluster_fence: Option<ClusterFenceState>,
}

/// The fence intent asserted on a [`DRClusterSpec`].
#[derive(Clone, Copy, Debug, Display, EnumString, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ClusterFenceState {
    /// The operator manually fenced the cluster out-of-band; the controller only reflects this.
    ManuallyFenced,
    /// The operator manually undid a fence out-of-band.
    ManuallyUnfenced,
    /// Ramen should drive fencing of this cluster via its peer.
    Fenced,
    /// Ramen should drive unfencing of this cluster via its peer.
    Unfenced,
    /// Any value this enum doesn't recognize, degraded to rather than rejected outright (§4.2's
    /// "(empty/other) → No fence" row) so a stored object carrying a value from a newer or
    /// foreign writer still deserializes.
    #[serde(other)]
    Unknown,
}

/// The fencing lifecycle phase of a [`DRCluster`].
#[derive(
    Clone, Copy, Debug, Default, Display, EnumString, Deserialize, Serialize, JsonSchema, PartialEq, Eq,
)]
pub enum DRClusterPhase {
    #[default]
    Starting,
    Available,
    Fencing,
    Fenced,
    Unfencing,
    Unfenced,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DRClusterStatus {
    #[serde(default)]
    pub phase: DRClusterPhase,

    #[serde(default)]
    pub conditions: Vec<k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition>,
}

/// Condition type set on `Validated=...` reflecting CIDR/annotation/bundle validation.
pub const CONDITION_VALIDATED: &str = "Validated";
/// Condition type tracking the storage-level fence state of the cluster.
pub const CONDITION_FENCED: &str = "Fenced";
/// Condition type tracking whether fence artifacts have been fully cleaned up.
pub const CONDITION_CLEAN: &str = "Clean";
