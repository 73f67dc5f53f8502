//! `NetworkFence`: delivered *to the peer cluster* to actually perform storage-level fencing
//! of a target cluster's CIDRs (§3, §4.4).
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "csiaddons.openshift.io",
    version = "v1alpha1",
    kind = "NetworkFence",
    plural = "networkfences",
    status = "NetworkFenceStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFenceSpec {
    /// CIDR blocks to fence, copied verbatim from the target `DRCluster.spec.CIDRs`.
    #[serde(default, rename = "cidrs")]
    pub cidrs: Vec<String>,

    /// The intended fence state, mirroring the target `DRCluster.spec.clusterFence`.
    pub fence_state: FenceState,

    /// The fence class selected by matching (§4.4); absent for a generic fence.
    pub network_fence_class_name: Option<String>,

    /// CSI driver name; required when `network_fence_class_name` is absent.
    pub driver: Option<String>,

    /// Credentials secret reference; required when `network_fence_class_name` is absent.
    pub secret: Option<SecretReference>,

    /// The storage provider's cluster identity; required when `network_fence_class_name` is
    /// absent.
    pub cluster_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

#[derive(Clone, Copy, Debug, Display, EnumString, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum FenceState {
    Fenced,
    Unfenced,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFenceStatus {
    /// `"Succeeded"` once the storage provider has confirmed the fence/unfence operation.
    pub result: Option<String>,
}

/// The `NetworkFenceStatus.result` value observed once a fence/unfence operation has completed.
pub const RESULT_SUCCEEDED: &str = "Succeeded";
