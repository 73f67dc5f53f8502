//! `NetworkFenceClass`: discovered on managed clusters, selecting a CSI provisioner and (via
//! annotation) the storage IDs it fences (§4.4). Read-only from the hub's perspective; this type
//! exists only so the managed-cluster inventory embedded in `DRClusterConfig.status` can be
//! constructed from real objects in tests and tooling.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "csiaddons.openshift.io",
    version = "v1alpha1",
    kind = "NetworkFenceClass",
    plural = "networkfenceclasses",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFenceClassSpec {
    /// The CSI driver this class fences, matched against a `StorageClass`'s own provisioner.
    pub provisioner: String,
}
