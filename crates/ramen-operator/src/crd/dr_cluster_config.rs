//! `DRClusterConfig`: synthesized by the `DRCluster` controller and delivered to a managed
//! cluster; the managed-cluster copy is read back via MCV carrying the detected storage/fence
//! class inventory (§4.3, §4.4).
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRClusterConfig",
    plural = "drclusterconfigs",
    status = "DRClusterConfigStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct DRClusterConfigSpec {
    /// The managed cluster's own identity, as claimed via `ManagedCluster.status.clusterClaims`
    /// (`id.k8s.io`).
    pub cluster_id: String,

    /// The distinct union of `DRPolicy.spec.schedulingInterval` (formatted via
    /// [`ramen_shared::time::Duration`]) drawn from every non-deleted `DRPolicy` that lists this
    /// cluster. Contains no duplicates; order is not significant (§3 invariant 2).
    #[serde(default)]
    pub replication_schedules: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DRClusterConfigStatus {
    /// `NetworkFenceClass`es discovered on the managed cluster, each carrying the provisioner
    /// and the comma-separated `storageID` set consulted by fence-class matching.
    #[serde(default)]
    pub network_fence_classes: Vec<NetworkFenceClassSummary>,

    /// `StorageClass`es discovered on the managed cluster.
    #[serde(default)]
    pub storage_classes: Vec<StorageClassSummary>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageClassSummary {
    pub name: String,
    pub provisioner: String,

    /// The `ramendr.openshift.io/storageID` label value, if present.
    #[serde(default)]
    pub storage_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFenceClassSummary {
    pub name: String,
    pub provisioner: String,

    /// The raw, comma-separated `ramendr.openshift.io/storageID` annotation value.
    #[serde(default)]
    pub storage_ids: String,
}

impl NetworkFenceClassSummary {
    /// Parses the comma-separated `storage_ids` annotation into its constituent IDs.
    pub fn storage_id_set(&self) -> impl Iterator<Item = &str> {
        self.storage_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_id_set_splits_and_trims() {
        let nfc = NetworkFenceClassSummary {
            name: "nfc1".into(),
            provisioner: "p".into(),
            storage_ids: "s1, s2,s3".into(),
        };
        assert_eq!(nfc.storage_id_set().collect::<Vec<_>>(), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn empty_storage_ids_yields_no_entries() {
        let nfc = NetworkFenceClassSummary {
            name: "nfc1".into(),
            provisioner: "p".into(),
            storage_ids: String::new(),
        };
        assert_eq!(nfc.storage_id_set().count(), 0);
    }
}
