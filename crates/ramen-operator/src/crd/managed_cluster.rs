//! `ManagedCluster`: the Open-Cluster-Management registration record for a single managed
//! cluster. Read-only here; consulted only for its `id.k8s.io` cluster-claim when synthesizing
//! `DRClusterConfig.spec.clusterID` (§4.3).
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The cluster-claim name carrying the managed cluster's own identity.
pub const CLUSTER_ID_CLAIM_NAME: &str = "id.k8s.io";

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedCluster",
    plural = "managedclusters",
    status = "ManagedClusterStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[serde(default)]
    pub hub_accepts_client: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    #[serde(default)]
    pub cluster_claims: Vec<ManagedClusterClaim>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ManagedClusterClaim {
    pub name: String,
    pub value: String,
}

impl ManagedCluster {
    /// Returns the cluster's own identity, as registered under [`CLUSTER_ID_CLAIM_NAME`].
    pub fn cluster_id(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .cluster_claims
            .iter()
            .find(|claim| claim.name == CLUSTER_ID_CLAIM_NAME)
            .map(|claim| claim.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_id_reads_the_well_known_claim() {
        let mut cluster = ManagedCluster::new("east", ManagedClusterSpec::default());
        cluster.status = Some(ManagedClusterStatus {
            cluster_claims: vec![
                ManagedClusterClaim {
                    name: "other.claim".into(),
                    value: "ignored".into(),
                },
                ManagedClusterClaim {
                    name: CLUSTER_ID_CLAIM_NAME.into(),
                    value: "abc-123".into(),
                },
            ],
        });

        assert_eq!(cluster.cluster_id(), Some("abc-123"));
    }

    #[test]
    fn cluster_id_absent_without_status() {
        let cluster = ManagedCluster::new("east", ManagedClusterSpec::default());
        assert_eq!(cluster.cluster_id(), None);
    }
}
