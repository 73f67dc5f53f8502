//! `DRPolicy`: a pair of [`DRCluster`](super::dr_cluster::DRCluster)s plus a replication cadence.
//!
//! Read-only input to the `DRCluster` controller: it is never written by this crate, only
//! scanned for peer selection (§4.4) and to build the replication-schedule union (§4.3).
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use ramen_shared::time::Duration;

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRPolicy",
    plural = "drpolicies",
    status = "DRPolicyStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct DRPolicySpec {
    /// The pair of clusters this policy protects between.
    pub dr_clusters: Vec<String>,

    /// How often the replication-group source controllers should snapshot and ship data.
    /// Delivered to managed clusters as part of `DRClusterConfig.spec.replicationSchedules`.
    pub scheduling_interval: Duration,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DRPolicyStatus {
    #[serde(default)]
    pub sync: DRPolicyStatusSync,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DRPolicyStatusSync {
    /// Non-empty once the pair named in `spec.drClusters` is confirmed peered, consulted by
    /// peer selection as an alternative to the region-equality fallback.
    #[serde(default)]
    pub peer_classes: Vec<String>,
}

impl DRPolicy {
    /// Returns the cluster in `spec.drClusters` that is not `cluster_name`, if any.
    pub fn peer_of<'a>(&'a self, cluster_name: &str) -> Option<&'a str> {
        self.spec
            .dr_clusters
            .iter()
            .find(|name| name.as_str() != cluster_name)
            .map(String::as_str)
    }

    /// Returns whether `cluster_name` is one of this policy's pair.
    pub fn contains_cluster(&self, cluster_name: &str) -> bool {
        self.spec.dr_clusters.iter().any(|name| name == cluster_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(clusters: &[&str]) -> DRPolicy {
        DRPolicy::new(
            "east-west",
            DRPolicySpec {
                dr_clusters: clusters.iter().map(|s| s.to_string()).collect(),
                scheduling_interval: "5m".parse().unwrap(),
            },
        )
    }

    #[test]
    fn peer_of_returns_the_other_cluster() {
        let policy = policy(&["east", "west"]);
        assert_eq!(policy.peer_of("east"), Some("west"));
        assert_eq!(policy.peer_of("west"), Some("east"));
    }

    #[test]
    fn peer_of_unrelated_cluster_is_none() {
        let policy = policy(&["east", "west"]);
        assert_eq!(policy.peer_of("north"), None);
    }
}
