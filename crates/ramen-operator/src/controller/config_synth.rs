//! `DRClusterConfig` synthesis (§4.3).
use std::collections::BTreeSet;

use kube::{Resource, ResourceExt};
use snafu::Snafu;

use crate::crd::{DRCluster, DRClusterConfig, DRClusterConfigSpec, DRPolicy, ManagedCluster};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{cluster:?} has not yet registered the id.k8s.io cluster-ID claim"))]
    MissingClusterIdClaim { cluster: String },
}

/// Builds the `DRClusterConfig` delivered to `cluster`: its own registered cluster-ID plus the
/// distinct, non-empty union of `schedulingInterval`s drawn from every non-deleted `DRPolicy`
/// that lists it (§4.3, §8 testable property 2).
pub fn synthesize(
    cluster: &DRCluster,
    managed_cluster: &ManagedCluster,
    policies: &[DRPolicy],
) -> Result<DRClusterConfig, Error> {
    let cluster_name = cluster.name_any();
    let cluster_id = managed_cluster
        .cluster_id()
        .ok_or_else(|| Error::MissingClusterIdClaim {
            cluster: cluster_name.clone(),
        })?
        .to_string();

    let mut seen = BTreeSet::new();
    let mut replication_schedules = Vec::new();

    for policy in policies {
        if policy.meta().deletion_timestamp.is_some() || !policy.contains_cluster(&cluster_name) {
            continue;
        }

        if policy.spec.scheduling_interval.as_std().is_zero() {
            continue;
        }

        let schedule = policy.spec.scheduling_interval.to_string();
        if seen.insert(schedule.clone()) {
            replication_schedules.push(schedule);
        }
    }

    Ok(DRClusterConfig::new(
        &cluster_name,
        DRClusterConfigSpec {
            cluster_id,
            replication_schedules,
        },
    ))
}

#[cfg(test)]
mod tests {
    use crate::crd::{dr_cluster::DRClusterSpec, dr_policy::DRPolicySpec, managed_cluster::{ManagedClusterClaim, ManagedClusterSpec, ManagedClusterStatus, CLUSTER_ID_CLAIM_NAME}};

    use super::*;

    fn cluster() -> DRCluster {
        DRCluster::new(
            "east",
            DRClusterSpec {
                region: "r1".into(),
                cidrs: vec![],
                s3_profile_name: "none".into(),
                cluster_fence: None,
            },
        )
    }

    fn managed_cluster_with_id(id: &str) -> ManagedCluster {
        let mut managed_cluster = ManagedCluster::new("east", ManagedClusterSpec::default());
        managed_cluster.status = Some(ManagedClusterStatus {
            cluster_claims: vec![ManagedClusterClaim {
                name: CLUSTER_ID_CLAIM_NAME.to_string(),
                value: id.to_string(),
            }],
        });
        managed_cluster
    }

    fn policy_for(clusters: &[&str], interval: &str) -> DRPolicy {
        DRPolicy::new(
            "policy",
            DRPolicySpec {
                dr_clusters: clusters.iter().map(|c| c.to_string()).collect(),
                scheduling_interval: interval.parse().unwrap(),
            },
        )
    }

    #[test]
    fn fails_without_a_registered_cluster_id() {
        let cluster = cluster();
        let managed_cluster = ManagedCluster::new("east", ManagedClusterSpec::default());
        let err = synthesize(&cluster, &managed_cluster, &[]).unwrap_err();
        assert!(matches!(err, Error::MissingClusterIdClaim { .. }));
    }

    #[test]
    fn deduplicates_identical_schedules_across_policies() {
        let cluster = cluster();
        let managed_cluster = managed_cluster_with_id("abc-123");
        let policies = vec![
            policy_for(&["east", "west"], "5m"),
            policy_for(&["east", "north"], "5m"),
            policy_for(&["east", "south"], "15m"),
        ];

        let config = synthesize(&cluster, &managed_cluster, &policies).unwrap();
        assert_eq!(config.spec.cluster_id, "abc-123");
        assert_eq!(config.spec.replication_schedules, vec!["5m".to_string(), "15m".to_string()]);
    }

    #[test]
    fn ignores_policies_not_naming_this_cluster() {
        let cluster = cluster();
        let managed_cluster = managed_cluster_with_id("abc-123");
        let policies = vec![policy_for(&["west", "north"], "5m")];

        let config = synthesize(&cluster, &managed_cluster, &policies).unwrap();
        assert!(config.spec.replication_schedules.is_empty());
    }

    #[test]
    fn skips_deleted_policies() {
        let cluster = cluster();
        let managed_cluster = managed_cluster_with_id("abc-123");
        let mut deleting = policy_for(&["east", "west"], "5m");
        deleting.meta_mut().deletion_timestamp = Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
            chrono::DateTime::from_timestamp(0, 0).unwrap(),
        ));

        let config = synthesize(&cluster, &managed_cluster, &[deleting]).unwrap();
        assert!(config.spec.replication_schedules.is_empty());
    }
}
