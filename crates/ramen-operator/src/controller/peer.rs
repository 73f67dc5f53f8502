//! Peer selection, fence-class matching and `NetworkFence` synthesis (§4.4).
use kube::{Resource, ResourceExt};
use snafu::Snafu;

use crate::{
    constants::{STORAGE_CLUSTER_ID_KEY, STORAGE_DRIVER_KEY, STORAGE_SECRET_NAME_KEY, STORAGE_SECRET_NAMESPACE_KEY},
    crd::{
        dr_cluster_config::DRClusterConfigStatus, ClusterFenceState, DRCluster, DRPolicy, FenceState, NetworkFence,
        NetworkFenceSpec, SecretReference,
    },
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{target:?} has no CIDRs to fence"))]
    EmptyCidrs { target: String },

    #[snafu(display("{target:?} is missing the {key:?} annotation required for a generic NetworkFence"))]
    MissingStorageAnnotation { target: String, key: &'static str },
}

/// Selects the peer cluster for `target` by scanning `policies` (§4.4).
///
/// Accepts the other cluster of a policy naming `target` when the pair is known-peered
/// (`status.sync.peerClasses` non-empty) or the two clusters share a region. Candidates marked
/// for deletion are skipped; the first accepted candidate wins. Never returns `target` itself
/// (§8 testable property 4).
pub fn select_peer<'a>(target: &DRCluster, policies: &[DRPolicy], clusters: &'a [DRCluster]) -> Option<&'a DRCluster> {
    let target_name = target.name_any();

    policies
        .iter()
        .filter(|policy| policy.contains_cluster(&target_name))
        .find_map(|policy| {
            let peer_name = policy.peer_of(&target_name)?;
            if peer_name == target_name {
                return None;
            }

            let peer = clusters.iter().find(|cluster| cluster.name_any() == peer_name)?;
            if peer.meta().deletion_timestamp.is_some() {
                return None;
            }

            let known_peered = policy
                .status
                .as_ref()
                .is_some_and(|status| !status.sync.peer_classes.is_empty());
            let same_region = target.spec.region == peer.spec.region;

            (known_peered || same_region).then_some(peer)
        })
}

/// Matches the peer's advertised `networkFenceClasses` against its `storageClasses` by
/// provisioner and storage-ID intersection, returning the matching class names. Returns a single
/// empty-string entry when nothing matches, so the caller produces one generic `NetworkFence`
/// instead of none (§4.4).
pub fn matching_fence_classes(peer_config: &DRClusterConfigStatus) -> Vec<String> {
    let mut matches = Vec::new();

    for nfc in &peer_config.network_fence_classes {
        let matched = peer_config.storage_classes.iter().any(|sc| {
            sc.provisioner == nfc.provisioner
                && sc
                    .storage_id
                    .as_deref()
                    .is_some_and(|id| nfc.storage_id_set().any(|candidate| candidate == id))
        });
        if matched {
            matches.push(nfc.name.clone());
        }
    }

    if matches.is_empty() {
        matches.push(String::new());
    }

    matches
}

/// Synthesizes the `NetworkFence` that fences/unfences `target`'s storage, named per whether
/// `class` was selected by [`matching_fence_classes`] (empty string means generic).
///
/// When generic, the storage driver/secret/cluster-ID are pulled from `target`'s own annotations
/// rather than from a fence class; a missing annotation is an error (§4.4, §6).
pub fn synthesize(target: &DRCluster, class: &str) -> Result<NetworkFence, Error> {
    let target_name = target.name_any();

    if target.spec.cidrs.is_empty() {
        return Err(Error::EmptyCidrs { target: target_name });
    }

    let fence_state = match target.spec.cluster_fence {
        Some(ClusterFenceState::Fenced) | Some(ClusterFenceState::ManuallyFenced) => FenceState::Fenced,
        _ => FenceState::Unfenced,
    };

    let name = if class.is_empty() {
        format!("network-fence-{target_name}")
    } else {
        format!("network-fence-{class}-{target_name}")
    };

    let mut spec = NetworkFenceSpec {
        cidrs: target.spec.cidrs.clone(),
        fence_state,
        network_fence_class_name: None,
        driver: None,
        secret: None,
        cluster_id: None,
    };

    if class.is_empty() {
        spec.driver = Some(annotation(target, STORAGE_DRIVER_KEY)?);
        spec.secret = Some(SecretReference {
            name: annotation(target, STORAGE_SECRET_NAME_KEY)?,
            namespace: annotation(target, STORAGE_SECRET_NAMESPACE_KEY)?,
        });
        spec.cluster_id = Some(annotation(target, STORAGE_CLUSTER_ID_KEY)?);
    } else {
        spec.network_fence_class_name = Some(class.to_string());
    }

    Ok(NetworkFence::new(&name, spec))
}

fn annotation(target: &DRCluster, key: &'static str) -> Result<String, Error> {
    target
        .annotations()
        .get(key)
        .cloned()
        .ok_or(Error::MissingStorageAnnotation {
            target: target.name_any(),
            key,
        })
}

#[cfg(test)]
mod tests {
    use crate::crd::{dr_cluster::DRClusterSpec, dr_cluster_config::{NetworkFenceClassSummary, StorageClassSummary}, dr_policy::{DRPolicySpec, DRPolicyStatus, DRPolicyStatusSync}};

    use super::*;

    fn cluster(name: &str, region: &str) -> DRCluster {
        DRCluster::new(
            name,
            DRClusterSpec {
                region: region.to_string(),
                cidrs: vec!["10.0.0.0/16".into()],
                s3_profile_name: "none".into(),
                cluster_fence: None,
            },
        )
    }

    fn policy(clusters: &[&str], peer_classes: &[&str]) -> DRPolicy {
        let mut policy = DRPolicy::new(
            "policy",
            DRPolicySpec {
                dr_clusters: clusters.iter().map(|c| c.to_string()).collect(),
                scheduling_interval: "5m".parse().unwrap(),
            },
        );
        policy.status = Some(DRPolicyStatus {
            sync: DRPolicyStatusSync {
                peer_classes: peer_classes.iter().map(|c| c.to_string()).collect(),
            },
        });
        policy
    }

    #[test]
    fn peer_selected_by_shared_region() {
        let east = cluster("east", "r1");
        let west = cluster("west", "r1");
        let policies = vec![policy(&["east", "west"], &[])];
        let clusters = vec![east.clone(), west.clone()];

        let peer = select_peer(&east, &policies, &clusters).unwrap();
        assert_eq!(peer.name_any(), "west");
    }

    #[test]
    fn peer_never_self_and_skips_deleting_candidates() {
        let mut west = cluster("west", "r2");
        west.meta_mut().deletion_timestamp = Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
            chrono::DateTime::from_timestamp(0, 0).unwrap(),
        ));
        let east = cluster("east", "r1");
        let policies = vec![policy(&["east", "west"], &[])];
        let clusters = vec![east.clone(), west];

        assert!(select_peer(&east, &policies, &clusters).is_none());
    }

    #[test]
    fn peer_selected_when_known_peered_despite_different_regions() {
        let east = cluster("east", "r1");
        let west = cluster("west", "r2");
        let policies = vec![policy(&["east", "west"], &["rbd-flatten"])];
        let clusters = vec![east.clone(), west.clone()];

        let peer = select_peer(&east, &policies, &clusters).unwrap();
        assert_eq!(peer.name_any(), "west");
    }

    #[test]
    fn matching_fence_classes_emits_empty_entry_when_nothing_matches() {
        let status = DRClusterConfigStatus::default();
        assert_eq!(matching_fence_classes(&status), vec![String::new()]);
    }

    #[test]
    fn matching_fence_classes_intersects_provisioner_and_storage_id() {
        let status = DRClusterConfigStatus {
            storage_classes: vec![StorageClassSummary {
                name: "sc1".into(),
                provisioner: "p".into(),
                storage_id: Some("s1".into()),
            }],
            network_fence_classes: vec![NetworkFenceClassSummary {
                name: "nfc1".into(),
                provisioner: "p".into(),
                storage_ids: "s1,s2".into(),
            }],
        };
        assert_eq!(matching_fence_classes(&status), vec!["nfc1".to_string()]);
    }

    #[test]
    fn synthesize_rejects_empty_cidrs() {
        let mut target = cluster("east", "r1");
        target.spec.cidrs = vec![];
        assert!(matches!(synthesize(&target, ""), Err(Error::EmptyCidrs { .. })));
    }

    #[test]
    fn synthesize_generic_requires_storage_annotations() {
        let target = cluster("east", "r1");
        assert!(matches!(
            synthesize(&target, ""),
            Err(Error::MissingStorageAnnotation { key: STORAGE_DRIVER_KEY, .. })
        ));
    }

    #[test]
    fn synthesize_class_based_skips_annotation_lookup() {
        let target = cluster("east", "r1");
        let nf = synthesize(&target, "nfc1").unwrap();
        assert_eq!(nf.name_any(), "network-fence-nfc1-east");
        assert_eq!(nf.spec.network_fence_class_name.as_deref(), Some("nfc1"));
        assert!(nf.spec.driver.is_none());
    }

    #[test]
    fn synthesize_generic_naming_has_no_class_segment() {
        let mut target = cluster("east", "r1");
        target
            .annotations_mut()
            .insert(STORAGE_DRIVER_KEY.to_string(), "driver.csi".to_string());
        target
            .annotations_mut()
            .insert(STORAGE_SECRET_NAME_KEY.to_string(), "creds".to_string());
        target
            .annotations_mut()
            .insert(STORAGE_SECRET_NAMESPACE_KEY.to_string(), "ns".to_string());
        target
            .annotations_mut()
            .insert(STORAGE_CLUSTER_ID_KEY.to_string(), "abc".to_string());

        let nf = synthesize(&target, "").unwrap();
        assert_eq!(nf.name_any(), "network-fence-east");
        assert_eq!(nf.spec.driver.as_deref(), Some("driver.csi"));
    }
}
