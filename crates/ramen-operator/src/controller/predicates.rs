//! Event-filtering predicates that decide whether a watch event is worth a reconcile (§4.5).
//!
//! Kept as pure functions over the old/new object pair (or the single object, for kinds the
//! controller doesn't diff) so they are testable without a live watch.
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Resource, ResourceExt};

use crate::{
    config::{OperatorConfig, CONFIG_MAP_NAME},
    constants::DRCLUSTER_NAME_ANNOTATION_KEY,
    crd::{
        dr_placement_control::{ACTION_FAILOVER, CONDITION_AVAILABLE},
        DRPlacementControl, ManifestWork,
    },
    status::condition::{get_condition, is_condition, ConditionStatus},
};

/// Passes only when `spec.action == Failover`, AND either `action`/`failoverCluster` just
/// changed, or `Available` just became `True` at the DRPC's current generation (§4.5).
pub fn drpc_event_passes(old: &DRPlacementControl, new: &DRPlacementControl) -> bool {
    if new.spec.action.as_deref() != Some(ACTION_FAILOVER) {
        return false;
    }

    let target_changed = old.spec.action != new.spec.action || old.spec.failover_cluster != new.spec.failover_cluster;
    if target_changed {
        return true;
    }

    let old_conditions = old.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default();
    let new_conditions = new.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default();

    let was_available = is_condition(old_conditions, CONDITION_AVAILABLE, ConditionStatus::True);
    let is_available = is_condition(new_conditions, CONDITION_AVAILABLE, ConditionStatus::True);
    let observed_at_current_generation = get_condition(new_conditions, CONDITION_AVAILABLE)
        .and_then(|c| c.observed_generation)
        .is_some_and(|generation| Some(generation) == new.meta().generation);

    !was_available && is_available && observed_at_current_generation
}

/// Passes only for `ManifestWork`s the `DRCluster` controller itself owns, identified by the
/// `drcluster-name` annotation it stamps on every MW it creates (§4.5).
pub fn manifest_work_event_passes(mw: &ManifestWork) -> bool {
    mw.annotations().contains_key(DRCLUSTER_NAME_ANNOTATION_KEY)
}

/// Returns the owning `DRCluster`'s name for a `ManifestWork` event that passed the filter.
pub fn manifest_work_affected_cluster(mw: &ManifestWork) -> Option<String> {
    mw.annotations().get(DRCLUSTER_NAME_ANNOTATION_KEY).cloned()
}

/// Passes only for secrets in the operator's own namespace whose name is referenced by some
/// configured S3 profile (§4.5).
pub fn secret_event_passes(secret: &Secret, operator_namespace: &str, config: &OperatorConfig) -> bool {
    secret.namespace().as_deref() == Some(operator_namespace)
        && config
            .s3_store_profiles
            .values()
            .any(|profile| profile.s3_secret_ref.name == secret.name_any())
}

/// Passes only for the single hub operator config-map, in the operator's own namespace (§4.5).
pub fn config_map_event_passes(config_map: &ConfigMap, operator_namespace: &str) -> bool {
    config_map.name_any() == CONFIG_MAP_NAME && config_map.namespace().as_deref() == Some(operator_namespace)
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};

    use crate::{
        config::S3ProfileConfig,
        crd::{dr_placement_control::DRPlacementControlSpec, dr_placement_control::DRPlacementControlStatus, manifest_work::{ManifestWorkSpec, ManifestWorkload}},
    };

    use super::*;

    fn drpc(action: Option<&str>, failover_cluster: Option<&str>) -> DRPlacementControl {
        DRPlacementControl::new(
            "app",
            DRPlacementControlSpec {
                action: action.map(str::to_string),
                failover_cluster: failover_cluster.map(str::to_string),
            },
        )
    }

    #[test]
    fn non_failover_action_never_passes() {
        let old = drpc(None, None);
        let new = drpc(Some("Relocate"), Some("west"));
        assert!(!drpc_event_passes(&old, &new));
    }

    #[test]
    fn failover_target_change_passes() {
        let old = drpc(Some("Failover"), Some("east"));
        let new = drpc(Some("Failover"), Some("west"));
        assert!(drpc_event_passes(&old, &new));
    }

    #[test]
    fn unrelated_status_churn_does_not_pass() {
        let old = drpc(Some("Failover"), Some("west"));
        let mut new = old.clone();
        new.status = Some(DRPlacementControlStatus {
            conditions: vec![Condition {
                type_: "Peered".to_string(),
                status: "True".to_string(),
                reason: "ok".to_string(),
                message: String::new(),
                observed_generation: None,
                last_transition_time: Time(chrono::DateTime::from_timestamp(0, 0).unwrap()),
            }],
        });
        assert!(!drpc_event_passes(&old, &new));
    }

    #[test]
    fn available_just_becoming_true_at_current_generation_passes() {
        let old = drpc(Some("Failover"), Some("west"));
        let mut new = old.clone();
        new.meta_mut().generation = Some(3);
        new.status = Some(DRPlacementControlStatus {
            conditions: vec![Condition {
                type_: CONDITION_AVAILABLE.to_string(),
                status: "True".to_string(),
                reason: "Available".to_string(),
                message: String::new(),
                observed_generation: Some(3),
                last_transition_time: Time(chrono::DateTime::from_timestamp(0, 0).unwrap()),
            }],
        });
        assert!(drpc_event_passes(&old, &new));
    }

    #[test]
    fn manifest_work_without_drcluster_annotation_is_filtered() {
        let mw = ManifestWork::new(
            "some-mw",
            ManifestWorkSpec {
                workload: ManifestWorkload { manifests: vec![] },
                delete_option: None,
            },
        );
        assert!(!manifest_work_event_passes(&mw));
    }

    #[test]
    fn manifest_work_with_drcluster_annotation_passes_and_maps_back() {
        let mut mw = ManifestWork::new(
            "ramen-dr-cluster",
            ManifestWorkSpec {
                workload: ManifestWorkload { manifests: vec![] },
                delete_option: None,
            },
        );
        mw.annotations_mut()
            .insert(DRCLUSTER_NAME_ANNOTATION_KEY.to_string(), "east".to_string());

        assert!(manifest_work_event_passes(&mw));
        assert_eq!(manifest_work_affected_cluster(&mw).as_deref(), Some("east"));
    }

    #[test]
    fn secret_outside_operator_namespace_is_filtered() {
        let mut secret = Secret::default();
        secret.metadata.name = Some("rook-ceph-s3-secret".to_string());
        secret.metadata.namespace = Some("other-ns".to_string());

        let mut config = OperatorConfig::default();
        config.s3_store_profiles.insert(
            "rook-ceph".to_string(),
            S3ProfileConfig {
                bucket: "bucket".into(),
                region: None,
                endpoint: None,
                s3_secret_ref: crate::config::SecretRef { name: "rook-ceph-s3-secret".into() },
            },
        );

        assert!(!secret_event_passes(&secret, "ramen-system", &config));
    }

    #[test]
    fn config_map_must_match_the_well_known_name_and_namespace() {
        let mut config_map = ConfigMap::default();
        config_map.metadata.name = Some(CONFIG_MAP_NAME.to_string());
        config_map.metadata.namespace = Some("ramen-system".to_string());
        assert!(config_map_event_passes(&config_map, "ramen-system"));

        config_map.metadata.name = Some("other-config".to_string());
        assert!(!config_map_event_passes(&config_map, "ramen-system"));
    }
}
