//! Well-known workload bundles assembled by the manifest-work utility (§4.1).
use k8s_openapi::{
    api::{core::v1::Namespace, rbac::v1::ClusterRole},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::ResourceExt;

use crate::{
    constants::{drcluster_name_annotation, CREATED_BY_RAMEN_LABEL, MAINTENANCE_MODE_LABEL, NETWORK_FENCE_APP_LABEL},
    crd::{DRClusterConfig, DeleteOption, Manifest, NetworkFence, PropagationPolicy},
    kvp::{annotation, Annotations, KeyValuePairsExt, Labels},
};

/// The three aggregated `ClusterRole` names bundled into every DR-cluster bundle, each granting
/// the managed-cluster agent edit access to one resource the hub synthesizes or relies on.
const AGGREGATED_CLUSTER_ROLES: [&str; 3] = ["volrepgroup-edit", "mmode-edit", "drclusterconfig-edit"];

/// A bundle of objects and the workload-level settings the `ManifestWork` wrapping them needs.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub manifests: Vec<Manifest>,
    pub labels: Labels,
    pub annotations: Annotations,
    pub delete_option: Option<DeleteOption>,
}

fn object_meta_with_label(name: &str, label: &crate::kvp::Label) -> ObjectMeta {
    let mut labels = std::collections::BTreeMap::new();
    labels.insert(label.key.to_string(), label.value.to_string());
    ObjectMeta {
        name: Some(name.to_string()),
        labels: Some(labels),
        ..Default::default()
    }
}

/// Builds the three aggregated `ClusterRole`s every DR-cluster bundle starts with, each carrying
/// `open-cluster-management.io/aggregate-to-work=true` so the managed-cluster agent folds their
/// verbs into `open-cluster-management:work-execution` (§3 invariant 5).
fn aggregated_cluster_roles() -> Vec<Manifest> {
    let aggregate = annotation::well_known::aggregate_to_work().expect("static annotation is valid");

    AGGREGATED_CLUSTER_ROLES
        .iter()
        .map(|name| {
            let mut role = ClusterRole {
                metadata: ObjectMeta {
                    name: Some((*name).to_string()),
                    ..Default::default()
                },
                rules: Some(vec![]),
                ..Default::default()
            };
            role.annotations_mut()
                .insert(aggregate.key.to_string(), aggregate.value.to_string());
            Manifest::new(serde_json::to_value(role).expect("ClusterRole always serializes"))
        })
        .collect()
}

/// The `ramen-dr-cluster` bundle: the three aggregated `ClusterRole`s plus any caller-supplied
/// extras (the managed-cluster's scoped `DRClusterConfig` viewer role, say). `owner` is the
/// `DRCluster` this bundle belongs to, stamped as an annotation so the controller's own
/// `ManifestWork` watch can map a work-agent status update back to the right cluster (§4.5).
pub fn dr_cluster(extra: Vec<Manifest>, owner: &str) -> Bundle {
    let mut manifests = aggregated_cluster_roles();
    manifests.extend(extra);

    Bundle {
        manifests,
        labels: [CREATED_BY_RAMEN_LABEL.clone()].into_iter().collect(),
        annotations: [drcluster_name_annotation(owner)].into_iter().collect(),
        ..Default::default()
    }
}

/// The `drcconfig-mw` bundle: exactly one object, the synthesized `DRClusterConfig` (§4.3).
pub fn dr_cluster_config(config: &DRClusterConfig, owner: &str) -> Bundle {
    let mut config = config.clone();
    config
        .labels_mut()
        .insert(CREATED_BY_RAMEN_LABEL.key.to_string(), CREATED_BY_RAMEN_LABEL.value.to_string());

    Bundle {
        manifests: vec![Manifest::new(
            serde_json::to_value(config).expect("DRClusterConfig always serializes"),
        )],
        labels: [CREATED_BY_RAMEN_LABEL.clone()].into_iter().collect(),
        annotations: [drcluster_name_annotation(owner)].into_iter().collect(),
        ..Default::default()
    }
}

/// The Namespace bundle: a single `Namespace` object, delivered with an `Orphan`
/// [`DeleteOption`] so tearing down the `ManifestWork` leaves the namespace itself intact on the
/// managed cluster (§3 invariant, testable property 5).
pub fn namespace(name: &str) -> Bundle {
    let ns = Namespace {
        metadata: object_meta_with_label(name, &CREATED_BY_RAMEN_LABEL),
        ..Default::default()
    };

    Bundle {
        manifests: vec![Manifest::new(serde_json::to_value(ns).expect("Namespace always serializes"))],
        labels: [CREATED_BY_RAMEN_LABEL.clone()].into_iter().collect(),
        delete_option: Some(DeleteOption {
            propagation_policy: PropagationPolicy::Orphan,
        }),
        ..Default::default()
    }
}

/// The NetworkFence bundle: a single NF object, labelled `app=NF` for list-by-label discovery.
/// `owner` is the fenced `DRCluster`'s own name, not the peer the `ManifestWork` is physically
/// placed on, so the annotation still maps a status update back to the cluster being fenced.
pub fn network_fence(nf: &NetworkFence, owner: &str) -> Bundle {
    let mut nf = nf.clone();
    nf.labels_mut()
        .insert(NETWORK_FENCE_APP_LABEL.key.to_string(), NETWORK_FENCE_APP_LABEL.value.to_string());
    nf.labels_mut()
        .insert(CREATED_BY_RAMEN_LABEL.key.to_string(), CREATED_BY_RAMEN_LABEL.value.to_string());

    Bundle {
        manifests: vec![Manifest::new(serde_json::to_value(nf).expect("NetworkFence always serializes"))],
        labels: [CREATED_BY_RAMEN_LABEL.clone(), NETWORK_FENCE_APP_LABEL.clone()]
            .into_iter()
            .collect(),
        annotations: [drcluster_name_annotation(owner)].into_iter().collect(),
        ..Default::default()
    }
}

/// The maintenance-mode bundle: labelled so it is discoverable by list-by-label.
pub fn maintenance_mode(objects: Vec<serde_json::Value>) -> Bundle {
    Bundle {
        manifests: objects.into_iter().map(Manifest::new).collect(),
        labels: [CREATED_BY_RAMEN_LABEL.clone(), MAINTENANCE_MODE_LABEL.clone()]
            .into_iter()
            .collect(),
        ..Default::default()
    }
}

/// The VRG bundle: a single `VolumeReplicationGroup` object. The VRG controller itself is out of
/// scope here; this exists so the same delivery substrate that carries `DRClusterConfig` and
/// `NetworkFence` also carries the one other per-application object type the hub produces.
pub fn vrg(vrg: serde_json::Value) -> Bundle {
    Bundle {
        manifests: vec![Manifest::new(vrg)],
        labels: [CREATED_BY_RAMEN_LABEL.clone()].into_iter().collect(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dr_cluster_bundle_always_starts_with_the_three_aggregated_roles() {
        let bundle = dr_cluster(vec![], "east");
        assert_eq!(bundle.manifests.len(), 3);
        for (manifest, name) in bundle.manifests.iter().zip(AGGREGATED_CLUSTER_ROLES) {
            assert_eq!(manifest.kind(), Some("ClusterRole"));
            assert_eq!(
                manifest.0.get("metadata").and_then(|m| m.get("name")).and_then(|n| n.as_str()),
                Some(name)
            );
        }
    }

    #[test]
    fn dr_cluster_bundle_appends_extras_after_the_aggregated_roles() {
        let extra = Manifest::new(serde_json::json!({"apiVersion": "v1", "kind": "ConfigMap"}));
        let bundle = dr_cluster(vec![extra.clone()], "east");
        assert_eq!(bundle.manifests.len(), 4);
        assert_eq!(bundle.manifests[3], extra);
    }

    #[test]
    fn namespace_bundle_orphans_on_delete() {
        let bundle = namespace("my-app-ns");
        assert_eq!(
            bundle.delete_option.unwrap().propagation_policy,
            PropagationPolicy::Orphan
        );
    }

    #[test]
    fn network_fence_bundle_carries_the_nf_app_label() {
        let nf = NetworkFence::new(
            "network-fence-east",
            crate::crd::NetworkFenceSpec {
                cidrs: vec!["10.0.0.0/16".into()],
                fence_state: crate::crd::FenceState::Fenced,
                network_fence_class_name: None,
                driver: Some("driver.csi".into()),
                secret: None,
                cluster_id: Some("abc".into()),
            },
        );
        let bundle = network_fence(&nf, "east");
        assert!(bundle.labels.contains_str_key("app"));
    }

    #[test]
    fn bundles_delivered_by_the_controller_carry_the_owning_drcluster_annotation() {
        use crate::constants::DRCLUSTER_NAME_ANNOTATION_KEY;

        let bundle = dr_cluster(vec![], "east");
        assert_eq!(
            bundle.annotations.to_unvalidated().get(DRCLUSTER_NAME_ANNOTATION_KEY).map(String::as_str),
            Some("east")
        );
    }
}
