//! Well-known constants shared across the manifest-work utility, the managed-cluster-view
//! getter and the `DRCluster` controller.
use std::sync::LazyLock;

use crate::kvp::{Annotation, Label};

/// Sentinel `S3ProfileName` meaning "this cluster has no object store configured"; the S3
/// validation step is skipped entirely when a `DRCluster` carries this value.
pub const NO_S3_STORE_AVAILABLE: &str = "NoS3StoreAvailable";

/// Annotation carrying the CSI driver name used to fence the cluster's storage.
pub const STORAGE_DRIVER_KEY: &str = "drcluster.ramendr.openshift.io/storage-driver";

/// Annotation naming the `Secret` holding storage-provider credentials.
pub const STORAGE_SECRET_NAME_KEY: &str = "drcluster.ramendr.openshift.io/storage-secret-name";

/// Annotation naming the namespace of the storage-provider credentials `Secret`.
pub const STORAGE_SECRET_NAMESPACE_KEY: &str =
    "drcluster.ramendr.openshift.io/storage-secret-namespace";

/// Annotation carrying the storage provider's own notion of the cluster's identity.
pub const STORAGE_CLUSTER_ID_KEY: &str = "drcluster.ramendr.openshift.io/storage-clusterid";

/// Annotation recording the owning `DRCluster`'s name on any `ManifestWork`/`ManagedClusterView`
/// the controller creates.
pub const DRCLUSTER_NAME_ANNOTATION_KEY: &str = "drcluster.ramendr.openshift.io/drcluster-name";

/// Label marking every object this codebase is responsible for, regardless of which bundle it
/// travels in.
pub static CREATED_BY_RAMEN_LABEL: LazyLock<Label> = LazyLock::new(|| {
    Label::try_from(("created-by-ramen", "true")).expect("static label is always valid")
});

/// Label attached to a bundled `NetworkFence` object so it can be discovered by list-by-label.
pub static NETWORK_FENCE_APP_LABEL: LazyLock<Label> =
    LazyLock::new(|| Label::try_from(("app", "NF")).expect("static label is always valid"));

/// Label attached to maintenance-mode bundles so they are discoverable by list-by-label.
pub static MAINTENANCE_MODE_LABEL: LazyLock<Label> = LazyLock::new(|| {
    Label::try_from(("MModesLabel", "")).expect("static label is always valid")
});

/// Label added to every `DRCluster` on first reconcile so the cluster-backup tooling includes it
/// (§4.2 step 2, "Add labels (backup label)").
pub static VELERO_BACKUP_LABEL: LazyLock<Label> = LazyLock::new(|| {
    Label::try_from(("cluster.open-cluster-management.io/backup", "ramen"))
        .expect("static label is always valid")
});

/// Annotation recording the owning `DRCluster`'s name on a produced object.
pub fn drcluster_name_annotation(name: &str) -> Annotation {
    Annotation::try_from((DRCLUSTER_NAME_ANNOTATION_KEY, name))
        .expect("drcluster name is always a valid annotation value")
}
