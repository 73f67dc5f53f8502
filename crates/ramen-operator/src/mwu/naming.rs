//! Deterministic `ManifestWork` naming (§3 invariant 1, §6 "ManifestWork naming formats").

/// The singleton DR-cluster bundle's name, the same on every managed cluster.
pub const DR_CLUSTER_BUNDLE_NAME: &str = "ramen-dr-cluster";

/// `"<type>-mw"` — singleton cluster-scoped bundles, such as `DRClusterConfig`.
pub fn singleton(type_: &str) -> String {
    format!("{type_}-mw")
}

/// `"<inst>-<ns>-<type>-mw"` — per-application types (VRG, Namespace).
pub fn per_application(instance: &str, namespace: &str, type_: &str) -> String {
    format!("{instance}-{namespace}-{type_}-mw")
}

/// `"<inst>-<cluster>-<type>-mw"` — NetworkFence and MaintenanceMode bundles.
pub fn per_cluster(instance: &str, cluster: &str, type_: &str) -> String {
    format!("{instance}-{cluster}-{type_}-mw")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dr_cluster_bundle_name_is_fixed() {
        assert_eq!(DR_CLUSTER_BUNDLE_NAME, "ramen-dr-cluster");
    }

    #[test]
    fn singleton_appends_mw_suffix() {
        assert_eq!(singleton("drcconfig"), "drcconfig-mw");
    }

    #[test]
    fn per_application_matches_the_documented_format() {
        assert_eq!(per_application("east", "myapp-ns", "vrg"), "east-myapp-ns-vrg-mw");
    }

    #[test]
    fn per_cluster_matches_the_fencing_example() {
        assert_eq!(per_cluster("east", "west", "nf"), "east-west-nf-mw");
    }
}
