//! Deterministic `ManagedClusterView` naming: one view per (kind, target object name).
use strum::Display as StrumDisplay;

/// The kind of remote object a view requests, used only to namespace the view's own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum ViewedKind {
    NetworkFence,
    DRClusterConfig,
}

/// `"<kind>-<objectName>-mcv"`, lowercased so it is always a valid Kubernetes object name.
pub fn view_name(kind: ViewedKind, object_name: &str) -> String {
    format!("{kind}-{object_name}-mcv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_fence_view_name() {
        assert_eq!(
            view_name(ViewedKind::NetworkFence, "network-fence-east"),
            "networkfence-network-fence-east-mcv"
        );
    }

    #[test]
    fn dr_cluster_config_view_name() {
        assert_eq!(view_name(ViewedKind::DRClusterConfig, "east"), "drclusterconfig-east-mcv");
    }
}
