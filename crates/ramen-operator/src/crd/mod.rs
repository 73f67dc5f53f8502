//! Custom resource definitions owned or consumed by the `DRCluster` controller.
//!
//! `dr_cluster`, `dr_policy` and `dr_cluster_config` are owned by this codebase.
//! `network_fence` and `network_fence_class` mirror the CSI-addons CRDs the storage provider
//! reconciles against. `manifest_work`, `managed_cluster_view` and `managed_cluster` mirror the
//! Open-Cluster-Management types the hub delivers work through and reads registration state
//! from. `dr_placement_control` is consulted only for its event-filtering interface.
pub mod dr_cluster;
pub mod dr_cluster_config;
pub mod dr_placement_control;
pub mod dr_policy;
pub mod managed_cluster;
pub mod managed_cluster_view;
pub mod manifest_work;
pub mod network_fence;
pub mod network_fence_class;

pub use dr_cluster::{ClusterFenceState, DRCluster, DRClusterPhase, DRClusterSpec, DRClusterStatus};
pub use dr_cluster_config::{DRClusterConfig, DRClusterConfigSpec, DRClusterConfigStatus};
pub use dr_placement_control::{DRPlacementControl, DRPlacementControlSpec, DRPlacementControlStatus};
pub use dr_policy::{DRPolicy, DRPolicySpec, DRPolicyStatus};
pub use managed_cluster::ManagedCluster;
pub use managed_cluster_view::{ManagedClusterView, ManagedClusterViewSpec, ManagedClusterViewStatus, ViewScope};
pub use manifest_work::{DeleteOption, Manifest, ManifestWork, ManifestWorkSpec, ManifestWorkStatus, ManifestWorkload, PropagationPolicy};
pub use network_fence::{FenceState, NetworkFence, NetworkFenceSpec, NetworkFenceStatus, SecretReference};
pub use network_fence_class::{NetworkFenceClass, NetworkFenceClassSpec};
