//! `ManifestWork`: the Open-Cluster-Management delivery unit for a bundle of hub-generated
//! objects addressed to a single managed cluster (§4.1).
//!
//! `spec.workload.manifests` carries a polymorphic list of raw Kubernetes objects — encoded here
//! as a tagged `{gvk, rawBytes}`-style variant via [`Manifest`], which stores the object as
//! untyped JSON and extracts its `apiVersion`/`kind` on demand rather than carrying a closed enum
//! of every possible payload type (per the "dynamic dispatch" design note).
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "work.open-cluster-management.io",
    version = "v1",
    kind = "ManifestWork",
    plural = "manifestworks",
    namespaced,
    status = "ManifestWorkStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkSpec {
    pub workload: ManifestWorkload,

    /// Controls what happens to the bundle's objects when the `ManifestWork` itself is deleted.
    /// Defaults to `Foreground` (the objects are deleted too); the Namespace bundle sets this to
    /// `Orphan` so tearing down the MW leaves the namespace intact (§4.1, testable property 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_option: Option<DeleteOption>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkload {
    #[serde(default)]
    pub manifests: Vec<Manifest>,
}

/// A single raw Kubernetes object embedded in a `ManifestWork`'s workload.
///
/// Serializes/deserializes transparently as the object's own JSON representation; GVK is
/// recovered on demand from the embedded `apiVersion`/`kind` fields rather than stored
/// out-of-band, so two manifests are byte-identical iff their underlying objects are — which is
/// what `CreateOrUpdate`'s deep-equality check relies on.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(transparent)]
pub struct Manifest(pub serde_json::Value);

impl Manifest {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The `apiVersion` string of the embedded object, if present.
    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(serde_json::Value::as_str)
    }

    /// The `kind` string of the embedded object, if present.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(serde_json::Value::as_str)
    }

    /// Returns whether this manifest's `apiVersion`/`kind` match the ones requested.
    pub fn matches_gvk(&self, api_version: &str, kind: &str) -> bool {
        self.api_version() == Some(api_version) && self.kind() == Some(kind)
    }

    /// Decodes the embedded object as `T`, if its GVK matches and it deserializes cleanly.
    pub fn extract<T: kube::Resource<DynamicType = ()> + serde::de::DeserializeOwned>(
        &self,
    ) -> Option<T> {
        let dt = T::DynamicType::default();
        if !self.matches_gvk(&format!("{}", T::api_version(&dt)), &T::kind(&dt)) {
            return None;
        }
        serde_json::from_value(self.0.clone()).ok()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOption {
    pub propagation_policy: PropagationPolicy,
}

#[derive(Clone, Copy, Debug, Default, Display, EnumString, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum PropagationPolicy {
    #[default]
    Foreground,
    Orphan,
    SelectivelyOrphan,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkStatus {
    #[serde(default)]
    pub conditions: Vec<k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition>,
}

/// Condition type reported by the managed-cluster work agent once the manifests have been
/// applied to the API server.
pub const CONDITION_APPLIED: &str = "Applied";
/// Condition type reported once every applied resource reports itself available.
pub const CONDITION_AVAILABLE: &str = "Available";
/// Condition type reported when one or more applied resources are unhealthy.
pub const CONDITION_DEGRADED: &str = "Degraded";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_reports_its_own_gvk() {
        let manifest = Manifest::new(serde_json::json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": "east" },
        }));

        assert_eq!(manifest.api_version(), Some("v1"));
        assert_eq!(manifest.kind(), Some("Namespace"));
        assert!(manifest.matches_gvk("v1", "Namespace"));
        assert!(!manifest.matches_gvk("v1", "ConfigMap"));
    }
}
