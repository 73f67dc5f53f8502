//! `ManagedClusterView`: a read-only request for a snapshot of a single named object on a
//! managed cluster, and the hub-side projection of its result (§4, MCV getter).
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "view.open-cluster-management.io",
    version = "v1beta1",
    kind = "ManagedClusterView",
    plural = "managedclusterviews",
    namespaced,
    status = "ManagedClusterViewStatus",
    crates(kube_core = "kube::core", k8s_openapi = "k8s_openapi", schemars = "schemars")
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterViewSpec {
    pub scope: ViewScope,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub version: String,
    pub resource: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterViewStatus {
    #[serde(default)]
    pub conditions: Vec<k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition>,

    /// The requested object's resource-version-stamped snapshot, once the view has synced.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}
