//! Managed-Cluster-View Getter: requests a read-only projection of a single named remote object
//! from a managed cluster and returns a typed snapshot once the view agent has synced it (§2,
//! §4.2 "reads the NetworkFence snapshot via MCV").
//!
//! The peer lookup this feeds forms a cycle at the object-graph level (cluster A's reconcile may
//! reference B, whose reconcile may reference A); the getter always resolves the peer by name
//! through the API store rather than by holding an in-memory pointer, so the cycle never has to
//! be broken in-process (§9 "Cyclic references").
use kube::Resource;
use snafu::{ResultExt, Snafu};

use crate::{
    client::Client,
    crd::{ManagedClusterView, ManagedClusterViewSpec, ManagedClusterViewStatus, ViewScope},
};

pub mod naming;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to create or update ManagedClusterView {name:?} in {cluster_ns:?}"))]
    Apply {
        source: crate::client::Error,
        name: String,
        cluster_ns: String,
    },

    #[snafu(display("failed to look up ManagedClusterView {name:?} in {cluster_ns:?}"))]
    Get {
        source: crate::client::Error,
        name: String,
        cluster_ns: String,
    },

    #[snafu(display("failed to delete ManagedClusterView {name:?} in {cluster_ns:?}"))]
    Delete {
        source: crate::client::Error,
        name: String,
        cluster_ns: String,
    },

    #[snafu(display("ManagedClusterView {name:?} synced a result that does not decode as the requested type"))]
    Decode {
        source: serde_json::Error,
        name: String,
    },
}

/// Wraps a [`Client`] with the request-then-poll convention every remote-snapshot read in the
/// `DRCluster` controller uses.
#[derive(Clone)]
pub struct ManagedClusterViewGetter {
    client: Client,
}

impl ManagedClusterViewGetter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Ensures a `ManagedClusterView` named `name` requesting `scope` exists in `cluster_ns`'s
    /// namespace, then returns the decoded snapshot if the view agent has already synced one.
    /// Returns `Ok(None)` both when the view was just created and when it is still processing —
    /// the caller is expected to requeue and call again.
    pub async fn get<T>(&self, name: &str, cluster_ns: &str, scope: ViewScope) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut mcv = ManagedClusterView::new(name, ManagedClusterViewSpec { scope });
        mcv.meta_mut().namespace = Some(cluster_ns.to_string());

        self.client.apply(&mcv).await.context(ApplySnafu {
            name: name.to_string(),
            cluster_ns: cluster_ns.to_string(),
        })?;

        let Some(observed) = self.find(name, cluster_ns).await? else {
            return Ok(None);
        };

        let Some(result) = observed.status.and_then(|status: ManagedClusterViewStatus| status.result) else {
            return Ok(None);
        };

        serde_json::from_value(result)
            .context(DecodeSnafu { name: name.to_string() })
            .map(Some)
    }

    /// Looks up the `ManagedClusterView` named `name` in `cluster_ns`'s namespace, if it exists.
    pub async fn find(&self, name: &str, cluster_ns: &str) -> Result<Option<ManagedClusterView>> {
        match self.client.get::<ManagedClusterView>(name, Some(cluster_ns)).await {
            Ok(mcv) => Ok(Some(mcv)),
            Err(crate::client::Error::Get { source, .. }) if is_not_found(&source) => Ok(None),
            Err(source) => Err(Error::Get {
                source,
                name: name.to_string(),
                cluster_ns: cluster_ns.to_string(),
            }),
        }
    }

    /// Deletes the `ManagedClusterView` named `name` in `cluster_ns`'s namespace. Idempotent.
    pub async fn delete(&self, name: &str, cluster_ns: &str) -> Result<()> {
        self.client
            .delete::<ManagedClusterView>(name, cluster_ns)
            .await
            .context(DeleteSnafu {
                name: name.to_string(),
                cluster_ns: cluster_ns.to_string(),
            })
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(err) if err.code == 404)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_without_a_synced_result_decodes_to_none() {
        let mcv = ManagedClusterView::new(
            "networkfence-east-mcv",
            ManagedClusterViewSpec {
                scope: ViewScope {
                    group: Some("csiaddons.openshift.io".into()),
                    version: "v1alpha1".into(),
                    resource: "networkfences".into(),
                    name: "network-fence-east".into(),
                    namespace: None,
                },
            },
        );
        assert!(mcv.status.is_none());
    }
}
