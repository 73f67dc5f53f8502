//! A thin wrapper around [`kube::Client`] used throughout the hub controllers.
//!
//! It centralizes the small set of conventions the reconcilers rely on: building namespaced or
//! cluster-wide [`Api`] handles, applying objects with server-side apply, and retrying writes that
//! lose an optimistic-concurrency race.

use std::time::Duration;

use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{
    api::{ListParams, Patch, PatchParams},
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use snafu::{ResultExt, Snafu};
use tokio::time::sleep;

/// Field manager used for all server-side apply requests issued by the hub.
pub const FIELD_MANAGER: &str = "ramen-hub";

/// The number of times a conflicting write is retried before giving up.
const MAX_APPLY_RETRIES: u32 = 5;

/// The delay between two retries of a conflicting write.
const APPLY_RETRY_BACKOFF: Duration = Duration::from_millis(200);

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to apply {object}"))]
    Apply {
        source: kube::Error,
        object: String,
    },

    #[snafu(display("failed to get {object}"))]
    Get {
        source: kube::Error,
        object: String,
    },

    #[snafu(display("failed to delete {object}"))]
    Delete {
        source: kube::Error,
        object: String,
    },

    #[snafu(display("exhausted all {attempts} attempts to apply {object}"))]
    ApplyRetriesExhausted {
        source: kube::Error,
        object: String,
        attempts: u32,
    },

    #[snafu(display("failed to list {kind}"))]
    List { source: kube::Error, kind: &'static str },
}

/// Wraps a [`kube::Client`] and provides the access patterns used by the hub controllers.
#[derive(Clone)]
pub struct Client {
    client: kube::Client,
    field_manager: String,
}

impl Client {
    pub fn new(client: kube::Client) -> Self {
        Self {
            client,
            field_manager: FIELD_MANAGER.to_string(),
        }
    }

    /// Returns the underlying [`kube::Client`], which can be freely cloned and used directly.
    pub fn as_kube_client(&self) -> kube::Client {
        self.client.clone()
    }

    /// Returns an [`Api`] scoped to the given namespace.
    pub fn get_api<T>(&self, namespace: &str) -> Api<T>
    where
        T: Resource<Scope = NamespaceResourceScope>,
        T::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Returns an [`Api`] that is not scoped to any namespace.
    pub fn get_all_api<T>(&self) -> Api<T>
    where
        T: Resource,
        T::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }

    pub async fn get<T>(&self, name: &str, namespace: Option<&str>) -> Result<T>
    where
        T: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        T::DynamicType: Default,
    {
        let api = match namespace {
            Some(namespace) => self.get_api::<T>(namespace),
            None => self.get_all_api::<T>(),
        };
        api.get(name).await.context(GetSnafu {
            object: name.to_string(),
        })
    }

    /// Applies `object` using server-side apply, retrying a handful of times if the write loses a
    /// race against a concurrent update (`409 Conflict`).
    ///
    /// This is the single write path the ManifestWork utility and the DRCluster reconciler use to
    /// create-or-update an object idempotently: the same call creates the object on its first
    /// invocation and reconciles drift on every subsequent one.
    pub async fn apply<T>(&self, object: &T) -> Result<T>
    where
        T: Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + std::fmt::Debug,
        T::DynamicType: Default,
    {
        let namespace = object.namespace().unwrap_or_default();
        let name = object.name_any();
        let api = self.get_api::<T>(&namespace);
        let patch_params = PatchParams::apply(&self.field_manager).force();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match api.patch(&name, &patch_params, &Patch::Apply(object)).await {
                Ok(applied) => return Ok(applied),
                Err(kube::Error::Api(err)) if err.code == 409 && attempt < MAX_APPLY_RETRIES => {
                    tracing::debug!(
                        object = %name,
                        attempt,
                        "apply conflicted with a concurrent write, retrying"
                    );
                    sleep(APPLY_RETRY_BACKOFF * attempt).await;
                }
                Err(source) if attempt >= MAX_APPLY_RETRIES => {
                    return Err(source).context(ApplyRetriesExhaustedSnafu {
                        object: name,
                        attempts: attempt,
                    });
                }
                Err(source) => {
                    return Err(source).context(ApplySnafu { object: name });
                }
            }
        }
    }

    pub async fn delete<T>(&self, name: &str, namespace: &str) -> Result<()>
    where
        T: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        T::DynamicType: Default,
    {
        let api = self.get_api::<T>(namespace);
        match api.delete(name, &Default::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
            Err(source) => Err(source).context(DeleteSnafu {
                object: name.to_string(),
            }),
        }
    }

    /// Cluster-scoped counterpart of [`Client::get`], for kinds such as `DRCluster` and `DRPolicy`
    /// that have no namespace of their own.
    pub async fn get_cluster<T>(&self, name: &str) -> Result<T>
    where
        T: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        T::DynamicType: Default,
    {
        self.get_all_api::<T>().get(name).await.context(GetSnafu {
            object: name.to_string(),
        })
    }

    /// Cluster-scoped counterpart of [`Client::apply`]; same conflict-retry behavior.
    pub async fn apply_cluster<T>(&self, object: &T) -> Result<T>
    where
        T: Resource<Scope = ClusterResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + std::fmt::Debug,
        T::DynamicType: Default,
    {
        let name = object.name_any();
        let api = self.get_all_api::<T>();
        let patch_params = PatchParams::apply(&self.field_manager).force();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match api.patch(&name, &patch_params, &Patch::Apply(object)).await {
                Ok(applied) => return Ok(applied),
                Err(kube::Error::Api(err)) if err.code == 409 && attempt < MAX_APPLY_RETRIES => {
                    tracing::debug!(
                        object = %name,
                        attempt,
                        "apply conflicted with a concurrent write, retrying"
                    );
                    sleep(APPLY_RETRY_BACKOFF * attempt).await;
                }
                Err(source) if attempt >= MAX_APPLY_RETRIES => {
                    return Err(source).context(ApplyRetriesExhaustedSnafu {
                        object: name,
                        attempts: attempt,
                    });
                }
                Err(source) => {
                    return Err(source).context(ApplySnafu { object: name });
                }
            }
        }
    }

    /// Merge-patches the `status` subresource of a cluster-scoped object, used by the `DRCluster`
    /// reconciler to persist its phase and conditions without going through server-side apply
    /// (which would otherwise contend with the spec-owning field manager over shared fields).
    pub async fn patch_status_cluster<T>(&self, name: &str, status: &serde_json::Value) -> Result<T>
    where
        T: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        T::DynamicType: Default,
    {
        let api = self.get_all_api::<T>();
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .context(ApplySnafu {
                object: name.to_string(),
            })
    }

    /// Merge-patches `metadata.labels`/`metadata.finalizers` on a cluster-scoped object. Used for
    /// the idempotent add-on-first-reconcile / remove-on-cleanup finalizer dance; a dedicated
    /// merge patch is used instead of server-side apply so it never clobbers metadata owned by
    /// another controller.
    pub async fn patch_metadata_cluster<T>(
        &self,
        name: &str,
        labels: &std::collections::BTreeMap<String, String>,
        finalizers: &[String],
    ) -> Result<T>
    where
        T: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        T::DynamicType: Default,
    {
        let api = self.get_all_api::<T>();
        let patch = serde_json::json!({ "metadata": { "labels": labels, "finalizers": finalizers } });
        api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .context(ApplySnafu {
                object: name.to_string(),
            })
    }

    /// Lists every object of a cluster-scoped kind, used to scan `DRPolicy`/`DRCluster`/
    /// `ManagedCluster` for peer selection and config synthesis.
    pub async fn list_cluster<T>(&self, kind: &'static str) -> Result<Vec<T>>
    where
        T: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        T::DynamicType: Default,
    {
        self.get_all_api::<T>()
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .context(ListSnafu { kind })
    }
}
