//! Manifest-Work Utility: the single write path the `DRCluster` reconciler uses to deliver
//! bundles of objects to a managed cluster (§4.1).
//!
//! Every bundle travels inside a `ManifestWork` named and namespaced per [`naming`], carrying the
//! `created-by-ramen=true` label regardless of what [`bundle`] constructor produced it, and is
//! applied through [`crate::client::Client::apply`] so repeated calls converge rather than churn.
use kube::{Resource, ResourceExt};
use snafu::{ResultExt, Snafu};

use crate::{
    client::Client,
    constants::CREATED_BY_RAMEN_LABEL,
    crd::{
        manifest_work::{CONDITION_APPLIED, CONDITION_AVAILABLE, CONDITION_DEGRADED},
        ManifestWork, ManifestWorkSpec, ManifestWorkload,
    },
    kvp::KeyValuePairsExt,
    status::condition::{is_condition, ConditionStatus},
    validation,
};

pub mod bundle;
pub mod naming;

pub use bundle::Bundle;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{cluster_ns:?} is not a valid managed-cluster namespace: {errors:?}"))]
    InvalidCluster { cluster_ns: String, errors: Vec<String> },

    #[snafu(display("failed to look up ManifestWork {name:?} in {cluster_ns:?}"))]
    Get {
        source: crate::client::Error,
        name: String,
        cluster_ns: String,
    },

    #[snafu(display("failed to apply ManifestWork {name:?} in {cluster_ns:?}"))]
    Apply {
        source: crate::client::Error,
        name: String,
        cluster_ns: String,
    },

    #[snafu(display("failed to delete ManifestWork {name:?} in {cluster_ns:?}"))]
    Delete {
        source: crate::client::Error,
        name: String,
        cluster_ns: String,
    },
}

/// What [`ManifestWorkUtility::create_or_update`] actually did, so callers can decide whether a
/// status write or an event is warranted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Wraps a [`Client`] with the bundle-delivery conventions shared by every `ManifestWork`
/// producer in the hub controller.
#[derive(Clone)]
pub struct ManifestWorkUtility {
    client: Client,
}

impl ManifestWorkUtility {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn validate_cluster_ns(cluster_ns: &str) -> Result<()> {
        validation::validate_namespace_name(cluster_ns, false).map_err(|errors| {
            Error::InvalidCluster {
                cluster_ns: cluster_ns.to_string(),
                errors,
            }
        })
    }

    /// Applies `bundle` as the `ManifestWork` named `name` in `cluster_ns`'s namespace, creating
    /// it if absent. Always attaches [`CREATED_BY_RAMEN_LABEL`] in addition to whatever the bundle
    /// itself carries, and reports whether anything about the workload actually changed so callers
    /// can avoid redundant status writes.
    pub async fn create_or_update(&self, name: &str, cluster_ns: &str, bundle: Bundle) -> Result<Outcome> {
        Self::validate_cluster_ns(cluster_ns)?;

        let existing = self.find(name, cluster_ns).await?;

        let mut mw = ManifestWork::new(
            name,
            ManifestWorkSpec {
                workload: ManifestWorkload {
                    manifests: bundle.manifests,
                },
                delete_option: bundle.delete_option,
            },
        );
        mw.meta_mut().namespace = Some(cluster_ns.to_string());

        let mut labels = bundle.labels.to_unvalidated();
        labels.insert(
            CREATED_BY_RAMEN_LABEL.key.to_string(),
            CREATED_BY_RAMEN_LABEL.value.to_string(),
        );
        *mw.labels_mut() = labels;
        *mw.annotations_mut() = bundle.annotations.to_unvalidated();

        let outcome = match &existing {
            None => Outcome::Created,
            Some(existing) if existing.spec.workload.manifests == mw.spec.workload.manifests => {
                Outcome::Unchanged
            }
            Some(_) => Outcome::Updated,
        };

        self.client.apply(&mw).await.context(ApplySnafu {
            name: name.to_string(),
            cluster_ns: cluster_ns.to_string(),
        })?;

        Ok(outcome)
    }

    /// Looks up the `ManifestWork` named `name` in `cluster_ns`'s namespace, if it exists.
    pub async fn find(&self, name: &str, cluster_ns: &str) -> Result<Option<ManifestWork>> {
        Self::validate_cluster_ns(cluster_ns)?;

        match self.client.get::<ManifestWork>(name, Some(cluster_ns)).await {
            Ok(mw) => Ok(Some(mw)),
            Err(crate::client::Error::Get { source, .. }) if is_not_found(&source) => Ok(None),
            Err(source) => Err(Error::Get {
                source,
                name: name.to_string(),
                cluster_ns: cluster_ns.to_string(),
            }),
        }
    }

    /// Deletes the `ManifestWork` named `name` in `cluster_ns`'s namespace. Idempotent: a
    /// not-found response is treated as success.
    pub async fn delete(&self, name: &str, cluster_ns: &str) -> Result<()> {
        Self::validate_cluster_ns(cluster_ns)?;

        self.client
            .delete::<ManifestWork>(name, cluster_ns)
            .await
            .context(DeleteSnafu {
                name: name.to_string(),
                cluster_ns: cluster_ns.to_string(),
            })
    }

    /// Returns whether the managed-cluster work agent has reported the bundle's manifests as
    /// fully applied: `Applied=True` and `Available=True`, and NOT `Degraded=True` (§4.1, §8
    /// testable property 7).
    pub fn is_applied(mw: &ManifestWork) -> bool {
        let conditions = mw.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default();
        is_condition(conditions, CONDITION_APPLIED, ConditionStatus::True)
            && is_condition(conditions, CONDITION_AVAILABLE, ConditionStatus::True)
            && !is_condition(conditions, CONDITION_DEGRADED, ConditionStatus::True)
    }

    /// Decodes the first embedded manifest matching `T`'s GVK, if any.
    pub fn extract<T>(mw: &ManifestWork) -> Option<T>
    where
        T: kube::Resource<DynamicType = ()> + serde::de::DeserializeOwned,
    {
        mw.spec.workload.manifests.iter().find_map(crate::crd::Manifest::extract)
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(err) if err.code == 404)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_cluster_ns_is_rejected_before_any_client_call() {
        let err = ManifestWorkUtility::validate_cluster_ns("Not_A_Namespace").unwrap_err();
        assert!(matches!(err, Error::InvalidCluster { .. }));
    }

    fn condition(type_: &str, status: &str) -> k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition {
        use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
        Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: "Test".to_string(),
            message: String::new(),
            observed_generation: None,
            last_transition_time: Time(chrono::DateTime::from_timestamp(0, 0).unwrap()),
        }
    }

    fn bare_manifest_work() -> ManifestWork {
        ManifestWork::new(
            "ramen-dr-cluster",
            ManifestWorkSpec {
                workload: ManifestWorkload { manifests: vec![] },
                delete_option: None,
            },
        )
    }

    #[test]
    fn is_applied_requires_applied_and_available_but_not_degraded() {
        let mut mw = bare_manifest_work();
        assert!(!ManifestWorkUtility::is_applied(&mw));

        mw.status = Some(crate::crd::ManifestWorkStatus {
            conditions: vec![condition(CONDITION_APPLIED, "True")],
        });
        assert!(!ManifestWorkUtility::is_applied(&mw), "Available is still missing");

        mw.status = Some(crate::crd::ManifestWorkStatus {
            conditions: vec![condition(CONDITION_APPLIED, "True"), condition(CONDITION_AVAILABLE, "True")],
        });
        assert!(ManifestWorkUtility::is_applied(&mw));

        mw.status = Some(crate::crd::ManifestWorkStatus {
            conditions: vec![
                condition(CONDITION_APPLIED, "True"),
                condition(CONDITION_AVAILABLE, "True"),
                condition(CONDITION_DEGRADED, "True"),
            ],
        });
        assert!(!ManifestWorkUtility::is_applied(&mw), "Degraded=True must veto Applied");
    }
}
