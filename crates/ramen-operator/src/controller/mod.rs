//! The `DRCluster` reconciler: per-cluster fencing state machine (§4.2), `DRClusterConfig`
//! synthesis (§4.3) and peer/fence-class selection (§4.4), composed over the manifest-work and
//! managed-cluster-view substrates.
use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{
    runtime::{
        controller::{Action, Controller},
        reflector::ObjectRef,
        watcher, WatchStreamExt,
    },
    Resource, ResourceExt,
};
use snafu::{OptionExt, ResultExt, Snafu};
use strum::EnumDiscriminants;
use tracing::warn;

use crate::{
    cidr,
    client::Client,
    utils::format_full_controller_name,
    config::OperatorConfig,
    constants::{NO_S3_STORE_AVAILABLE, VELERO_BACKUP_LABEL},
    crd::{
        dr_cluster::{CONDITION_CLEAN, CONDITION_FENCED, CONDITION_VALIDATED, DR_CLUSTER_FINALIZER},
        ClusterFenceState, DRCluster, DRClusterConfig, DRClusterPhase, DRClusterStatus, DRPlacementControl, DRPolicy,
        FenceState, ManagedCluster, ManifestWork, NetworkFence,
    },
    logging::controller::ReconcilerError,
    mcv::{
        naming::{view_name, ViewedKind},
        ManagedClusterViewGetter,
    },
    mwu::{bundle, naming, ManifestWorkUtility},
    objectstore,
    status::condition::{set_condition, ConditionStatus},
};

pub mod config_synth;
pub mod fence;
pub mod peer;
pub mod predicates;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(strum::IntoStaticStr))]
pub enum Error {
    #[snafu(display("failed to load the hub operator config"))]
    LoadConfig { source: crate::config::Error },

    #[snafu(display("failed to deliver the {bundle:?} bundle for {cluster:?}"))]
    DeliverBundle {
        source: crate::mwu::Error,
        bundle: &'static str,
        cluster: String,
    },

    #[snafu(display("no peer cluster could be selected for {cluster:?}"))]
    NoPeer { cluster: String },

    #[snafu(display("failed to select a NetworkFence class or synthesize one for {cluster:?}"))]
    FenceSynthesis {
        source: crate::controller::peer::Error,
        cluster: String,
    },

    #[snafu(display("failed to read the remote view {name:?}"))]
    ReadView { source: crate::mcv::Error, name: String },

    #[snafu(display("failed to list {kind}"))]
    List { source: crate::client::Error, kind: &'static str },

    #[snafu(display("failed to patch {cluster:?}"))]
    Patch { source: crate::client::Error, cluster: String },

    #[snafu(display("{cluster:?} has not yet registered a ManagedCluster"))]
    ManagedClusterMissing {
        source: crate::client::Error,
        cluster: String,
    },
}

impl ReconcilerError for Error {
    fn category(&self) -> &'static str {
        ErrorDiscriminants::from(self).into()
    }
}

/// Shared collaborators the reconciler needs on every tick (§2).
pub struct Context {
    pub client: Client,
    pub mwu: ManifestWorkUtility,
    pub mcv: ManagedClusterViewGetter,
    pub operator_namespace: String,
}

fn now() -> Time {
    Time(chrono::Utc::now())
}

/// Builds the [`crate::crd::ViewScope`] requesting the whole of `T` named `name`, recovering its
/// GVK from `T`'s own `Resource` impl rather than hardcoding it per call site (§9 "Dynamic
/// dispatch").
fn view_scope<T>(name: &str) -> crate::crd::ViewScope
where
    T: Resource<DynamicType = ()>,
{
    let dt = T::DynamicType::default();
    let group = T::group(&dt);

    crate::crd::ViewScope {
        group: (!group.is_empty()).then(|| group.into_owned()),
        version: T::version(&dt).into_owned(),
        resource: T::plural(&dt).into_owned(),
        name: name.to_string(),
        namespace: None,
    }
}

/// Applies a [`fence::Stage`]'s `(Fenced, Clean)` row and phase onto `status` in one step.
fn apply_stage(status: &mut DRClusterStatus, stage: fence::Stage, generation: Option<i64>) {
    let row = stage.condition_row();
    if let Some(fenced) = row.fenced {
        set_condition(&mut status.conditions, CONDITION_FENCED, fenced, row.reason, "", generation, now());
    }
    set_condition(&mut status.conditions, CONDITION_CLEAN, row.clean, row.reason, "", generation, now());
    status.phase = stage.phase();
}

struct FenceOutcome {
    requeue: bool,
}

/// §4.2 step 5: "Process the fence intent". Dispatches on `spec.clusterFence`; the Ramen-driven
/// `Fenced`/`Unfenced` intents are handed to [`drive_ramen_fence`], the manual and absent intents
/// are direct condition assertions with no remote object involved.
///
/// An absent `spec.clusterFence` is deliberately NOT folded into the `ManuallyUnfenced` arm: both
/// assert `Clean=True`/phase `Available`, but carry distinct reasons (`NoFenceIntent` vs.
/// `ManuallyUnfenced`) so an operator who erases the field on a previously-fenced cluster is not
/// silently indistinguishable from a freshly-created one (§9 "Open questions").
async fn process_fence_intent(
    ctx: &Context,
    target: &DRCluster,
    status: &mut DRClusterStatus,
    clusters: &[DRCluster],
    policies: &[DRPolicy],
    generation: Option<i64>,
) -> Result<FenceOutcome> {
    match target.spec.cluster_fence {
        None | Some(ClusterFenceState::Unknown) => {
            apply_stage(status, fence::Stage::ValidatedNoFence, generation);
            Ok(FenceOutcome { requeue: false })
        }
        Some(ClusterFenceState::ManuallyFenced) => {
            apply_stage(status, fence::Stage::Fenced, generation);
            Ok(FenceOutcome { requeue: false })
        }
        Some(ClusterFenceState::ManuallyUnfenced) => {
            apply_stage(status, fence::Stage::Clean, generation);
            Ok(FenceOutcome { requeue: false })
        }
        Some(ClusterFenceState::Fenced) => {
            drive_ramen_fence(ctx, target, status, clusters, policies, FenceState::Fenced, generation).await
        }
        Some(ClusterFenceState::Unfenced) => {
            drive_ramen_fence(ctx, target, status, clusters, policies, FenceState::Unfenced, generation).await
        }
    }
}

/// §4.2 "Fence sub-state machine": places (or reads back) the `NetworkFence` that carries out a
/// Ramen-driven fence/unfence of `target`, advancing phase/conditions as the remote object
/// catches up, and drives Clean once an unfence has been confirmed (§8 scenario 6).
async fn drive_ramen_fence(
    ctx: &Context,
    target: &DRCluster,
    status: &mut DRClusterStatus,
    clusters: &[DRCluster],
    policies: &[DRPolicy],
    intent: FenceState,
    generation: Option<i64>,
) -> Result<FenceOutcome> {
    let target_name = target.name_any();

    let peer = peer::select_peer(target, policies, clusters).context(NoPeerSnafu {
        cluster: target_name.clone(),
    })?;
    let peer_ns = peer.name_any();

    let peer_config_view = view_name(ViewedKind::DRClusterConfig, &peer_ns);
    let peer_config: Option<DRClusterConfig> = ctx
        .mcv
        .get(&peer_config_view, &peer_ns, view_scope::<DRClusterConfig>(&peer_ns))
        .await
        .context(ReadViewSnafu {
            name: peer_config_view.clone(),
        })?;

    let classes = peer_config
        .map(|config| peer::matching_fence_classes(&config.status))
        .unwrap_or_else(|| vec![String::new()]);
    let class = classes.first().cloned().unwrap_or_default();

    let nf = peer::synthesize(target, &class).context(FenceSynthesisSnafu {
        cluster: target_name.clone(),
    })?;
    let nf_name = nf.name_any();
    let mw_name = naming::per_cluster(&target_name, &peer_ns, "nf");

    let already_in_progress = match intent {
        FenceState::Fenced => matches!(status.phase, DRClusterPhase::Fencing | DRClusterPhase::Fenced),
        FenceState::Unfenced => matches!(status.phase, DRClusterPhase::Unfencing | DRClusterPhase::Unfenced),
    };

    if !already_in_progress {
        ctx.mwu
            .create_or_update(&mw_name, &peer_ns, bundle::network_fence(&nf, &target_name))
            .await
            .context(DeliverBundleSnafu {
                bundle: "network-fence",
                cluster: target_name.clone(),
            })?;

        let stage = match intent {
            FenceState::Fenced => fence::Stage::Fencing,
            FenceState::Unfenced => fence::Stage::Unfencing,
        };
        apply_stage(status, stage, generation);
        return Ok(FenceOutcome { requeue: true });
    }

    let nf_view_name = view_name(ViewedKind::NetworkFence, &nf_name);
    let observed: Option<NetworkFence> = ctx
        .mcv
        .get(&nf_view_name, &peer_ns, view_scope::<NetworkFence>(&nf_name))
        .await
        .context(ReadViewSnafu {
            name: nf_view_name.clone(),
        })?;

    let Some(observed) = observed else {
        return Ok(FenceOutcome { requeue: true });
    };

    if !fence::fence_satisfied(&observed, intent) {
        return Ok(FenceOutcome { requeue: true });
    }

    match intent {
        FenceState::Fenced => {
            apply_stage(status, fence::Stage::Fenced, generation);
            Ok(FenceOutcome { requeue: false })
        }
        FenceState::Unfenced => {
            apply_stage(status, fence::Stage::Unfenced, generation);

            // Clean: delete the NF MW from both the peer (where it actually lives, per §3
            // invariant 4) and the target's own namespace (defensive — never populated in normal
            // operation, but cleanup must not leave an artifact there either).
            let target_mw = naming::per_cluster(&target_name, &target_name, "nf");
            let target_deleted = ctx.mwu.delete(&target_mw, &target_name).await;
            let peer_deleted = ctx.mwu.delete(&mw_name, &peer_ns).await;

            match (target_deleted, peer_deleted) {
                (Ok(()), Ok(())) => {
                    apply_stage(status, fence::Stage::Clean, generation);
                    Ok(FenceOutcome { requeue: false })
                }
                _ => {
                    apply_stage(status, fence::Stage::Cleaning, generation);
                    Ok(FenceOutcome { requeue: true })
                }
            }
        }
    }
}

/// §4.2 step 9: "Reconcile maintenance-mode MWs". Maintenance-mode objects are synthesized by the
/// out-of-scope DRPC/VRG controllers (§1); the `DRCluster` controller itself never produces one,
/// so this step is a deliberate no-op, kept as an explicit tick so a future maintenance-mode
/// producer sharing this cluster's namespace has a single place to hook into.
async fn reconcile_maintenance_mode(_cluster_ns: &str) -> Result<()> {
    Ok(())
}

async fn ensure_finalizer_and_labels(ctx: &Context, cluster: &DRCluster) -> Result<()> {
    let name = cluster.name_any();
    let backup_key = VELERO_BACKUP_LABEL.key.to_string();
    let backup_value = VELERO_BACKUP_LABEL.value.to_string();

    let has_finalizer = cluster
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == DR_CLUSTER_FINALIZER));
    let has_backup_label = cluster.labels().get(&backup_key) == Some(&backup_value);

    if has_finalizer && has_backup_label {
        return Ok(());
    }

    let mut labels = cluster.labels().clone();
    labels.insert(backup_key, backup_value);

    let mut finalizers = cluster.meta().finalizers.clone().unwrap_or_default();
    if !has_finalizer {
        finalizers.push(DR_CLUSTER_FINALIZER.to_string());
    }

    ctx.client
        .patch_metadata_cluster::<DRCluster>(&name, &labels, &finalizers)
        .await
        .context(PatchSnafu { cluster: name })?;
    Ok(())
}

async fn persist_status(ctx: &Context, cluster: &DRCluster, status: &DRClusterStatus) -> Result<()> {
    let name = cluster.name_any();
    let value = serde_json::to_value(status).expect("DRClusterStatus always serializes");
    ctx.client
        .patch_status_cluster::<DRCluster>(&name, &value)
        .await
        .context(PatchSnafu { cluster: name })?;
    Ok(())
}

/// §4.2 "Deletion path": undeploys the DR-cluster bundle, best-effort cleans up any fence
/// artifacts if the cluster was ever fenced/unfenced, then removes the finalizer.
async fn reconcile_delete(cluster: &DRCluster, ctx: &Context) -> Result<Action> {
    let name = cluster.name_any();

    ctx.mwu
        .delete(naming::DR_CLUSTER_BUNDLE_NAME, &name)
        .await
        .context(DeliverBundleSnafu {
            bundle: "ramen-dr-cluster",
            cluster: name.clone(),
        })?;

    if let Some(status) = &cluster.status {
        let ever_fenced = matches!(
            status.phase,
            DRClusterPhase::Fencing | DRClusterPhase::Fenced | DRClusterPhase::Unfencing | DRClusterPhase::Unfenced
        );

        if ever_fenced {
            let policies = ctx
                .client
                .list_cluster::<DRPolicy>("DRPolicy")
                .await
                .context(ListSnafu { kind: "DRPolicy" })?;
            let clusters = ctx
                .client
                .list_cluster::<DRCluster>("DRCluster")
                .await
                .context(ListSnafu { kind: "DRCluster" })?;

            if let Some(peer) = peer::select_peer(cluster, &policies, &clusters) {
                let peer_ns = peer.name_any();
                let _ = ctx.mwu.delete(&naming::per_cluster(&name, &peer_ns, "nf"), &peer_ns).await;
            }
            let _ = ctx.mwu.delete(&naming::per_cluster(&name, &name, "nf"), &name).await;
        }
    }

    let finalizers: Vec<String> = cluster
        .meta()
        .finalizers
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter(|f| f != DR_CLUSTER_FINALIZER)
        .collect();

    ctx.client
        .patch_metadata_cluster::<DRCluster>(&name, cluster.labels(), &finalizers)
        .await
        .context(PatchSnafu { cluster: name })?;

    Ok(Action::await_change())
}

/// Drives one reconcile tick of a `DRCluster` through §4.2's ordered steps.
pub async fn reconcile(cluster: Arc<DRCluster>, ctx: Arc<Context>) -> Result<Action> {
    if cluster.meta().deletion_timestamp.is_some() {
        return reconcile_delete(&cluster, &ctx).await;
    }

    let name = cluster.name_any();
    let generation = cluster.meta().generation;

    let mut status = cluster.status.clone().unwrap_or_default();
    let previous_status = status.clone();

    ensure_finalizer_and_labels(&ctx, &cluster).await?;

    if status.conditions.is_empty() {
        set_condition(
            &mut status.conditions,
            CONDITION_VALIDATED,
            ConditionStatus::Unknown,
            "Initializing",
            "",
            generation,
            now(),
        );
        apply_stage(&mut status, fence::Stage::Initial, generation);
    }

    ctx.mwu
        .create_or_update(naming::DR_CLUSTER_BUNDLE_NAME, &name, bundle::dr_cluster(vec![], &name))
        .await
        .context(DeliverBundleSnafu {
            bundle: "ramen-dr-cluster",
            cluster: name.clone(),
        })?;

    let cidr_result = cidr::validate_all(&cluster.spec.cidrs);
    let mut requeue = false;

    match &cidr_result {
        Ok(()) => set_condition(
            &mut status.conditions,
            CONDITION_VALIDATED,
            ConditionStatus::True,
            "Validated",
            "",
            generation,
            now(),
        ),
        Err(err) => {
            set_condition(
                &mut status.conditions,
                CONDITION_VALIDATED,
                ConditionStatus::False,
                "ValidationFailed",
                err.to_string(),
                generation,
                now(),
            );
            requeue = true;
        }
    }

    if cidr_result.is_ok() {
        let policies = ctx
            .client
            .list_cluster::<DRPolicy>("DRPolicy")
            .await
            .context(ListSnafu { kind: "DRPolicy" })?;
        let clusters = ctx
            .client
            .list_cluster::<DRCluster>("DRCluster")
            .await
            .context(ListSnafu { kind: "DRCluster" })?;

        let outcome = process_fence_intent(&ctx, &cluster, &mut status, &clusters, &policies, generation).await?;
        requeue |= outcome.requeue;

        if cluster.spec.s3_profile_name != NO_S3_STORE_AVAILABLE {
            let config = OperatorConfig::load(&ctx.client, &ctx.operator_namespace)
                .await
                .context(LoadConfigSnafu)?;
            let profile = config
                .resolve_s3_profile(&ctx.client, &ctx.operator_namespace, &cluster.spec.s3_profile_name)
                .await
                .context(LoadConfigSnafu)?;

            if let Some(profile) = profile {
                let prefix = format!("{name}/");
                if let Err(err) = objectstore::validate_reachable(&cluster.spec.s3_profile_name, &profile, &prefix).await {
                    set_condition(
                        &mut status.conditions,
                        CONDITION_VALIDATED,
                        ConditionStatus::False,
                        "s3ConnectionFailed",
                        err.to_string(),
                        generation,
                        now(),
                    );
                    requeue = true;
                }
            }
        }

        let dr_bundle_applied = ctx
            .mwu
            .find(naming::DR_CLUSTER_BUNDLE_NAME, &name)
            .await
            .context(DeliverBundleSnafu {
                bundle: "ramen-dr-cluster",
                cluster: name.clone(),
            })?
            .is_some_and(|mw| ManifestWorkUtility::is_applied(&mw));

        if dr_bundle_applied {
            let managed_cluster = ctx
                .client
                .get_cluster::<ManagedCluster>(&name)
                .await
                .context(ManagedClusterMissingSnafu { cluster: name.clone() })?;

            match config_synth::synthesize(&cluster, &managed_cluster, &policies) {
                Ok(config) => {
                    ctx.mwu
                        .create_or_update(&naming::singleton("drcconfig"), &name, bundle::dr_cluster_config(&config, &name))
                        .await
                        .context(DeliverBundleSnafu {
                            bundle: "drcconfig",
                            cluster: name.clone(),
                        })?;
                }
                Err(err) => {
                    set_condition(
                        &mut status.conditions,
                        CONDITION_VALIDATED,
                        ConditionStatus::False,
                        "DRClusterConfigInProgress",
                        err.to_string(),
                        generation,
                        now(),
                    );
                    requeue = true;
                }
            }
        } else {
            requeue = true;
        }

        reconcile_maintenance_mode(&name).await?;
    }

    let status_changed = status != previous_status;
    if status_changed {
        persist_status(&ctx, &cluster, &status).await?;
    }

    Ok(if requeue {
        Action::requeue(Duration::from_secs(30))
    } else {
        Action::requeue(Duration::from_secs(10 * 60))
    })
}

fn error_policy(cluster: Arc<DRCluster>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(
        cluster = %cluster.name_any(),
        error = error as &dyn std::error::Error,
        "DRCluster reconcile failed, requeueing with backoff"
    );
    Action::requeue(Duration::from_secs(60))
}

/// Builds an empty `DRPlacementControl` standing in for "never seen before" in the DRPC
/// old/new diff cache: no action, no failover target, so the first observed event for a given
/// DRPC is only ever treated as a transition if it already demands one (§4.5).
fn empty_drpc(name: &str) -> DRPlacementControl {
    DRPlacementControl::new(name, crate::crd::DRPlacementControlSpec { action: None, failover_cluster: None })
}

/// Runs the `DRCluster` controller until the process receives a shutdown signal.
pub async fn run(client: Client, operator_namespace: String) {
    let dr_clusters = client.get_all_api::<DRCluster>();
    let manifest_works = client.get_all_api::<ManifestWork>();
    let drpcs = client.get_all_api::<DRPlacementControl>();
    let secrets = client.get_api::<k8s_openapi::api::core::v1::Secret>(&operator_namespace);
    let config_maps = client.get_api::<k8s_openapi::api::core::v1::ConfigMap>(&operator_namespace);

    let context = Arc::new(Context {
        mwu: ManifestWorkUtility::new(client.clone()),
        mcv: ManagedClusterViewGetter::new(client.clone()),
        client,
        operator_namespace: operator_namespace.clone(),
    });

    let report_client = context.client.clone();
    let controller_name = format_full_controller_name("ramendr.io", "drcluster");

    // The controller only ever sees the latest object on a watch event; DRPC filtering needs the
    // previous state too (§4.5), so a small in-process cache stands in for the reflector-backed
    // old/new diff, keyed by namespaced name.
    let drpc_cache: Arc<std::sync::Mutex<std::collections::HashMap<String, DRPlacementControl>>> =
        Arc::new(std::sync::Mutex::new(std::collections::HashMap::new()));

    // Secret/ConfigMap changes are cluster-wide hub configuration, not per-DRCluster state, so a
    // passing event requeues every tracked `DRCluster` rather than mapping to a single key.
    let secret_trigger = {
        let client = context.client.clone();
        let operator_namespace = operator_namespace.clone();
        watcher::watcher(secrets, watcher::Config::default())
            .touched_objects()
            .filter_map(move |result| {
                let client = client.clone();
                let operator_namespace = operator_namespace.clone();
                async move {
                    let secret = result.ok()?;
                    let config = OperatorConfig::load(&client, &operator_namespace).await.ok()?;
                    predicates::secret_event_passes(&secret, &operator_namespace, &config).then_some(())
                }
            })
    };
    let config_map_trigger = {
        let operator_namespace = operator_namespace.clone();
        watcher::watcher(config_maps, watcher::Config::default())
            .touched_objects()
            .filter_map(move |result| {
                let operator_namespace = operator_namespace.clone();
                async move {
                    let config_map = result.ok()?;
                    predicates::config_map_event_passes(&config_map, &operator_namespace).then_some(())
                }
            })
    };

    Controller::new(dr_clusters, watcher::Config::default())
        .shutdown_on_signal()
        // ManifestWorks the controller itself created are annotated with the owning cluster's
        // name (§4.5).
        .watches(manifest_works, watcher::Config::default(), |mw: ManifestWork| {
            predicates::manifest_work_event_passes(&mw)
                .then(|| predicates::manifest_work_affected_cluster(&mw))
                .flatten()
                .map(|name| ObjectRef::new(&name))
        })
        .watches(drpcs, watcher::Config::default(), move |new: DRPlacementControl| {
            let key = format!("{}/{}", new.namespace().unwrap_or_default(), new.name_any());
            let old = drpc_cache
                .lock()
                .expect("drpc cache mutex is never poisoned")
                .insert(key, new.clone())
                .unwrap_or_else(|| empty_drpc(&new.name_any()));

            predicates::drpc_event_passes(&old, &new)
                .then(|| new.spec.failover_cluster.clone())
                .flatten()
                .map(|name| ObjectRef::new(&name))
        })
        .reconcile_all_on(futures::stream::select(secret_trigger, config_map_trigger))
        .run(reconcile, error_policy, context)
        .for_each(|result| {
            let client = report_client.clone();
            let controller_name = controller_name.clone();
            async move {
                crate::logging::controller::report_controller_reconciled(&client, &controller_name, &result);
            }
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{DRClusterConfig, NetworkFence};

    #[test]
    fn view_scope_recovers_group_version_and_plural_from_the_type() {
        let scope = view_scope::<DRClusterConfig>("east");
        assert_eq!(scope.group.as_deref(), Some("ramendr.openshift.io"));
        assert_eq!(scope.version, "v1alpha1");
        assert_eq!(scope.resource, "drclusterconfigs");
        assert_eq!(scope.name, "east");
    }

    #[test]
    fn view_scope_works_for_a_different_group_too() {
        let scope = view_scope::<NetworkFence>("network-fence-east");
        assert_eq!(scope.group.as_deref(), Some("csiaddons.openshift.io"));
        assert_eq!(scope.resource, "networkfences");
    }
}
