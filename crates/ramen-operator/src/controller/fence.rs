//! The `(Fenced, Clean)` condition table and the terminal-check for a fence/unfence operation in
//! flight (§4.2 "Condition semantics", §8 testable property 3).
//!
//! Kept separate from the I/O-driving reconcile loop so the table itself — the part of the state
//! machine most worth getting bit-exact — is directly unit-testable against §4.2 verbatim.
use crate::{
    crd::{dr_cluster::DRClusterPhase, network_fence::RESULT_SUCCEEDED, FenceState, NetworkFence},
    status::condition::ConditionStatus,
};

/// One row of the condition table in §4.2. `None` means "leave the condition as-is" (the table's
/// `—` entry, used only for the `Fenced` condition when no fence was ever requested).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionRow {
    pub fenced: Option<ConditionStatus>,
    pub clean: ConditionStatus,
    pub reason: &'static str,
}

/// The stage of the fence sub-state machine a reconcile tick has reached, each mapping to
/// exactly the `(Fenced, Clean)` pair in §4.2's table and to a [`DRClusterPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initial,
    ValidatedNoFence,
    Fencing,
    Fenced,
    Unfencing,
    Unfenced,
    Cleaning,
    Clean,
    FenceError,
    UnfenceError,
}

impl Stage {
    /// The `(Fenced, Clean)` condition pair and reason asserted for this stage, bit-exact with
    /// the table in §4.2.
    pub fn condition_row(self) -> ConditionRow {
        use ConditionStatus::{False, True, Unknown};

        match self {
            Self::Initial => ConditionRow {
                fenced: Some(Unknown),
                clean: Unknown,
                reason: "Initializing",
            },
            Self::ValidatedNoFence => ConditionRow {
                fenced: None,
                clean: True,
                reason: "Validated",
            },
            Self::Fencing => ConditionRow {
                fenced: Some(False),
                clean: True,
                reason: "Fencing",
            },
            Self::Fenced => ConditionRow {
                fenced: Some(True),
                clean: False,
                reason: "Fenced",
            },
            Self::Unfencing => ConditionRow {
                fenced: Some(True),
                clean: False,
                reason: "Unfencing",
            },
            Self::Unfenced => ConditionRow {
                fenced: Some(False),
                clean: False,
                reason: "Unfenced",
            },
            Self::Cleaning => ConditionRow {
                fenced: Some(False),
                clean: False,
                reason: "Cleaning",
            },
            Self::Clean => ConditionRow {
                fenced: Some(False),
                clean: True,
                reason: "Clean",
            },
            Self::FenceError => ConditionRow {
                fenced: Some(False),
                clean: True,
                reason: "FenceError",
            },
            Self::UnfenceError => ConditionRow {
                fenced: Some(True),
                clean: False,
                reason: "UnfenceError",
            },
        }
    }

    /// The [`DRClusterPhase`] this stage is observed under. `Clean`/`FenceError` both revert to
    /// `Available` (§4.2 "Phases ... Unfenced reverts to Available after Clean").
    pub fn phase(self) -> DRClusterPhase {
        match self {
            Self::Initial => DRClusterPhase::Starting,
            Self::ValidatedNoFence | Self::Clean | Self::FenceError => DRClusterPhase::Available,
            Self::Fencing => DRClusterPhase::Fencing,
            Self::Fenced | Self::UnfenceError => DRClusterPhase::Fenced,
            Self::Unfencing => DRClusterPhase::Unfencing,
            Self::Unfenced | Self::Cleaning => DRClusterPhase::Unfenced,
        }
    }
}

/// Whether the observed `NetworkFence` snapshot confirms that `intent` has been carried out:
/// `spec.fenceState` matches the desired intent and `status.result == "Succeeded"` (§4.2 "Fence
/// sub-state machine").
pub fn fence_satisfied(nf: &NetworkFence, intent: FenceState) -> bool {
    nf.spec.fence_state == intent && nf.status.as_ref().and_then(|s| s.result.as_deref()) == Some(RESULT_SUCCEEDED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{NetworkFenceSpec, NetworkFenceStatus};

    #[test]
    fn condition_table_matches_the_spec_verbatim() {
        use ConditionStatus::{False, True, Unknown};

        let cases = [
            (Stage::Initial, Some(Unknown), Unknown),
            (Stage::ValidatedNoFence, None, True),
            (Stage::Fencing, Some(False), True),
            (Stage::Fenced, Some(True), False),
            (Stage::Unfencing, Some(True), False),
            (Stage::Unfenced, Some(False), False),
            (Stage::Cleaning, Some(False), False),
            (Stage::Clean, Some(False), True),
            (Stage::FenceError, Some(False), True),
            (Stage::UnfenceError, Some(True), False),
        ];

        for (stage, fenced, clean) in cases {
            let row = stage.condition_row();
            assert_eq!(row.fenced, fenced, "{stage:?} fenced mismatch");
            assert_eq!(row.clean, clean, "{stage:?} clean mismatch");
        }
    }

    fn nf(fence_state: FenceState, result: Option<&str>) -> NetworkFence {
        let mut nf = NetworkFence::new(
            "network-fence-east",
            NetworkFenceSpec {
                cidrs: vec!["10.0.0.0/16".into()],
                fence_state,
                network_fence_class_name: None,
                driver: None,
                secret: None,
                cluster_id: None,
            },
        );
        nf.status = Some(NetworkFenceStatus {
            result: result.map(str::to_string),
        });
        nf
    }

    #[test]
    fn fence_satisfied_requires_matching_state_and_succeeded_result() {
        assert!(fence_satisfied(&nf(FenceState::Fenced, Some("Succeeded")), FenceState::Fenced));
        assert!(!fence_satisfied(&nf(FenceState::Fenced, Some("Failed")), FenceState::Fenced));
        assert!(!fence_satisfied(&nf(FenceState::Unfenced, Some("Succeeded")), FenceState::Fenced));
        assert!(!fence_satisfied(&nf(FenceState::Fenced, None), FenceState::Fenced));
    }

    #[test]
    fn terminal_phases_revert_to_available_or_stay_fenced() {
        assert_eq!(Stage::Clean.phase(), DRClusterPhase::Available);
        assert_eq!(Stage::FenceError.phase(), DRClusterPhase::Available);
        assert_eq!(Stage::UnfenceError.phase(), DRClusterPhase::Fenced);
    }
}
