//! A small helper layer around `k8s_openapi`'s generic [`Condition`] type.
//!
//! Every status-bearing resource in this crate (`ManifestWork`'s `Applied`/`Available`/`Degraded`
//! trio, `DRCluster`'s `Validated`/`Fenced`/`Clean` trio) reuses the same upstream [`Condition`]
//! struct rather than a bespoke one per resource, so a single upsert routine covers all of them.
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
use std::fmt::Display;

/// The three values a Kubernetes condition's `status` field may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Returns the condition of type `type_`, if present.
pub fn get_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Returns whether the condition of type `type_` is present and has `status`.
pub fn is_condition(conditions: &[Condition], type_: &str, status: ConditionStatus) -> bool {
    get_condition(conditions, type_).is_some_and(|c| c.status == status.as_str())
}

/// Inserts or updates the condition of type `type_` in `conditions`, setting `last_transition_time`
/// to `now` only if the condition's `status` actually changed (or the condition is new) — matching
/// the upstream Kubernetes convention that `lastTransitionTime` tracks status flips, not every
/// observation.
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    type_: &str,
    status: ConditionStatus,
    reason: &str,
    message: impl Into<String>,
    observed_generation: Option<i64>,
    now: Time,
) {
    let status = status.as_str().to_string();
    let message = message.into();
    let reason = reason.to_string();

    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == type_) {
        if existing.status != status {
            existing.last_transition_time = now;
        }
        existing.status = status;
        existing.reason = reason;
        existing.message = message;
        existing.observed_generation = observed_generation;
        return;
    }

    conditions.push(Condition {
        type_: type_.to_string(),
        status,
        reason,
        message,
        observed_generation,
        last_transition_time: now,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Time {
        Time(chrono::DateTime::from_timestamp(0, 0).unwrap())
    }

    #[test]
    fn insert_new_condition() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            "Fenced",
            ConditionStatus::Unknown,
            "Initializing",
            "",
            None,
            now(),
        );

        assert!(is_condition(&conditions, "Fenced", ConditionStatus::Unknown));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn transition_time_only_bumps_on_status_change() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            "Fenced",
            ConditionStatus::False,
            "Validated",
            "",
            None,
            now(),
        );
        let first_transition = get_condition(&conditions, "Fenced").unwrap().last_transition_time.clone();

        let later = Time(chrono::DateTime::from_timestamp(100, 0).unwrap());
        set_condition(
            &mut conditions,
            "Fenced",
            ConditionStatus::False,
            "Validated",
            "still false",
            None,
            later.clone(),
        );
        let second_transition = &get_condition(&conditions, "Fenced").unwrap().last_transition_time;
        assert_eq!(&first_transition, second_transition);

        set_condition(
            &mut conditions,
            "Fenced",
            ConditionStatus::True,
            "Fencing",
            "",
            None,
            later.clone(),
        );
        assert_eq!(
            get_condition(&conditions, "Fenced").unwrap().last_transition_time,
            later
        );
    }
}
