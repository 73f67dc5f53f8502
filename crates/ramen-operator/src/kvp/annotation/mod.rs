//! This module provides various types and functions to construct valid Kubernetes
//! annotations. Annotations are key/value pairs, where the key must meet certain
//! requirementens regarding length and character set. The value can contain
//! **any** valid UTF-8 data.
//!
//! Additionally, the [`Annotation`] struct provides various helper functions to
//! construct commonly used annotations propagated from a `DRCluster` onto the
//! objects the hub controllers synthesize for it, like the storage driver or
//! the cluster fencing class.
//!
//! See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
//! for more information on Kubernetes annotations.
use std::convert::Infallible;

use crate::kvp::{KeyValuePair, KeyValuePairError, KeyValuePairs};

mod value;

pub use value::*;

/// A type alias for errors returned when construction or manipulation of a set
/// of annotations fails.
pub type AnnotationError = KeyValuePairError<Infallible>;

/// A specialized implementation of a key/value pair representing Kubernetes
/// annotations.
///
/// The validation of the annotation value can **never** fail, as [`str`] is
/// guaranteed  to only contain valid UTF-8 data - which is the only
/// requirement for a valid Kubernetes annotation value.
///
/// See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
/// for more information on Kubernetes annotations.
pub type Annotation = KeyValuePair<AnnotationValue>;

/// A validated set/list of Kubernetes annotations.
///
/// It provides selected associated functions to manipulate the set of
/// annotations, like inserting or extending.
///
/// ## Examples
///
/// ### Converting a BTreeMap into a list of labels
///
/// ```
/// # use std::collections::BTreeMap;
/// # use ramen_operator::iter::TryFromIterator;
/// # use ramen_operator::kvp::Annotations;
/// let map = BTreeMap::from([
///     ("ramendr.io/managed-by", "ramen-hub"),
///     ("ramendr.io/vendor", "Ramen"),
/// ]);
///
/// let labels = Annotations::try_from_iter(map).unwrap();
/// ```
///
/// ### Creating a list of labels from an array
///
/// ```
/// # use ramen_operator::iter::TryFromIterator;
/// # use ramen_operator::kvp::Annotations;
/// let labels = Annotations::try_from_iter([
///     ("ramendr.io/managed-by", "ramen-hub"),
///     ("ramendr.io/vendor", "Ramen"),
/// ]).unwrap();
/// ```
pub type Annotations = KeyValuePairs<AnnotationValue>;

/// Well-known annotations used by other tools or standard conventions.
pub mod well_known {
    use crate::kvp::{consts::OCM_AGGREGATE_TO_WORK_KEY, Annotation, AnnotationError};

    /// Constructs the `open-cluster-management.io/aggregate-to-work` annotation used to mark a
    /// `ClusterRole` bundled into a `ManifestWork` for aggregation on the managed cluster.
    pub fn aggregate_to_work() -> Result<Annotation, AnnotationError> {
        Annotation::try_from((OCM_AGGREGATE_TO_WORK_KEY, "true"))
    }
}
