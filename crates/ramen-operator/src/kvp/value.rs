use std::{
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};

/// Trait implemented by types which can appear as the value half of a [`KeyValuePair`][super::KeyValuePair].
///
/// Implementors validate and normalize arbitrary user input (coming from CRD specs or CLI flags)
/// into a type that is guaranteed to be a well-formed Kubernetes label or annotation value. See
/// [`LabelValue`](crate::kvp::label::LabelValue) and [`AnnotationValue`](crate::kvp::annotation::AnnotationValue)
/// for the two built-in implementations.
pub trait Value:
    Debug + Display + Deref<Target = str> + FromStr<Err = <Self as Value>::Error>
{
    /// The error produced when a raw string fails to validate as this value type.
    type Error: std::error::Error;
}
