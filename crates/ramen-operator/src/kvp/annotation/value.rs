use std::{
    convert::Infallible,
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};

use crate::kvp::Value;

/// A validated Kubernetes annotation value.
///
/// Unlike [`LabelValue`](crate::kvp::label::LabelValue), an annotation value has no length or
/// character-set restriction beyond being valid UTF-8, which [`str`] already guarantees. Parsing
/// an [`AnnotationValue`] therefore never fails.
///
/// See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/> for more
/// information on Kubernetes annotations.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnnotationValue(String);

impl Debug for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Value for AnnotationValue {
    type Error = Infallible;
}

impl FromStr for AnnotationValue {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self(input.to_string()))
    }
}

impl Deref for AnnotationValue {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn any_utf8_is_valid() {
        let value = AnnotationValue::from_str("anything, really 🎉").unwrap();
        assert_eq!(value.to_string(), "anything, really 🎉");
    }
}
