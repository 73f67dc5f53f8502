use std::{fmt::Display, str::FromStr, time::Duration as StdDuration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(display("failed to parse {input:?} as a duration"))]
pub struct ParseDurationError {
    source: humantime::DurationError,
    input: String,
}

/// A [`std::time::Duration`] that (de)serializes using a human-readable format such as `10s`,
/// `5m` or `2h30m`, rather than the nanosecond-resolution struct `serde` derives by default.
///
/// Used for `DRPolicy.spec.schedulingInterval` and wherever else the hub exposes a duration to
/// the Kubernetes API.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Duration(StdDuration);

impl Duration {
    pub fn as_std(&self) -> StdDuration {
        self.0
    }
}

impl From<StdDuration> for Duration {
    fn from(value: StdDuration) -> Self {
        Self(value)
    }
}

impl From<Duration> for StdDuration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl FromStr for Duration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        humantime::parse_duration(s)
            .context(ParseDurationSnafu { input: s })
            .map(Self)
    }
}

impl TryFrom<String> for Duration {
    type Error = ParseDurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Duration> for String {
    fn from(value: Duration) -> Self {
        value.to_string()
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

impl JsonSchema for Duration {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("Duration")
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        String::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let duration: Duration = "1h".parse().unwrap();
        assert_eq!(duration.as_std(), StdDuration::from_secs(3600));
        assert_eq!(duration.to_string(), "1h");
    }

    #[test]
    fn rejects_garbage() {
        assert!("not a duration".parse::<Duration>().is_err());
    }

    #[test]
    fn serializes_as_a_human_readable_string() {
        let duration: Duration = "5m".parse().unwrap();
        let json = serde_json::to_string(&duration).unwrap();
        assert_eq!(json, "\"5m\"");
        assert_eq!(serde_json::from_str::<Duration>(&json).unwrap(), duration);
    }
}
