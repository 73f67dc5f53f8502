//! Validates that a `DRCluster.spec.CIDRs` entry parses as an IP network (§4.2 step 4).

use ipnet::IpNet;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu, PartialEq)]
#[snafu(display("failed to parse {input:?} as a CIDR"))]
pub struct InvalidCidr {
    source: ipnet::AddrParseError,
    input: String,
}

/// Parses `input` as an IP network, returning [`InvalidCidr`] (surfaced on the `Validated`
/// condition as `ValidationFailed`, with the offending input in the message) on failure.
pub fn parse(input: &str) -> Result<IpNet, InvalidCidr> {
    input.parse().context(InvalidCidrSnafu { input })
}

/// Validates every entry of `cidrs`, short-circuiting on the first invalid one - matching the
/// reconciler's step-4 validation, which surfaces a single `ValidationFailed` reason.
pub fn validate_all<'a>(cidrs: impl IntoIterator<Item = &'a String>) -> Result<(), InvalidCidr> {
    for cidr in cidrs {
        parse(cidr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_cidr() {
        assert!(parse("10.0.0.0/16").is_ok());
    }

    #[test]
    fn rejects_invalid_prefix_length() {
        let err = parse("10.0.0.0/99").unwrap_err();
        assert_eq!(err.input, "10.0.0.0/99");
    }

    #[test]
    fn validate_all_reports_the_first_bad_entry() {
        let cidrs = vec!["10.0.0.0/16".to_string(), "10.0.0.0/99".to_string()];
        let err = validate_all(&cidrs).unwrap_err();
        assert_eq!(err.input, "10.0.0.0/99");
    }
}
