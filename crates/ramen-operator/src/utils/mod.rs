mod option;

pub use self::option::OptionExt;

/// Returns the fully qualified controller name, which should be used when a single controller needs to be referred to uniquely.
///
/// `operator` should be a FQDN-style operator name (for example: `ramendr.io`).
/// `controller` should typically be the lower-case version of the primary resource that the
/// controller manages (for example: `drcluster`).
pub(crate) fn format_full_controller_name(operator: &str, controller: &str) -> String {
    format!("{operator}_{controller}")
}
