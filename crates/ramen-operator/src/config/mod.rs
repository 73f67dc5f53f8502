//! Hub operator configuration: read from the single, well-known `ConfigMap` in the operator's
//! own namespace, re-read at the start of every reconcile rather than memoised, so an operator
//! edit to the config-map propagates on the next tick without a restart (§9 "Global state").
use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use serde::Deserialize;
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{client::Client, objectstore::S3Profile};

/// Name of the `ConfigMap` the hub operator's own `Deployment` mounts its configuration from.
pub const CONFIG_MAP_NAME: &str = "ramen-hub-operator-config";

/// Key inside [`CONFIG_MAP_NAME`]'s `data` carrying the YAML-encoded configuration body.
const CONFIG_KEY: &str = "ramen_manager_config.yaml";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read ConfigMap {CONFIG_MAP_NAME:?} in {namespace:?}"))]
    Get {
        source: crate::client::Error,
        namespace: String,
    },

    #[snafu(display("ConfigMap {CONFIG_MAP_NAME:?} in {namespace:?} has no {CONFIG_KEY:?} key"))]
    MissingConfigKey { namespace: String },

    #[snafu(display("failed to parse {CONFIG_KEY:?} in ConfigMap {CONFIG_MAP_NAME:?}"))]
    Parse { source: serde_yaml::Error },

    #[snafu(display("failed to read Secret {secret_name:?} in {namespace:?} for S3 profile {profile_name:?}"))]
    GetSecret {
        source: crate::client::Error,
        secret_name: String,
        namespace: String,
        profile_name: String,
    },

    #[snafu(display("Secret {secret_name:?} is missing key {key:?} required by S3 profile {profile_name:?}"))]
    MissingSecretKey {
        secret_name: String,
        key: String,
        profile_name: String,
    },
}

/// The hub operator's own configuration, as parsed from [`CONFIG_MAP_NAME`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    #[serde(default)]
    pub s3_store_profiles: BTreeMap<String, S3ProfileConfig>,
}

/// One named entry of `s3StoreProfiles`, pointing at the `Secret` holding its credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ProfileConfig {
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    pub s3_secret_ref: SecretRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
}

/// The well-known `Secret` data keys holding S3 credentials.
const ACCESS_KEY_ID_FIELD: &str = "AWS_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY_FIELD: &str = "AWS_SECRET_ACCESS_KEY";

impl OperatorConfig {
    /// Reads and parses [`CONFIG_MAP_NAME`] from `operator_namespace`.
    pub async fn load(client: &Client, operator_namespace: &str) -> Result<Self> {
        let config_map: ConfigMap = client
            .get(CONFIG_MAP_NAME, Some(operator_namespace))
            .await
            .context(GetSnafu {
                namespace: operator_namespace.to_string(),
            })?;

        let raw = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(CONFIG_KEY))
            .context(MissingConfigKeySnafu {
                namespace: operator_namespace.to_string(),
            })?;

        serde_yaml::from_str(raw).context(ParseSnafu)
    }

    /// Resolves the named S3 profile's credentials `Secret` and builds an [`S3Profile`] ready to
    /// be handed to [`crate::objectstore::validate_reachable`]. Returns `Ok(None)` if no profile
    /// by that name is configured.
    pub async fn resolve_s3_profile(
        &self,
        client: &Client,
        operator_namespace: &str,
        profile_name: &str,
    ) -> Result<Option<S3Profile>> {
        let Some(profile) = self.s3_store_profiles.get(profile_name) else {
            return Ok(None);
        };

        let secret: k8s_openapi::api::core::v1::Secret = client
            .get(&profile.s3_secret_ref.name, Some(operator_namespace))
            .await
            .context(GetSecretSnafu {
                secret_name: profile.s3_secret_ref.name.clone(),
                namespace: operator_namespace.to_string(),
                profile_name: profile_name.to_string(),
            })?;

        let field = |key: &str| -> Result<String> {
            secret
                .data
                .as_ref()
                .and_then(|data| data.get(key))
                .map(|byte_string| String::from_utf8_lossy(&byte_string.0).into_owned())
                .context(MissingSecretKeySnafu {
                    secret_name: profile.s3_secret_ref.name.clone(),
                    key: key.to_string(),
                    profile_name: profile_name.to_string(),
                })
        };

        Ok(Some(S3Profile {
            bucket: profile.bucket.clone(),
            region: profile.region.clone(),
            endpoint: profile.endpoint.clone(),
            access_key_id: field(ACCESS_KEY_ID_FIELD)?,
            secret_access_key: field(SECRET_ACCESS_KEY_FIELD)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3_store_profiles_from_yaml() {
        let yaml = indoc::indoc! {r#"
            s3StoreProfiles:
              rook-ceph:
                bucket: odr-bucket
                region: us-east-1
                s3SecretRef:
                  name: rook-ceph-s3-secret
        "#};

        let config: OperatorConfig = serde_yaml::from_str(yaml).unwrap();
        let profile = config.s3_store_profiles.get("rook-ceph").unwrap();
        assert_eq!(profile.bucket, "odr-bucket");
        assert_eq!(profile.s3_secret_ref.name, "rook-ceph-s3-secret");
    }

    #[test]
    fn missing_profile_resolves_to_none() {
        let config = OperatorConfig::default();
        assert!(config.s3_store_profiles.get("nonexistent").is_none());
    }
}
