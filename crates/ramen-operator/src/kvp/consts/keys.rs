use const_format::concatcp;

/// The well-known Kubernetes app key prefix.
const K8S_APP_KEY_PREFIX: &str = "app.kubernetes.io/";

/// The well-known Kubernetes app name key `app.kubernetes.io/name`. It is used
/// to label the application with a name, e.g. `mysql`.
pub const K8S_APP_NAME_KEY: &str = concatcp!(K8S_APP_KEY_PREFIX, "name");

/// The well-known Kubernetes app instance key `app.kubernetes.io/instance`. It
/// is used to identify the instance of an application, e.g. `mysql-abcxyz`.
pub const K8S_APP_INSTANCE_KEY: &str = concatcp!(K8S_APP_KEY_PREFIX, "instance");

/// The well-known Kubernetes app version key `app.kubernetes.io/version`. It is
/// used to indicate the current version of the application. The value can
/// represent a semantic version or a revision, e.g. `5.7.21`.
pub const K8S_APP_VERSION_KEY: &str = concatcp!(K8S_APP_KEY_PREFIX, "version");

/// The well-known Kubernetes app component key `app.kubernetes.io/component`.
/// It is used to specify the compoent within the architecture, e.g. `database`.
pub const K8S_APP_COMPONENT_KEY: &str = concatcp!(K8S_APP_KEY_PREFIX, "component");

/// The well-known Kubernetes app managed-by key `app.kubernetes.io/managed-by`.
/// It is used to indicate what tool is being used to manage the operation of
/// an application, e.g. `helm`.
pub const K8S_APP_MANAGED_BY_KEY: &str = concatcp!(K8S_APP_KEY_PREFIX, "managed-by");

/// The Open Cluster Management label/annotation key prefix.
const OCM_KEY_PREFIX: &str = "open-cluster-management.io/";

/// Marks a `ClusterRole`/`ClusterRoleBinding` bundled into a [`ManifestWork`](crate::crd::manifest_work::ManifestWork)
/// for aggregation into the managed cluster's `open-cluster-management:work-execution` role.
pub const OCM_AGGREGATE_TO_WORK_KEY: &str = concatcp!(OCM_KEY_PREFIX, "aggregate-to-work");
