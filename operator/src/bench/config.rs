use std::time::Duration;

use crate::bench::job::JobImageConfig;

/// Settings of the ApacheBench controller, fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Only watch resources in this namespace, all namespaces when None.
    pub namespace: Option<String>,
    /// Images used by jobs that do not set their own.
    pub images: JobImageConfig,
    /// Delay before a failed reconcile is retried.
    pub error_requeue: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            images: JobImageConfig::default(),
            error_requeue: Duration::from_secs(5),
        }
    }
}
