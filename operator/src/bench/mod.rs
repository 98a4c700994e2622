//! ApacheBench is a k8s custom resource that runs the `ab` benchmarking tool against an HTTP
//! endpoint as a single Job and reports the results back on its status.

/// Command builder translating a spec into the `ab` argument vector.
#[cfg(feature = "controller")]
pub mod command;
/// Controller configuration.
#[cfg(feature = "controller")]
pub mod config;
/// Reconciler and watch registration for the ApacheBench CRD.
#[cfg(feature = "controller")]
pub mod controller;
/// Credential resolution from Secrets.
#[cfg(feature = "controller")]
pub mod credentials;
/// Errors produced while reconciling.
#[cfg(feature = "controller")]
pub mod error;
/// Job synthesis.
#[cfg(feature = "controller")]
pub mod job;
/// Spec module for the ApacheBench CRD.
pub mod spec;
/// Status phase transitions and error aggregation.
pub mod status;
#[cfg(all(test, feature = "controller"))]
pub(crate) mod stub;

#[cfg(feature = "controller")]
pub use controller::run;
pub use spec::{ApacheBench, ApacheBenchSpec, ApacheBenchStatus, Phase};
