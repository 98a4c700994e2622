//! Utils is shared functions and constants for the controller
#[cfg(test)]
pub mod fake;

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::{
    api::{
        batch::v1::Job,
        core::v1::{Pod, Secret},
    },
    ByteString,
};
use kube::{
    api::{ListParams, LogParams, Patch, PatchParams, PostParams},
    client::Client,
    Api, ResourceExt,
};

use crate::bench::{config::ControllerConfig, ApacheBench, ApacheBenchStatus};

/// Operator Context
pub struct Context<S, C> {
    /// Object store holding the ApacheBench resources and their Jobs
    pub store: S,
    /// Credential store
    pub credentials: C,
    /// Controller configuration
    pub config: ControllerConfig,
}

impl Context<KubeStore, KubeStore> {
    /// Create new context
    pub fn new(k_client: Client, config: ControllerConfig) -> Self {
        let store = KubeStore::new(k_client);
        Context {
            store: store.clone(),
            credentials: store,
            config,
        }
    }
}

/// Define the cluster state we read and write while reconciling.
///
/// Every kind the reconciler touches has its own method, there is no generic object access.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an ApacheBench, None when it does not exist.
    async fn get_bench(&self, ns: &str, name: &str) -> Result<Option<ApacheBench>, kube::Error>;
    /// Fetch a Job, None when it does not exist.
    async fn get_job(&self, ns: &str, name: &str) -> Result<Option<Job>, kube::Error>;
    /// Create a Job.
    async fn create_job(&self, ns: &str, job: &Job) -> Result<Job, kube::Error>;
    /// Write the status subresource of an ApacheBench.
    async fn update_status(
        &self,
        ns: &str,
        name: &str,
        status: &ApacheBenchStatus,
    ) -> Result<(), kube::Error>;
    /// List the pods matching a label selector, in the order reported by the store.
    async fn list_pods(&self, ns: &str, label_selector: &str) -> Result<Vec<Pod>, kube::Error>;
    /// Read the complete log of a pod.
    async fn pod_logs(&self, ns: &str, name: &str) -> Result<String, kube::Error>;
}

/// Define the lookups we consume from the credential store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Data of the named Secret, None when the Secret does not exist.
    async fn secret_data(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, ByteString>>, kube::Error>;
}

/// Stores backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    k_client: Client,
}

impl KubeStore {
    /// Create a store using the given client.
    pub fn new(k_client: Client) -> Self {
        Self { k_client }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_bench(&self, ns: &str, name: &str) -> Result<Option<ApacheBench>, kube::Error> {
        let benches: Api<ApacheBench> = Api::namespaced(self.k_client.clone(), ns);
        benches.get_opt(name).await
    }

    async fn get_job(&self, ns: &str, name: &str) -> Result<Option<Job>, kube::Error> {
        let jobs: Api<Job> = Api::namespaced(self.k_client.clone(), ns);
        jobs.get_opt(name).await
    }

    async fn create_job(&self, ns: &str, job: &Job) -> Result<Job, kube::Error> {
        let jobs: Api<Job> = Api::namespaced(self.k_client.clone(), ns);
        jobs.create(&PostParams::default(), job).await
    }

    async fn update_status(
        &self,
        ns: &str,
        name: &str,
        status: &ApacheBenchStatus,
    ) -> Result<(), kube::Error> {
        let benches: Api<ApacheBench> = Api::namespaced(self.k_client.clone(), ns);
        benches
            .patch_status(
                name,
                &PatchParams::default(),
                &Patch::Merge(serde_json::json!({ "status": status })),
            )
            .await?;
        Ok(())
    }

    async fn list_pods(&self, ns: &str, label_selector: &str) -> Result<Vec<Pod>, kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.k_client.clone(), ns);
        let pods = pods
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(pods.items)
    }

    async fn pod_logs(&self, ns: &str, name: &str) -> Result<String, kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.k_client.clone(), ns);
        pods.logs(name, &LogParams::default()).await
    }
}

#[async_trait]
impl CredentialStore for KubeStore {
    async fn secret_data(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, ByteString>>, kube::Error> {
        let secrets: Api<Secret> = Api::namespaced(self.k_client.clone(), ns);
        Ok(secrets
            .get_opt(name)
            .await?
            .map(|secret| secret.data.unwrap_or_default()))
    }
}

/// Treat empty strings the same as absent values.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Name of each pod, used to label log lines and results.
pub fn pod_names(pods: &[Pod]) -> Vec<String> {
    pods.iter().map(|pod| pod.name_any()).collect()
}
