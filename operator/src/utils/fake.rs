//! In-memory object store recording every write made by the reconciler.
use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use k8s_openapi::api::{
    batch::v1::{Job, JobStatus},
    core::v1::Pod,
};
use kube::{api::ObjectMeta, error::ErrorResponse, ResourceExt};

use crate::{
    bench::{ApacheBench, ApacheBenchStatus},
    labels::JOB_NAME_LABEL,
    utils::{tests::unavailable, ObjectStore},
};

type Key = (String, String);

#[derive(Default)]
struct State {
    benches: BTreeMap<Key, ApacheBench>,
    jobs: BTreeMap<Key, Job>,
    pods: Vec<Pod>,
    logs: BTreeMap<String, String>,
    created_jobs: Vec<Job>,
    status_updates: Vec<ApacheBenchStatus>,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

fn key(ns: &str, name: &str) -> Key {
    (ns.to_owned(), name.to_owned())
}

fn api_error(reason: &str, code: u16) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: reason.to_owned(),
        reason: reason.to_owned(),
        code,
    })
}

impl FakeStore {
    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().expect("fake store lock"));
        self
    }

    pub fn with_bench(self, bench: ApacheBench) -> Self {
        let k = key(&bench.namespace().unwrap_or_default(), &bench.name_any());
        self.with_state(|state| {
            state.benches.insert(k, bench);
        })
    }

    pub fn with_job(self, job: Job) -> Self {
        let k = key(&job.namespace().unwrap_or_default(), &job.name_any());
        self.with_state(|state| {
            state.jobs.insert(k, job);
        })
    }

    /// Add a pod of the named job in the "test" namespace, with its log.
    pub fn with_pod(self, job_name: &str, pod_name: &str, log: &str) -> Self {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(pod_name.to_owned()),
                namespace: Some("test".to_owned()),
                labels: Some(BTreeMap::from_iter([(
                    JOB_NAME_LABEL.to_owned(),
                    job_name.to_owned(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };
        self.with_state(|state| {
            state.pods.push(pod);
            state.logs.insert(pod_name.to_owned(), log.to_owned());
        })
    }

    /// Every read fails as if the API server was unavailable.
    pub fn failing_reads(self) -> Self {
        self.with_state(|state| state.fail_reads = true)
    }

    /// Every write fails as if the API server was unavailable.
    pub fn failing_writes(self) -> Self {
        self.with_state(|state| state.fail_writes = true)
    }

    /// Simulate the Job controller updating a Job.
    pub fn set_job_status(&self, ns: &str, name: &str, status: JobStatus) {
        let mut state = self.state.lock().expect("fake store lock");
        if let Some(job) = state.jobs.get_mut(&key(ns, name)) {
            job.status = Some(status);
        }
    }

    /// Simulate a Job removed by its TTL or by a user.
    pub fn delete_job(&self, ns: &str, name: &str) {
        let mut state = self.state.lock().expect("fake store lock");
        state.jobs.remove(&key(ns, name));
    }

    pub fn bench(&self, ns: &str, name: &str) -> Option<ApacheBench> {
        let state = self.state.lock().expect("fake store lock");
        state.benches.get(&key(ns, name)).cloned()
    }

    pub fn created_jobs(&self) -> Vec<Job> {
        self.state.lock().expect("fake store lock").created_jobs.clone()
    }

    pub fn status_updates(&self) -> Vec<ApacheBenchStatus> {
        self.state
            .lock()
            .expect("fake store lock")
            .status_updates
            .clone()
    }

    /// Number of writes made against the store.
    pub fn mutations(&self) -> usize {
        let state = self.state.lock().expect("fake store lock");
        state.created_jobs.len() + state.status_updates.len()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_bench(&self, ns: &str, name: &str) -> Result<Option<ApacheBench>, kube::Error> {
        let state = self.state.lock().expect("fake store lock");
        if state.fail_reads {
            return Err(unavailable());
        }
        Ok(state.benches.get(&key(ns, name)).cloned())
    }

    async fn get_job(&self, ns: &str, name: &str) -> Result<Option<Job>, kube::Error> {
        let state = self.state.lock().expect("fake store lock");
        if state.fail_reads {
            return Err(unavailable());
        }
        Ok(state.jobs.get(&key(ns, name)).cloned())
    }

    async fn create_job(&self, ns: &str, job: &Job) -> Result<Job, kube::Error> {
        let mut state = self.state.lock().expect("fake store lock");
        if state.fail_writes {
            return Err(unavailable());
        }
        let k = key(ns, &job.name_any());
        if state.jobs.contains_key(&k) {
            return Err(api_error("AlreadyExists", 409));
        }
        state.jobs.insert(k, job.clone());
        state.created_jobs.push(job.clone());
        Ok(job.clone())
    }

    async fn update_status(
        &self,
        ns: &str,
        name: &str,
        status: &ApacheBenchStatus,
    ) -> Result<(), kube::Error> {
        let mut state = self.state.lock().expect("fake store lock");
        if state.fail_writes {
            return Err(unavailable());
        }
        let bench = state
            .benches
            .get_mut(&key(ns, name))
            .ok_or_else(|| api_error("NotFound", 404))?;
        bench.status = Some(status.clone());
        state.status_updates.push(status.clone());
        Ok(())
    }

    async fn list_pods(&self, ns: &str, label_selector: &str) -> Result<Vec<Pod>, kube::Error> {
        let state = self.state.lock().expect("fake store lock");
        if state.fail_reads {
            return Err(unavailable());
        }
        let (label, value) = label_selector
            .split_once('=')
            .ok_or_else(|| api_error("BadRequest", 400))?;
        Ok(state
            .pods
            .iter()
            .filter(|pod| pod.namespace().as_deref() == Some(ns))
            .filter(|pod| pod.labels().get(label).map(String::as_str) == Some(value))
            .cloned()
            .collect())
    }

    async fn pod_logs(&self, _ns: &str, name: &str) -> Result<String, kube::Error> {
        let state = self.state.lock().expect("fake store lock");
        if state.fail_reads {
            return Err(unavailable());
        }
        state
            .logs
            .get(name)
            .cloned()
            .ok_or_else(|| api_error("NotFound", 404))
    }
}
