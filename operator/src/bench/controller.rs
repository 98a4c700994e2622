use std::sync::Arc;

use anyhow::anyhow;
use futures::stream::StreamExt;
use k8s_openapi::{
    api::{batch::v1::Job, core::v1::Secret},
    NamespaceResourceScope,
};
use kube::{
    client::Client,
    runtime::{
        controller::Action,
        reflector::ObjectRef,
        watcher,
        Controller,
    },
    Api, Resource, ResourceExt,
};
use opentelemetry::{global, KeyValue};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    bench::{
        config::ControllerConfig,
        error::Error,
        job::{self, is_complete},
        ApacheBench, Phase,
    },
    labels::{job_pods_selector, MANAGED_BY_LABEL_SELECTOR},
    utils::{pod_names, Context, CredentialStore, ObjectStore},
};

/// What a reconcile pass has to do to converge, derived from the observed state only.
#[derive(Debug, PartialEq, Eq)]
pub enum Plan {
    /// No Job exists yet.
    CreateJob,
    /// The Job succeeded and its results are not on the status yet.
    CollectResults,
    /// Nothing to do until the Job changes.
    Wait,
}

/// Result of a successful reconcile pass.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The ApacheBench no longer exists.
    Deleted,
    /// The benchmark Job was created.
    JobCreated,
    /// The results were collected and the ApacheBench marked Complete.
    Completed,
    /// Already converged, nothing was written.
    Converged,
}

/// Decide the next step for an ApacheBench given its Job, if any.
///
/// A Job is never recreated or changed once it exists, only its status is read. A Complete
/// ApacheBench whose Job was deleted, by its TTL or by hand, does not run again.
pub fn plan(bench: &ApacheBench, job: Option<&Job>) -> Plan {
    match job {
        None if bench.phase() == Phase::Complete => Plan::Wait,
        None => Plan::CreateJob,
        Some(job) if is_complete(job) && bench.phase() != Phase::Complete => Plan::CollectResults,
        Some(_) => Plan::Wait,
    }
}

/// Map a child resource to the ApacheBench controlling it.
///
/// Only an owner reference marked as controller and pointing at an ApacheBench counts.
pub fn controlling_owner<K: Resource>(obj: K) -> Option<ObjectRef<ApacheBench>> {
    let meta = obj.meta();
    let ns = meta.namespace.as_deref()?;
    meta.owner_references
        .iter()
        .flatten()
        .find(|oref| {
            oref.controller == Some(true)
                && oref.kind == ApacheBench::kind(&())
                && oref.api_version == ApacheBench::api_version(&())
        })
        .map(|oref| ObjectRef::new(&oref.name).within(ns))
}

/// Handle errors during reconciliation.
fn on_error(
    bench: Arc<ApacheBench>,
    error: &Error,
    cx: Arc<Context<impl ObjectStore, impl CredentialStore>>,
) -> Action {
    debug!(name = %bench.name_any(), %error, "requeue after error");
    Action::requeue(cx.config.error_requeue)
}

fn scoped_api<K>(k_client: Client, ns: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match ns {
        Some(ns) => Api::namespaced(k_client, ns),
        None => Api::all(k_client),
    }
}

/// Start a controller for the ApacheBench CRD.
///
/// Changes to an ApacheBench trigger a pass for itself, changes to a Job or Secret trigger a
/// pass for the ApacheBench controlling it.
pub async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    let k_client = Client::try_default().await?;
    let ns = config.namespace.clone();
    let context = Arc::new(Context::new(k_client.clone(), config));

    let benches: Api<ApacheBench> = scoped_api(k_client.clone(), ns.as_deref());
    let jobs: Api<Job> = scoped_api(k_client.clone(), ns.as_deref());
    let secrets: Api<Secret> = scoped_api(k_client.clone(), ns.as_deref());

    info!(namespace = ?ns, "starting apachebench controller");
    Controller::new(benches, watcher::Config::default())
        .watches(
            jobs,
            watcher::Config::default().labels(MANAGED_BY_LABEL_SELECTOR),
            controlling_owner::<Job>,
        )
        .watches(secrets, watcher::Config::default(), controlling_owner::<Secret>)
        .shutdown_on_signal()
        .run(reconcile, on_error, context)
        .for_each(|rec_res| async move {
            match rec_res {
                Ok((bench, _)) => {
                    debug!(name = %bench.name, "reconcile success");
                }
                Err(err) => {
                    error!(?err, "reconcile error")
                }
            }
        })
        .await;
    Ok(())
}

/// Perform a reconcile pass for the ApacheBench CRD
async fn reconcile(
    bench: Arc<ApacheBench>,
    cx: Arc<Context<impl ObjectStore, impl CredentialStore>>,
) -> Result<Action, Error> {
    let meter = global::meter("apachebench");
    let runs = meter
        .u64_counter("apachebench_reconcile_count")
        .with_description("Number of apachebench reconciles")
        .init();

    match reconcile_(bench, cx).await {
        Ok(action) => {
            runs.add(1, &[KeyValue::new("result", "ok")]);
            Ok(action)
        }
        Err(err) => {
            runs.add(1, &[KeyValue::new("result", "err")]);
            Err(err)
        }
    }
}

/// Perform a reconcile pass for the ApacheBench CRD
async fn reconcile_(
    bench: Arc<ApacheBench>,
    cx: Arc<Context<impl ObjectStore, impl CredentialStore>>,
) -> Result<Action, Error> {
    let name = bench.name_any();
    let ns = bench
        .namespace()
        .ok_or_else(|| anyhow!("ApacheBench {name} has no namespace"))?;

    let outcome = converge(&ns, &name, &*cx).await?;
    debug!(?outcome, "reconcile");

    // Job and Secret changes are watched, there is nothing to poll for.
    Ok(Action::await_change())
}

/// Drive one ApacheBench towards a single Job and report the Job outcome on its status.
///
/// At most one write is made per pass, either the Job create or a status update.
#[instrument(skip(cx))]
pub async fn converge(
    ns: &str,
    name: &str,
    cx: &Context<impl ObjectStore, impl CredentialStore>,
) -> Result<Outcome, Error> {
    let Some(bench) = cx.store.get_bench(ns, name).await? else {
        debug!("apachebench no longer exists");
        return Ok(Outcome::Deleted);
    };
    let job = cx.store.get_job(ns, name).await?;

    match plan(&bench, job.as_ref()) {
        Plan::CreateJob => create_job(ns, &bench, cx).await,
        Plan::CollectResults => collect_results(ns, &bench, cx).await,
        Plan::Wait => Ok(Outcome::Converged),
    }
}

async fn create_job(
    ns: &str,
    bench: &ApacheBench,
    cx: &Context<impl ObjectStore, impl CredentialStore>,
) -> Result<Outcome, Error> {
    match job::synthesize(bench, &cx.credentials, &cx.config.images).await {
        Ok(job) => {
            cx.store.create_job(ns, &job).await?;
            info!("created benchmark job");
            Ok(Outcome::JobCreated)
        }
        Err(Error::Config { source }) => {
            warn!(%source, "invalid apachebench configuration");
            let observed = bench.observed_status();
            let status = observed.failed(source.messages());
            if status != observed {
                cx.store
                    .update_status(ns, &bench.name_any(), &status)
                    .await?;
            }
            Err(Error::Config { source })
        }
        Err(err) => Err(err),
    }
}

async fn collect_results(
    ns: &str,
    bench: &ApacheBench,
    cx: &Context<impl ObjectStore, impl CredentialStore>,
) -> Result<Outcome, Error> {
    let name = bench.name_any();
    let pods = cx.store.list_pods(ns, &job_pods_selector(&name)).await?;
    debug!(pods = ?pod_names(&pods), "collecting benchmark results");

    let mut results = Vec::with_capacity(pods.len());
    for pod in &pods {
        results.push(cx.store.pod_logs(ns, &pod.name_any()).await?);
    }

    let status = bench.observed_status().completed(results);
    cx.store.update_status(ns, &name, &status).await?;
    info!(results = status.results.len(), "benchmark complete");
    Ok(Outcome::Completed)
}
