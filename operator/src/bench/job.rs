use anyhow::anyhow;
use k8s_openapi::api::{
    batch::v1::{Job, JobSpec},
    core::v1::{ConfigMapVolumeSource, Container, PodSpec, PodTemplateSpec, Volume, VolumeMount},
};
use kube::{api::ObjectMeta, Resource, ResourceExt};

use crate::{
    bench::{
        command,
        error::{ConfigError, Error},
        spec::ApacheBenchSpec,
        ApacheBench,
    },
    labels::managed_labels_extend,
    utils::{non_empty, CredentialStore},
};

/// httpd 2.4.43-alpine, which ships the ab binary.
pub const DEFAULT_IMAGE: &str =
    "httpd@sha256:223b88ef9a99261b07d2025d43799f45cace9b7b208195078b42cc2b922e453c";
/// Name of the container running ab.
pub const CONTAINER_NAME: &str = "benchmark";
/// Name of the volume holding POST/PUT data.
pub const DATA_VOLUME_NAME: &str = "data";
/// Directory the POST/PUT data is mounted at.
pub const DATA_MOUNT_PATH: &str = "/data";

/// Configuration for job images.
#[derive(Clone, Debug, PartialEq)]
pub struct JobImageConfig {
    /// Image for jobs that do not set one.
    pub image: String,
    /// Pull policy for jobs that do not set one.
    pub image_pull_policy: String,
}

impl Default for JobImageConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_owned(),
            image_pull_policy: "IfNotPresent".to_owned(),
        }
    }
}

impl JobImageConfig {
    /// Images for the given spec, the spec overrides win over the configured defaults.
    pub fn for_spec(&self, spec: &ApacheBenchSpec) -> Self {
        Self {
            image: non_empty(&spec.image)
                .map(str::to_owned)
                .unwrap_or_else(|| self.image.clone()),
            image_pull_policy: non_empty(&spec.image_pull_policy)
                .map(str::to_owned)
                .unwrap_or_else(|| self.image_pull_policy.clone()),
        }
    }
}

/// Volume exposing the POST/PUT data ConfigMap to the container.
pub struct PayloadVolume {
    volume: Volume,
    mount: VolumeMount,
}

/// The payload volume, present only when a POST or PUT data key is configured.
pub fn payload_volume(spec: &ApacheBenchSpec) -> Result<Option<PayloadVolume>, ConfigError> {
    let key = if non_empty(&spec.post_data_key).is_some() {
        "postDataKey"
    } else if non_empty(&spec.put_data_key).is_some() {
        "putDataKey"
    } else {
        return Ok(None);
    };
    let config_map = non_empty(&spec.config_map_name).ok_or(ConfigError::PayloadSource { key })?;
    Ok(Some(PayloadVolume {
        volume: Volume {
            name: DATA_VOLUME_NAME.to_owned(),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(config_map.to_owned()),
                ..Default::default()
            }),
            ..Default::default()
        },
        mount: VolumeMount {
            name: DATA_VOLUME_NAME.to_owned(),
            mount_path: DATA_MOUNT_PATH.to_owned(),
            read_only: Some(true),
            ..Default::default()
        },
    }))
}

/// Build the desired Job for an ApacheBench, resolving any credentials it needs.
pub async fn synthesize(
    bench: &ApacheBench,
    store: &impl CredentialStore,
    images: &JobImageConfig,
) -> Result<Job, Error> {
    let payload = payload_volume(&bench.spec)?;
    let command = command::build(store, bench).await?;
    job(bench, command, payload, images)
}

/// Assemble the Job running `command`, owned by `bench`.
pub fn job(
    bench: &ApacheBench,
    command: Vec<String>,
    payload: Option<PayloadVolume>,
    images: &JobImageConfig,
) -> Result<Job, Error> {
    let name = bench.name_any();
    let ns = bench
        .namespace()
        .ok_or_else(|| anyhow!("ApacheBench {name} has no namespace"))?;
    let oref = bench
        .controller_owner_ref(&())
        .ok_or_else(|| anyhow!("ApacheBench {name} has no uid to own a Job"))?;
    let images = images.for_spec(&bench.spec);
    let overrides = bench.spec.job.clone().unwrap_or_default();
    let labels = managed_labels_extend(Some(bench.labels().clone()));
    let (volumes, volume_mounts) = match payload {
        Some(PayloadVolume { volume, mount }) => (Some(vec![volume]), Some(vec![mount])),
        None => (None, None),
    };

    Ok(Job {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(ns),
            labels: labels.clone(),
            owner_references: Some(vec![oref]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            parallelism: overrides.parallelism,
            completions: overrides.completions,
            backoff_limit: overrides.backoff_limit,
            active_deadline_seconds: overrides.active_deadline_seconds,
            ttl_seconds_after_finished: overrides.ttl_seconds_after_finished,
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels,
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_owned(),
                        image: Some(images.image),
                        image_pull_policy: Some(images.image_pull_policy),
                        command: Some(command),
                        volume_mounts,
                        ..Default::default()
                    }],
                    volumes,
                    restart_policy: Some("OnFailure".to_owned()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Whether the Job finished successfully.
///
/// Either the Job controller reported the Complete condition, or enough pods succeeded.
/// Without a completion count any success is enough, but only once no pod is active.
pub fn is_complete(job: &Job) -> bool {
    let Some(status) = &job.status else {
        return false;
    };
    let complete_condition = status.conditions.iter().flatten().any(|condition| {
        condition.type_ == "Complete" && condition.status == "True"
    });
    let succeeded = status.succeeded.unwrap_or_default();
    let active = status.active.unwrap_or_default();
    let enough_succeeded = match job.spec.as_ref().and_then(|spec| spec.completions) {
        Some(completions) => succeeded > 0 && succeeded >= completions,
        None => succeeded > 0 && active == 0,
    };
    complete_condition || enough_succeeded
}
