//! Operator is a long lived process that runs ApacheBench benchmarks as k8s Jobs.
#![deny(missing_docs)]

use std::time::Duration;

use anyhow::Result;
use apachebench_operator::bench::{self, config::ControllerConfig, job::JobImageConfig};
use bench_common::telemetry::{self, LogFormat};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Collector receiving traces and metrics, none are exported when unset.
    #[arg(long, env = "OPERATOR_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Log line format, compact or json.
    #[arg(long, value_enum, default_value_t, env = "OPERATOR_LOG_FORMAT")]
    log_format: LogFormat,

    /// Only watch this namespace, all namespaces when unset.
    #[arg(long, env = "OPERATOR_NAMESPACE")]
    namespace: Option<String>,

    /// Image for benchmark jobs that do not set one.
    #[arg(long, env = "OPERATOR_DEFAULT_IMAGE")]
    default_image: Option<String>,

    /// Seconds to wait before retrying a failed reconcile.
    #[arg(long, env = "OPERATOR_ERROR_REQUEUE_SECS", default_value_t = 5)]
    error_requeue_secs: u64,
}

impl Cli {
    fn config(&self) -> ControllerConfig {
        let mut images = JobImageConfig::default();
        if let Some(image) = &self.default_image {
            images.image = image.clone();
        }
        ControllerConfig {
            namespace: self.namespace.clone(),
            images,
            error_requeue: Duration::from_secs(self.error_requeue_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let telemetry =
        telemetry::init("apachebench-operator", args.otlp_endpoint.clone(), args.log_format)
            .await?;

    let config = args.config();
    info!(?config, otlp_endpoint = ?args.otlp_endpoint, "starting operator");
    bench::run(config).await?;

    // Flush traces and metrics before shutdown
    telemetry.shutdown()?;
    Ok(())
}
