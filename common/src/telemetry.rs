//! Provides helper functions for initializing telemetry collection and publication.
use std::time::Duration;

use anyhow::Result;
use clap::ValueEnum;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{metrics::MeterProvider, runtime, trace, Resource};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter, Layer, Registry};

/// Output format of the log lines written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable single line output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

/// Handle to the installed telemetry pipelines.
///
/// Call [`Telemetry::shutdown`] before exiting so buffered spans and metrics are flushed.
pub struct Telemetry {
    meter_provider: Option<MeterProvider>,
}

impl Telemetry {
    /// Flush and stop all exporters.
    pub fn shutdown(self) -> Result<()> {
        global::shutdown_tracer_provider();
        if let Some(provider) = self.meter_provider {
            provider.shutdown()?;
        }
        Ok(())
    }
}

fn resource(service_name: &'static str) -> Resource {
    Resource::new(vec![
        KeyValue::new(
            "hostname",
            gethostname::gethostname()
                .into_string()
                .unwrap_or_else(|_| "unknown".to_owned()),
        ),
        KeyValue::new("service.name", service_name),
    ])
}

/// Initialize logging, and tracing plus metrics when an OTLP endpoint is provided.
pub async fn init(
    service_name: &'static str,
    otlp_endpoint: Option<String>,
    format: LogFormat,
) -> Result<Telemetry> {
    // Default to INFO if no env is specified
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    let logger: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .compact()
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };
    let logger = logger.with_filter(log_filter);

    let (telemetry, meter_provider) = if let Some(endpoint) = otlp_endpoint {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint.clone()),
            )
            .with_trace_config(trace::config().with_resource(resource(service_name)))
            .install_batch(runtime::Tokio)?;

        let meter_provider = opentelemetry_otlp::new_pipeline()
            .metrics(runtime::Tokio)
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_resource(resource(service_name))
            .with_period(Duration::from_secs(10))
            .build()?;
        global::set_meter_provider(meter_provider.clone());

        let otlp_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env()?;
        let layer = tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(otlp_filter);
        (Some(layer), Some(meter_provider))
    } else {
        (None, None)
    };

    let collector = Registry::default().with(logger).with(telemetry);
    tracing::subscriber::set_global_default(collector)?;

    Ok(Telemetry { meter_provider })
}
