use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary CRD for requesting an ApacheBench run against an HTTP endpoint.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "httpd.benchmark.io",
    version = "v1alpha1",
    kind = "ApacheBench",
    plural = "apachebenches",
    status = "ApacheBenchStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".spec.url"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ApacheBenchSpec {
    /// HTTP endpoint to benchmark.
    pub url: String,
    /// Number of multiple requests to perform at a time. Default is one request at a time.
    pub concurrency: Option<u32>,
    /// Number of requests to perform for the benchmarking session. Default is a single request.
    pub requests: Option<u32>,
    /// Maximum number of seconds to spend benchmarking. Implies 50000 requests.
    pub time_limit: Option<u32>,
    /// Maximum number of seconds to wait before the socket times out. Default is 30 seconds.
    pub timeout: Option<u32>,
    /// Enable authentication for requests.
    /// The "request.username" and "request.password" keys must be present in the Secret
    /// referenced by `secretName`.
    #[serde(default)]
    pub authenticate: bool,
    /// Enable authentication for proxied requests.
    /// The "proxy.username" and "proxy.password" keys must be present in the Secret
    /// referenced by `secretName`.
    #[serde(default)]
    pub authenticate_proxy: bool,
    /// Name of the Secret containing authentication credentials.
    pub secret_name: Option<String>,
    /// Key-value pairs added as Cookie: lines to the request.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Key-value pairs added as headers to the request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Content-type header to use for POST/PUT data. Default is text/plain.
    pub content_type: Option<String>,
    /// Do not report errors if the length of the responses is not constant.
    #[serde(default)]
    pub disable_length_errors: bool,
    /// Do not display the median and standard deviation values.
    #[serde(default)]
    pub disable_median: bool,
    /// Do not display the "percentage served within XX [ms]" table.
    #[serde(default)]
    pub disable_percentage_served: bool,
    /// Do not report progress when processing more than 150 requests.
    #[serde(default)]
    pub disable_progress: bool,
    /// Do not exit on socket receive errors.
    #[serde(default)]
    pub disable_socket_exit: bool,
    /// Use HEAD requests instead of GET.
    #[serde(default, rename = "enableHEADRequests")]
    pub enable_head_requests: bool,
    /// HTML output options.
    pub html: Option<HtmlSpec>,
    /// Custom HTTP method for the requests.
    pub http_method: Option<String>,
    /// Use the HTTP KeepAlive feature.
    #[serde(default)]
    pub keep_alive: bool,
    /// Name of a ConfigMap that contains POST or PUT data for requests.
    pub config_map_name: Option<String>,
    /// Key in the ConfigMap containing data to POST with each request.
    pub post_data_key: Option<String>,
    /// Key in the ConfigMap containing data to PUT with each request.
    pub put_data_key: Option<String>,
    /// Proxy server for the requests in the form proxy[:port].
    pub proxy: Option<String>,
    /// TLS connection options.
    pub tls: Option<TlsSpec>,
    /// Verbosity level. 4 and above prints header information.
    pub verbosity: Option<u32>,
    /// Size of the TCP send/receive buffer, in bytes.
    pub window_size: Option<u32>,
    /// Container image (including tag) to use.
    pub image: Option<String>,
    /// Pull policy for image.
    pub image_pull_policy: Option<String>,
    /// Overrides for the execution of the benchmark Job.
    pub job: Option<JobOverrideSpec>,
}

/// HTML output options.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
pub struct HtmlSpec {
    /// Print results in HTML tables.
    #[serde(default)]
    pub enabled: bool,
    /// Attributes for the <table> element.
    pub table: Option<String>,
    /// Attributes for the <td> elements.
    pub td: Option<String>,
    /// Attributes for the <tr> elements.
    pub tr: Option<String>,
}

/// TLS connection options.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// SSL/TLS cipher suite (see openssl ciphers).
    pub cipher_suite: Option<String>,
    /// SSL/TLS protocol (SSL2, SSL3, TLS1, TLS1.1, TLS1.2, or ALL).
    pub protocol: Option<String>,
}

/// Execution controls applied to the benchmark Job.
///
/// Only these JobSpec fields can be overridden. Others such as `podFailurePolicy` or
/// `completionMode` are not supported and keep the Kubernetes defaults.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobOverrideSpec {
    /// Maximum number of benchmark pods running at any time.
    pub parallelism: Option<i32>,
    /// Number of successful benchmark pods required to complete the Job.
    pub completions: Option<i32>,
    /// Number of retries before the Job is marked failed.
    pub backoff_limit: Option<i32>,
    /// Duration in seconds the Job may be active before it is terminated.
    pub active_deadline_seconds: Option<i64>,
    /// Seconds after completion before the Job is eligible for deletion.
    pub ttl_seconds_after_finished: Option<i32>,
}

/// Status of an ApacheBench.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
pub struct ApacheBenchStatus {
    /// High level summary of where the ApacheBench is in its lifecycle.
    #[serde(default)]
    pub phase: Phase,
    /// Distinct errors that prevented the completion of the benchmark Job.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Output of each benchmark pod.
    #[serde(default)]
    pub results: Vec<String>,
}

/// Lifecycle phase of an ApacheBench.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, Copy, JsonSchema)]
pub enum Phase {
    /// Accepted but the benchmark has not finished.
    #[default]
    Pending,
    /// The benchmark Job is running.
    Running,
    /// The benchmark Job completed successfully.
    Complete,
    /// The benchmark could not be run.
    Failed,
    /// The state of the benchmark could not be observed.
    Unknown,
}
