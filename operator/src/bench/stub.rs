use kube::Resource;

use crate::bench::{ApacheBench, ApacheBenchSpec, ApacheBenchStatus};

impl ApacheBench {
    /// A minimal ApacheBench named "test" in the "test" namespace, ready to own a Job.
    pub fn test() -> Self {
        let mut bench = ApacheBench::new(
            "test",
            ApacheBenchSpec {
                url: "http://x".to_owned(),
                ..Default::default()
            },
        );
        let meta = bench.meta_mut();
        meta.namespace = Some("test".to_owned());
        meta.uid = Some("a5b0c1d2-0000-4000-8000-000000000001".to_owned());
        bench
    }

    /// Replace the spec.
    pub fn with_spec(self, spec: ApacheBenchSpec) -> Self {
        Self { spec, ..self }
    }

    /// Replace the status.
    pub fn with_status(self, status: ApacheBenchStatus) -> Self {
        Self {
            status: Some(status),
            ..self
        }
    }
}
