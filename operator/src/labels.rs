use std::collections::BTreeMap;

use crate::CONTROLLER_NAME;

/// Manage by label
pub const MANAGED_BY_LABEL_SELECTOR: &str = "managed-by=apachebench";

/// Label set on every pod of a Job by the Job controller.
pub const JOB_NAME_LABEL: &str = "job-name";

/// Labels that indicate the resource is managed by the apachebench operator.
pub fn managed_labels() -> Option<BTreeMap<String, String>> {
    Some(BTreeMap::from_iter(vec![(
        "managed-by".to_owned(),
        CONTROLLER_NAME.to_owned(),
    )]))
}

/// Extend the given labels with the managed labels.
/// The managed label wins if the given labels also define it.
pub fn managed_labels_extend(
    labels: Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    let mut labels = labels.unwrap_or_default();
    labels.extend(managed_labels().unwrap_or_default());
    Some(labels)
}

/// Selector matching the pods created for the named Job.
pub fn job_pods_selector(job_name: &str) -> String {
    format!("{JOB_NAME_LABEL}={job_name}")
}
