/// Errors produced by the reconcile function.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("App error: {source}")]
    App {
        #[from]
        source: anyhow::Error,
    },
    #[error("Kube error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },
    #[error("Config error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

/// A key that was expected in the credentials Secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey {
    /// Either "username" or "password".
    pub role: &'static str,
    /// Name of the key in the Secret data.
    pub key: &'static str,
}

/// Invalid configuration of an ApacheBench.
///
/// These errors are recorded on the resource status and fail the benchmark, retrying will
/// not help until the user changes the resource or the referenced Secret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("authentication requires a secretName")]
    MissingSecretName,
    #[error("unable to locate secret '{secret}'")]
    SecretNotFound { secret: String },
    #[error("unable to locate credentials in secret '{secret}'")]
    KeysMissing {
        secret: String,
        missing: Vec<MissingKey>,
    },
    #[error("{key} requires a configMapName")]
    PayloadSource { key: &'static str },
}

impl ConfigError {
    /// Messages recorded on the status, one per problem found.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ConfigError::KeysMissing { secret, missing } => missing
                .iter()
                .map(|m| {
                    format!(
                        "unable to locate {} key '{}' in secret '{}'",
                        m.role, m.key, secret
                    )
                })
                .collect(),
            other => vec![other.to_string()],
        }
    }
}
