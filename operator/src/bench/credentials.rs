use std::{collections::BTreeMap, fmt};

use anyhow::anyhow;
use k8s_openapi::ByteString;
use kube::ResourceExt;
use tracing::debug;

use crate::{
    bench::{
        error::{ConfigError, Error, MissingKey},
        ApacheBench,
    },
    utils::{non_empty, CredentialStore},
};

/// Secret key holding the username for request authentication.
pub const REQUEST_USERNAME_KEY: &str = "request.username";
/// Secret key holding the password for request authentication.
pub const REQUEST_PASSWORD_KEY: &str = "request.password";
/// Secret key holding the username for proxy authentication.
pub const PROXY_USERNAME_KEY: &str = "proxy.username";
/// Secret key holding the password for proxy authentication.
pub const PROXY_PASSWORD_KEY: &str = "proxy.password";

/// Username and password read from a Secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

// Keep passwords out of logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// Format expected by the ab -A and -P flags.
impl fmt::Display for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}

/// Credentials needed by a benchmark, only those enabled in the spec are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Credentials for the benchmarked endpoint.
    pub request: Option<CredentialPair>,
    /// Credentials for the proxy.
    pub proxy: Option<CredentialPair>,
}

/// Resolve the credentials enabled in the spec from the Secret named by `secretName`.
///
/// The Secret is only read when authentication is enabled. Every missing key is reported,
/// not only the first one.
pub async fn resolve(
    store: &impl CredentialStore,
    bench: &ApacheBench,
) -> Result<Credentials, Error> {
    let spec = &bench.spec;
    if !spec.authenticate && !spec.authenticate_proxy {
        return Ok(Credentials::default());
    }
    let secret = non_empty(&spec.secret_name).ok_or(ConfigError::MissingSecretName)?;
    let ns = bench
        .namespace()
        .ok_or_else(|| anyhow!("ApacheBench {} has no namespace", bench.name_any()))?;

    debug!(%ns, %secret, "resolving credentials");
    let data = store
        .secret_data(&ns, secret)
        .await?
        .ok_or_else(|| ConfigError::SecretNotFound {
            secret: secret.to_owned(),
        })?;

    let mut missing = Vec::new();
    let request = spec
        .authenticate
        .then(|| pair(&data, REQUEST_USERNAME_KEY, REQUEST_PASSWORD_KEY, &mut missing))
        .flatten();
    let proxy = spec
        .authenticate_proxy
        .then(|| pair(&data, PROXY_USERNAME_KEY, PROXY_PASSWORD_KEY, &mut missing))
        .flatten();

    if !missing.is_empty() {
        return Err(ConfigError::KeysMissing {
            secret: secret.to_owned(),
            missing,
        }
        .into());
    }
    Ok(Credentials { request, proxy })
}

fn pair(
    data: &BTreeMap<String, ByteString>,
    username_key: &'static str,
    password_key: &'static str,
    missing: &mut Vec<MissingKey>,
) -> Option<CredentialPair> {
    let username = lookup(data, "username", username_key, missing);
    let password = lookup(data, "password", password_key, missing);
    Some(CredentialPair {
        username: username?,
        password: password?,
    })
}

fn lookup(
    data: &BTreeMap<String, ByteString>,
    role: &'static str,
    key: &'static str,
    missing: &mut Vec<MissingKey>,
) -> Option<String> {
    match data.get(key) {
        Some(value) => Some(String::from_utf8_lossy(&value.0).into_owned()),
        None => {
            missing.push(MissingKey { role, key });
            None
        }
    }
}
