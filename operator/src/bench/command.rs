use crate::{
    bench::{
        credentials::{self, Credentials},
        error::Error,
        job::DATA_MOUNT_PATH,
        spec::ApacheBenchSpec,
        ApacheBench,
    },
    utils::{non_empty, CredentialStore},
};

/// Program executed in the benchmark container.
pub const PROGRAM: &str = "ab";

/// Resolve the credentials required by the spec and build the full command.
///
/// Fails with the credential error before any argument is produced.
pub async fn build(store: &impl CredentialStore, bench: &ApacheBench) -> Result<Vec<String>, Error> {
    let credentials = credentials::resolve(store, bench).await?;
    Ok(command(&bench.spec, &credentials))
}

/// Translate a spec into the `ab` argument vector.
///
/// Flags are always appended in the same order so equal specs produce equal commands.
pub fn command(spec: &ApacheBenchSpec, credentials: &Credentials) -> Vec<String> {
    let mut cmd = Args(vec![PROGRAM.to_owned()]);

    if let Some(pair) = &credentials.request {
        cmd.opt("-A", pair.to_string());
    }
    if let Some(pair) = &credentials.proxy {
        cmd.opt("-P", pair.to_string());
    }
    for (key, value) in &spec.cookies {
        cmd.opt("-C", format!("{key}={value}"));
    }
    // A single request at a time is what ab does without the flag.
    if let Some(concurrency) = spec.concurrency.filter(|c| *c > 1) {
        cmd.opt("-c", concurrency.to_string());
    }
    cmd.opt_str("-T", &spec.content_type);
    cmd.flag("-l", spec.disable_length_errors);
    cmd.flag("-S", spec.disable_median);
    cmd.flag("-d", spec.disable_percentage_served);
    cmd.flag("-q", spec.disable_progress);
    cmd.flag("-r", spec.disable_socket_exit);
    cmd.flag("-i", spec.enable_head_requests);
    for (key, value) in &spec.headers {
        cmd.opt("-H", format!("{key}: {value}"));
    }
    if let Some(html) = spec.html.as_ref().filter(|html| html.enabled) {
        cmd.flag("-w", true);
        cmd.opt_str("-x", &html.table);
        cmd.opt_str("-z", &html.td);
        cmd.opt_str("-y", &html.tr);
    }
    cmd.opt_str("-m", &spec.http_method);
    cmd.flag("-k", spec.keep_alive);
    if let Some(key) = non_empty(&spec.post_data_key) {
        cmd.opt("-p", format!("{DATA_MOUNT_PATH}/{key}"));
    }
    cmd.opt_str("-X", &spec.proxy);
    if let Some(key) = non_empty(&spec.put_data_key) {
        cmd.opt("-u", format!("{DATA_MOUNT_PATH}/{key}"));
    }
    if let Some(requests) = spec.requests.filter(|n| *n > 1) {
        cmd.opt("-n", requests.to_string());
    }
    cmd.opt_num("-t", spec.time_limit);
    cmd.opt_num("-s", spec.timeout);
    if let Some(tls) = &spec.tls {
        cmd.opt_str("-Z", &tls.cipher_suite);
        cmd.opt_str("-f", &tls.protocol);
    }
    cmd.opt_num("-v", spec.verbosity);
    cmd.opt_num("-b", spec.window_size);

    cmd.0.push(spec.url.to_owned());
    cmd.0
}

struct Args(Vec<String>);

impl Args {
    fn flag(&mut self, flag: &str, enabled: bool) {
        if enabled {
            self.0.push(flag.to_owned());
        }
    }
    fn opt(&mut self, flag: &str, value: String) {
        self.0.push(flag.to_owned());
        self.0.push(value);
    }
    fn opt_str(&mut self, flag: &str, value: &Option<String>) {
        if let Some(value) = non_empty(value) {
            self.opt(flag, value.to_owned());
        }
    }
    fn opt_num(&mut self, flag: &str, value: Option<u32>) {
        if let Some(value) = value.filter(|v| *v > 0) {
            self.opt(flag, value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use expect_test::expect;

    use super::*;
    use crate::bench::{
        credentials::CredentialPair,
        spec::{HtmlSpec, TlsSpec},
    };

    fn spec(url: &str) -> ApacheBenchSpec {
        ApacheBenchSpec {
            url: url.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn concurrency_and_requests_above_one() {
        let spec = ApacheBenchSpec {
            concurrency: Some(10),
            requests: Some(1000),
            ..spec("http://x")
        };
        assert_eq!(
            command(&spec, &Credentials::default()),
            vec!["ab", "-c", "10", "-n", "1000", "http://x"]
        );
    }

    #[test]
    fn concurrency_and_requests_of_one_are_omitted() {
        let spec = ApacheBenchSpec {
            concurrency: Some(1),
            requests: Some(1),
            ..spec("http://x")
        };
        assert_eq!(command(&spec, &Credentials::default()), vec!["ab", "http://x"]);
    }

    #[test]
    fn zero_values_are_omitted() {
        let spec = ApacheBenchSpec {
            concurrency: Some(0),
            requests: Some(0),
            time_limit: Some(0),
            timeout: Some(0),
            verbosity: Some(0),
            window_size: Some(0),
            content_type: Some(String::new()),
            ..spec("http://x")
        };
        assert_eq!(command(&spec, &Credentials::default()), vec!["ab", "http://x"]);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let spec = ApacheBenchSpec {
            headers: BTreeMap::from_iter([
                ("X-Trace".to_owned(), "1".to_owned()),
                ("Accept".to_owned(), "text/html".to_owned()),
            ]),
            cookies: BTreeMap::from_iter([
                ("session".to_owned(), "abc".to_owned()),
                ("lang".to_owned(), "en".to_owned()),
            ]),
            concurrency: Some(4),
            ..spec("http://x")
        };
        let first = command(&spec, &Credentials::default());
        for _ in 0..10 {
            assert_eq!(command(&spec.clone(), &Credentials::default()), first);
        }
        // Map entries are emitted in key order.
        assert_eq!(
            first,
            vec![
                "ab",
                "-C",
                "lang=en",
                "-C",
                "session=abc",
                "-c",
                "4",
                "-H",
                "Accept: text/html",
                "-H",
                "X-Trace: 1",
                "http://x",
            ]
        );
    }

    #[test]
    fn html_options_require_enabled() {
        let html = HtmlSpec {
            enabled: false,
            table: Some("border=1".to_owned()),
            td: None,
            tr: None,
        };
        let disabled = ApacheBenchSpec {
            html: Some(html.clone()),
            ..spec("http://x")
        };
        assert_eq!(command(&disabled, &Credentials::default()), vec!["ab", "http://x"]);

        let enabled = ApacheBenchSpec {
            html: Some(HtmlSpec {
                enabled: true,
                ..html
            }),
            ..spec("http://x")
        };
        assert_eq!(
            command(&enabled, &Credentials::default()),
            vec!["ab", "-w", "-x", "border=1", "http://x"]
        );
    }

    #[test]
    fn every_option() {
        let spec = ApacheBenchSpec {
            url: "https://example.com/api".to_owned(),
            concurrency: Some(8),
            requests: Some(500),
            time_limit: Some(60),
            timeout: Some(5),
            authenticate: true,
            authenticate_proxy: true,
            secret_name: Some("creds".to_owned()),
            cookies: BTreeMap::from_iter([("session".to_owned(), "abc".to_owned())]),
            headers: BTreeMap::from_iter([("Accept".to_owned(), "*/*".to_owned())]),
            content_type: Some("application/json".to_owned()),
            disable_length_errors: true,
            disable_median: true,
            disable_percentage_served: true,
            disable_progress: true,
            disable_socket_exit: true,
            enable_head_requests: true,
            html: Some(HtmlSpec {
                enabled: true,
                table: Some("border=1".to_owned()),
                td: Some("align=left".to_owned()),
                tr: Some("valign=top".to_owned()),
            }),
            http_method: Some("PATCH".to_owned()),
            keep_alive: true,
            config_map_name: Some("payloads".to_owned()),
            post_data_key: Some("post.json".to_owned()),
            put_data_key: Some("put.json".to_owned()),
            proxy: Some("proxy:3128".to_owned()),
            tls: Some(TlsSpec {
                cipher_suite: Some("ECDHE-RSA-AES256-GCM-SHA384".to_owned()),
                protocol: Some("TLS1.2".to_owned()),
            }),
            verbosity: Some(2),
            window_size: Some(65536),
            ..Default::default()
        };
        let credentials = Credentials {
            request: Some(CredentialPair {
                username: "user".to_owned(),
                password: "pass".to_owned(),
            }),
            proxy: Some(CredentialPair {
                username: "puser".to_owned(),
                password: "ppass".to_owned(),
            }),
        };
        expect![[r#"
            [
                "ab",
                "-A",
                "user:pass",
                "-P",
                "puser:ppass",
                "-C",
                "session=abc",
                "-c",
                "8",
                "-T",
                "application/json",
                "-l",
                "-S",
                "-d",
                "-q",
                "-r",
                "-i",
                "-H",
                "Accept: */*",
                "-w",
                "-x",
                "border=1",
                "-z",
                "align=left",
                "-y",
                "valign=top",
                "-m",
                "PATCH",
                "-k",
                "-p",
                "/data/post.json",
                "-X",
                "proxy:3128",
                "-u",
                "/data/put.json",
                "-n",
                "500",
                "-t",
                "60",
                "-s",
                "5",
                "-Z",
                "ECDHE-RSA-AES256-GCM-SHA384",
                "-f",
                "TLS1.2",
                "-v",
                "2",
                "-b",
                "65536",
                "https://example.com/api",
            ]
        "#]]
        .assert_debug_eq(&command(&spec, &credentials));
    }
}
