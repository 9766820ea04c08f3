use indexmap::IndexMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use depot_constants::{CONNECT_TIMEOUT_SECS, LATEST_TAG, MAX_ATTEMPTS, USER_AGENT};
use depot_error::{DepotError, Result};
use depot_utils::{is_latest, package_basename};

use crate::source::{ArchiveSource, DependencySource};

/// npm-compatible registry over HTTP.
#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(25)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DepotError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn manifest_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(name),
            urlencoding::encode(version_or_latest(version))
        )
    }

    #[must_use]
    pub fn tarball_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/{}/-/{}-{}.tgz",
            self.base_url,
            name,
            package_basename(name),
            version
        )
    }

    async fn send_with_retry(
        &self,
        package: &str,
        url: &str,
        accept: &str,
    ) -> Result<reqwest::Response> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            depot_logger::debug(&format!("[GET] {url}"));

            let resp = match self.client.get(url).header("Accept", accept).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if attempts < MAX_ATTEMPTS && !e.is_builder() {
                        backoff(attempts).await;
                        continue;
                    }
                    return Err(describe_transport_error(package, attempts, &e));
                }
            };

            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }
            if attempts < MAX_ATTEMPTS && is_retryable(status) {
                depot_logger::debug(&format!("HTTP {status} for {url}, retrying"));
                backoff(attempts).await;
                continue;
            }
            return Err(DepotError::network(package, format!("HTTP {status} for {url}")));
        }
    }

    async fn fetch_manifest(&self, name: &str, version: &str) -> Result<Value> {
        let url = self.manifest_url(name, version);
        let resp = self.send_with_retry(name, &url, "application/json").await?;

        let manifest = resp.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                DepotError::format(name, format!("invalid manifest JSON: {e}"))
            } else {
                DepotError::network(name, format!("failed to read manifest: {e}"))
            }
        })?;

        if !manifest.is_object() {
            return Err(DepotError::format(name, "manifest is not a JSON object"));
        }
        Ok(manifest)
    }

    /// Turns `latest` (or an unusable empty selector) into the version the
    /// registry currently tags as latest.
    async fn concrete_version(&self, name: &str, version: &str) -> Result<String> {
        if !version.is_empty() && !is_latest(version) {
            return Ok(version.to_string());
        }

        let manifest = self.fetch_manifest(name, LATEST_TAG).await?;
        let resolved = manifest
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| DepotError::format(name, "manifest has no version field"))?;

        depot_logger::debug(&format!("{name}@{LATEST_TAG} is {resolved}"));
        Ok(resolved.to_string())
    }
}

impl DependencySource for RegistryClient {
    async fn lookup_dependencies(
        &self,
        name: &str,
        version: &str,
    ) -> Result<IndexMap<String, String>> {
        let manifest = self.fetch_manifest(name, version).await?;
        Ok(dependencies_from_manifest(&manifest))
    }
}

impl ArchiveSource for RegistryClient {
    async fn download_archive(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        let version = self.concrete_version(name, version).await?;
        let url = self.tarball_url(name, &version);
        let resp = self
            .send_with_retry(name, &url, "application/octet-stream")
            .await?;

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| DepotError::network(name, format!("failed to read tarball: {e}")))?;

        depot_logger::debug(&format!(
            "Downloaded {name}@{version} ({} bytes)",
            bytes.len()
        ));
        Ok(bytes.to_vec())
    }
}

/// The `dependencies` object of a version manifest. Missing means none;
/// non-string selectors are treated as `*`.
#[must_use]
pub fn dependencies_from_manifest(manifest: &Value) -> IndexMap<String, String> {
    manifest
        .get("dependencies")
        .and_then(Value::as_object)
        .map(|deps| {
            deps.iter()
                .map(|(k, v)| (k.clone(), v.as_str().unwrap_or("*").to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn version_or_latest(version: &str) -> &str {
    if version.is_empty() { LATEST_TAG } else { version }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::INTERNAL_SERVER_ERROR
        || status == StatusCode::SERVICE_UNAVAILABLE
}

async fn backoff(attempts: u32) {
    let delay = std::cmp::min(1000 * u64::from(attempts), 5000);
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

fn describe_transport_error(package: &str, attempts: u32, e: &reqwest::Error) -> DepotError {
    let message = if e.is_timeout() {
        format!("request timed out after {attempts} attempts")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else if e.is_request() {
        format!("request error: {e}")
    } else {
        e.to_string()
    };
    DepotError::network(package, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> RegistryClient {
        RegistryClient::new("https://registry.example.org/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(client().base_url(), "https://registry.example.org");
    }

    #[test]
    fn test_manifest_url() {
        assert_eq!(
            client().manifest_url("express", "4.18.2"),
            "https://registry.example.org/express/4.18.2"
        );
        assert_eq!(
            client().manifest_url("@babel/core", ""),
            "https://registry.example.org/%40babel%2Fcore/latest"
        );
    }

    #[test]
    fn test_tarball_url() {
        assert_eq!(
            client().tarball_url("express", "4.18.2"),
            "https://registry.example.org/express/-/express-4.18.2.tgz"
        );
        assert_eq!(
            client().tarball_url("@babel/core", "7.22.0"),
            "https://registry.example.org/@babel/core/-/core-7.22.0.tgz"
        );
    }

    #[test]
    fn test_dependencies_keep_manifest_order() {
        let manifest = json!({
            "name": "express",
            "version": "4.18.2",
            "dependencies": { "qs": "6.11.0", "accepts": "~1.3.8", "odd": 3 }
        });
        let deps = dependencies_from_manifest(&manifest);
        let keys: Vec<_> = deps.keys().map(String::as_str).collect();
        assert_eq!(keys, ["qs", "accepts", "odd"]);
        assert_eq!(deps["accepts"], "~1.3.8");
        assert_eq!(deps["odd"], "*");
    }

    #[test]
    fn test_missing_dependencies_is_empty() {
        assert!(dependencies_from_manifest(&json!({ "version": "1.0.0" })).is_empty());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }
}
