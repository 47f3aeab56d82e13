//! Purpose: Blocking HTTP client for the Service Fabric REST gateway.
//! Exports: `FabricClient`, `ClientConfig`, `DEFAULT_API_VERSION`.
//! Role: Builds gateway URLs, sends typed bodies, decodes typed responses and error envelopes.
//! Invariants: Every request carries `api-version`; `timeout` is sent only when configured.
//! Invariants: Response bodies go through the wire converters, never a lenient serde path.
#![allow(clippy::result_large_err)]

use crate::core::codec;
use crate::core::error::{Error, ErrorKind};
use crate::core::value::{FromWire, ToWire};
use crate::model::PagedList;
use crate::model::health::{ApplicationHealthPolicy, DeployedServicePackageHealth, HealthStateFilter};
use crate::model::image_store::{ImageStoreContent, ProvisionApplicationTypeDescription};
use crate::model::partition::{PartitionId, ServicePartitionInfo};
use crate::model::service::ServiceInfo;
use crate::model::upgrade::{ApplicationUpgradeDescription, ApplicationUpgradeProgressInfo};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_API_VERSION: &str = "6.0";
const PROVISION_API_VERSION: &str = "6.2";

/// Settings for a `FabricClient`; the CLI fills this from flags and environment.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Gateway base URL, e.g. `http://localhost:19080`.
    pub endpoint: String,
    /// Overrides the per-operation `api-version`.
    pub api_version: Option<String>,
    /// Server-side operation timeout in seconds (`timeout` query parameter).
    pub server_timeout: Option<u64>,
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: None,
            server_timeout: None,
            request_timeout: None,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_server_timeout(mut self, seconds: u64) -> Self {
        self.server_timeout = Some(seconds);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[derive(Clone)]
pub struct FabricClient {
    inner: Arc<FabricClientInner>,
}

struct FabricClientInner {
    base_url: Url,
    api_version: Option<String>,
    server_timeout: Option<u64>,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "Error")]
    error: GatewayError,
}

#[derive(Deserialize)]
struct GatewayError {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

impl FabricClient {
    pub fn new(endpoint: impl Into<String>) -> ApiResult<Self> {
        Self::with_config(ClientConfig::new(endpoint))
    }

    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        let base_url = parse_cluster_endpoint(&config.endpoint)?;
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            inner: Arc::new(FabricClientInner {
                base_url,
                api_version: config.api_version,
                server_timeout: config.server_timeout,
                agent: builder.build(),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn get_application_upgrade_progress(
        &self,
        application_id: &str,
    ) -> ApiResult<ApplicationUpgradeProgressInfo> {
        let url = self.url(
            &["Applications", application_id, "$", "GetUpgradeProgress"],
            DEFAULT_API_VERSION,
            &[],
        )?;
        self.request_json("GET", &url, None::<&Value>)
    }

    pub fn start_application_upgrade(
        &self,
        application_id: &str,
        description: &ApplicationUpgradeDescription,
    ) -> ApiResult<()> {
        let url = self.url(
            &["Applications", application_id, "$", "Upgrade"],
            DEFAULT_API_VERSION,
            &[],
        )?;
        self.request_empty("POST", &url, Some(description))
    }

    pub fn get_service_info_list(
        &self,
        application_id: &str,
        continuation_token: Option<&str>,
    ) -> ApiResult<PagedList<ServiceInfo>> {
        let url = self.url(
            &["Applications", application_id, "$", "GetServices"],
            DEFAULT_API_VERSION,
            &continuation_query(continuation_token),
        )?;
        self.request_json("GET", &url, None::<&Value>)
    }

    pub fn get_partition_info_list(
        &self,
        service_id: &str,
        continuation_token: Option<&str>,
    ) -> ApiResult<PagedList<ServicePartitionInfo>> {
        let url = self.url(
            &["Services", service_id, "$", "GetPartitions"],
            DEFAULT_API_VERSION,
            &continuation_query(continuation_token),
        )?;
        self.request_json("GET", &url, None::<&Value>)
    }

    /// Follows continuation tokens until an empty or already-seen token.
    pub fn get_all_partition_info(&self, service_id: &str) -> ApiResult<Vec<ServicePartitionInfo>> {
        let mut all = Vec::new();
        let mut seen = HashSet::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.get_partition_info_list(service_id, token.as_deref())?;
            let next = page.next_token().map(str::to_string);
            all.extend(page.items.unwrap_or_default());
            match next {
                Some(next) if seen.insert(next.clone()) => token = Some(next),
                Some(next) => {
                    tracing::warn!(service_id, token = %next, "continuation token repeated; stopping");
                    return Ok(all);
                }
                None => return Ok(all),
            }
        }
    }

    pub fn get_partition_info(&self, partition_id: &PartitionId) -> ApiResult<ServicePartitionInfo> {
        let url = self.url(&["Partitions", partition_id.as_str()], DEFAULT_API_VERSION, &[])?;
        self.request_json("GET", &url, None::<&Value>)
    }

    /// `content_path` is relative to the image store root and sent as one path segment.
    pub fn get_image_store_content(&self, content_path: &str) -> ApiResult<ImageStoreContent> {
        if content_path.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("image store content path must not be empty"));
        }
        let url = self.url(&["ImageStore", content_path], DEFAULT_API_VERSION, &[])?;
        self.request_json("GET", &url, None::<&Value>)
    }

    pub fn get_deployed_service_package_health_using_policy(
        &self,
        node_name: &str,
        application_id: &str,
        service_package_name: &str,
        events_health_state_filter: HealthStateFilter,
        policy: &ApplicationHealthPolicy,
    ) -> ApiResult<DeployedServicePackageHealth> {
        let url = self.url(
            &[
                "Nodes",
                node_name,
                "$",
                "GetApplications",
                application_id,
                "$",
                "GetServicePackages",
                service_package_name,
                "$",
                "GetHealth",
            ],
            DEFAULT_API_VERSION,
            &[(
                "EventsHealthStateFilter",
                events_health_state_filter.bits().to_string(),
            )],
        )?;
        self.request_json("POST", &url, Some(policy))
    }

    pub fn provision_application_type(
        &self,
        description: &ProvisionApplicationTypeDescription,
    ) -> ApiResult<()> {
        let url = self.url(&["ApplicationTypes", "$", "Provision"], PROVISION_API_VERSION, &[])?;
        self.request_empty("POST", &url, Some(description))
    }

    fn url(&self, segments: &[&str], api_version: &str, query: &[(&str, String)]) -> ApiResult<Url> {
        let mut url = resource_url(&self.inner.base_url, segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(
                "api-version",
                self.inner.api_version.as_deref().unwrap_or(api_version),
            );
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            if let Some(timeout) = self.inner.server_timeout {
                pairs.append_pair("timeout", &timeout.to_string());
            }
        }
        Ok(url)
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<R>
    where
        T: ToWire + ?Sized,
        R: FromWire,
    {
        let text = self.send(method, url, body)?;
        codec::from_str(&text).map_err(|err| {
            tracing::debug!(error = %err, url = %url, "response did not match the expected shape");
            err.with_hint(format!("while decoding response from {method} {}", url.path()))
        })
    }

    fn request_empty<T>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<()>
    where
        T: ToWire + ?Sized,
    {
        self.send(method, url, body).map(|_| ())
    }

    fn send<T>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<String>
    where
        T: ToWire + ?Sized,
    {
        tracing::debug!(method, url = %url, "sending gateway request");
        let request = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = codec::to_string(body)?;
                request
                    .set("Content-Type", "application/json; charset=utf-8")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => resp.into_string().map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read response body")
                    .with_source(err)
            }),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_hint(format!("is the gateway reachable at {}?", self.inner.base_url))
                .with_source(err)),
        }
    }
}

fn continuation_query(token: Option<&str>) -> Vec<(&'static str, String)> {
    token
        .filter(|token| !token.is_empty())
        .map(|token| vec![("ContinuationToken", token.to_string())])
        .unwrap_or_default()
}

/// Parses a cluster HTTP endpoint such as `http://localhost:19080`.
/// Anything past the authority is rejected rather than dropped.
fn parse_cluster_endpoint(endpoint: &str) -> ApiResult<Url> {
    let endpoint = endpoint.trim();
    let url = Url::parse(endpoint).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("cluster endpoint `{endpoint}` is not a url"))
            .with_source(err)
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("cluster endpoint scheme `{other}` is not http or https")));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("cluster endpoint `{endpoint}` has no host")));
    }
    if url.path().trim_end_matches('/') != "" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("cluster endpoint `{endpoint}` carries a path"))
            .with_hint("Use the HTTP gateway root, e.g. http://localhost:19080 (not the Explorer url)."));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("cluster endpoint `{endpoint}` carries a query or fragment")));
    }
    Ok(url)
}

/// Resource path under the gateway root; each segment is percent-encoded on its own.
fn resource_url(root: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = root.clone();
    url.path_segments_mut()
        .map_err(|_| Error::new(ErrorKind::Internal).with_message("cluster endpoint has no path"))?
        .clear()
        .extend(segments);
    Ok(url)
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let err = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => error_from_gateway(envelope.error),
        Err(_) => Error::new(error_kind_from_status(status))
            .with_message(format!("gateway error status {status}")),
    };
    tracing::warn!(status, code = err.code().unwrap_or(""), "gateway returned an error");
    err.with_status(status)
}

fn error_from_gateway(remote: GatewayError) -> Error {
    let mut err = Error::new(ErrorKind::Remote);
    if let Some(message) = remote.message {
        err = err.with_message(message);
    }
    if let Some(code) = remote.code {
        err = err.with_code(code);
    }
    err
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 => ErrorKind::Usage,
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Remote,
    }
}
