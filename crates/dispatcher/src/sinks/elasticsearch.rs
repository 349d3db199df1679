//! ElasticsearchSink - bulk API over HTTP

use std::time::Duration;

use contracts::{BulkSink, ContractError, DispatchEnvelope, SinkSettings};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Port used when the address does not name one
pub const DEFAULT_PORT: u16 = 9200;

/// Port used for an `https://` URL that does not name one
pub const HTTPS_PORT: u16 = 443;

const NDJSON: &str = "application/x-ndjson";
const MAX_ERROR_BODY: usize = 512;

/// Configuration for ElasticsearchSink
#[derive(Clone)]
pub struct ElasticsearchConfig {
    /// `<base>/_bulk`
    pub endpoint: Url,
    /// Whole-request timeout
    pub timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for ElasticsearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ElasticsearchConfig {
    /// Build from a destination address and the sink settings
    ///
    /// Accepted addresses: `host`, `host:port`, `http(s)://host[:port][/path]`.
    /// A missing port is 9200, or 443 for an `https://` URL.
    pub fn from_settings(address: &str, settings: &SinkSettings) -> Result<Self, ContractError> {
        Ok(Self {
            endpoint: bulk_endpoint(address)?,
            timeout: Duration::from_secs(settings.timeout_secs),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }
}

/// Resolve a destination address to its bulk endpoint
pub fn bulk_endpoint(address: &str) -> Result<Url, ContractError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ContractError::config_validation(
            "output",
            "destination address is empty",
        ));
    }

    let with_scheme = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    let mut url = Url::parse(&with_scheme).map_err(|e| {
        ContractError::config_validation("output", format!("invalid address '{address}': {e}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ContractError::config_validation(
            "output",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.has_host() {
        return Err(ContractError::config_validation(
            "output",
            format!("address '{address}' has no host"),
        ));
    }
    // `Url` hides a port equal to the scheme default, so look at what was typed
    if !has_explicit_port(&with_scheme) {
        let port = match url.scheme() {
            "https" => HTTPS_PORT,
            _ => DEFAULT_PORT,
        };
        url.set_port(Some(port)).map_err(|()| {
            ContractError::config_validation("output", format!("address '{address}' has no host"))
        })?;
    }

    let path = format!("{}/_bulk", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    Ok(url)
}

/// Whether the authority of `url` (which carries a scheme) names a port
fn has_explicit_port(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let port = match host_port.rsplit_once(']') {
        Some((_, after)) => after.strip_prefix(':'),
        None => host_port.rsplit_once(':').map(|(_, port)| port),
    };
    port.is_some_and(|port| !port.is_empty())
}

/// Response body of the bulk API (only the fields we inspect)
#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl BulkResponse {
    /// Error objects of the rejected items, in request order
    fn item_errors(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.items
            .iter()
            .filter_map(|item| item.values().next())
            .filter_map(|result| result.get("error"))
    }
}

fn error_reason(error: &serde_json::Value) -> String {
    match error.get("reason").and_then(serde_json::Value::as_str) {
        Some(reason) => match error.get("type").and_then(serde_json::Value::as_str) {
            Some(kind) => format!("{kind}: {reason}"),
            None => reason.to_string(),
        },
        None => error.to_string(),
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Sink that submits each batch as one bulk request
pub struct ElasticsearchSink {
    name: String,
    config: ElasticsearchConfig,
    client: Option<Client>,
}

impl ElasticsearchSink {
    /// Create a new ElasticsearchSink
    pub fn new(name: impl Into<String>, config: ElasticsearchConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        debug!(sink = %name, endpoint = %config.endpoint, "ElasticsearchSink created");

        Ok(Self {
            name,
            config,
            client: Some(client),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    fn client(&self) -> Result<&Client, ContractError> {
        self.client
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "client closed"))
    }

    fn encode(batch: &[DispatchEnvelope]) -> Result<Vec<u8>, ContractError> {
        let mut body = Vec::with_capacity(batch.len() * 512);
        for envelope in batch {
            envelope.write_bulk_lines(&mut body)?;
        }
        Ok(body)
    }

    fn check_response(&self, response: &BulkResponse, total: usize) -> Result<(), ContractError> {
        if !response.errors {
            return Ok(());
        }
        let rejected = response.item_errors().count();
        let reason = response
            .item_errors()
            .next()
            .map(error_reason)
            .unwrap_or_else(|| "bulk response reported errors".to_string());

        warn!(sink = %self.name, rejected, total, reason = %reason, "Bulk request had rejected items");
        Err(ContractError::SinkRejected {
            sink_name: self.name.clone(),
            rejected,
            total,
            reason,
        })
    }
}

impl BulkSink for ElasticsearchSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "elasticsearch_sink_bulk_index",
        skip(self, batch),
        fields(sink = %self.name, size = batch.len())
    )]
    async fn bulk_index(&mut self, batch: &[DispatchEnvelope]) -> Result<(), ContractError> {
        if batch.is_empty() {
            return Ok(());
        }
        let body = Self::encode(batch)?;
        let bytes = body.len();

        let mut request = self
            .client()?
            .post(self.config.endpoint.clone())
            .header(CONTENT_TYPE, NDJSON)
            .body(body);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        if !status.is_success() {
            return Err(ContractError::sink_write(
                &self.name,
                format!("HTTP {status}: {}", truncate(&text)),
            ));
        }

        let parsed: BulkResponse = serde_json::from_str(&text).map_err(|e| {
            ContractError::sink_write(&self.name, format!("unexpected bulk response: {e}"))
        })?;
        self.check_response(&parsed, batch.len())?;

        debug!(sink = %self.name, bytes, status = status.as_u16(), "Bulk request accepted");
        Ok(())
    }

    #[instrument(name = "elasticsearch_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.client = None;
        debug!(sink = %self.name, "ElasticsearchSink closed");
        Ok(())
    }
}
