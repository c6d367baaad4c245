//! [`SearchClient`] backed by the official Elasticsearch client.
//!
//! The Elasticsearch client is asynchronous. [`ElasticsearchClient`] owns a
//! current-thread tokio runtime and blocks on every request, so it must not
//! be called from within another tokio runtime.

use std::future::Future;
use std::time::Duration;

use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesFlushParts, IndicesGetAliasParts,
    IndicesPutAliasParts, IndicesPutTemplateParts, IndicesRefreshParts,
};
use elasticsearch::params::WaitForStatus;
use elasticsearch::Elasticsearch;
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::client::{HealthStatus, SearchClient, interpret_response};
use crate::config::{SearchAuth, SearchConfig};
use crate::error::{ClusterError, ClusterResult};

/// Node used when the configuration names none.
const DEFAULT_HOST: &str = "http://localhost:9200";

/// Blocking cluster client for Elasticsearch and OpenSearch.
#[derive(Debug)]
pub struct ElasticsearchClient {
    client: Elasticsearch,
    runtime: Runtime,
}

impl ElasticsearchClient {
    /// Creates a client for the first configured host.
    ///
    /// No request is sent; connection problems surface on the first call.
    pub fn new(config: &SearchConfig) -> ClusterResult<Self> {
        let client = build_client(config)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClusterError::Transport {
                message: format!("Failed to start runtime: {}", e),
            })?;
        Ok(Self { client, runtime })
    }

    /// Returns the underlying Elasticsearch client.
    pub fn inner(&self) -> &Elasticsearch {
        &self.client
    }

    /// Waits for a response and interprets its status against `ignore`.
    fn execute<F>(&self, request: F, ignore: &[u16]) -> ClusterResult<Value>
    where
        F: Future<Output = Result<Response, elasticsearch::Error>>,
    {
        self.runtime.block_on(async {
            let response = request.await.map_err(transport_error)?;
            let status = response.status_code().as_u16();
            let body = response.text().await.map_err(transport_error)?;
            debug!(status, "Cluster responded");
            interpret_response(status, &body, ignore)
        })
    }
}

fn build_client(config: &SearchConfig) -> ClusterResult<Elasticsearch> {
    let url = config
        .hosts
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let parsed_url: elasticsearch::http::Url =
        url.parse().map_err(|e| ClusterError::Transport {
            message: format!("Invalid URL {}: {}", url, e),
        })?;

    let conn_pool = SingleNodeConnectionPool::new(parsed_url);

    let mut builder = TransportBuilder::new(conn_pool)
        .timeout(Duration::from_millis(config.request_timeout_ms));

    if config.disable_certificate_validation {
        builder = builder.cert_validation(CertificateValidation::None);
    }

    if let Some(ref auth) = config.auth {
        builder = match auth {
            SearchAuth::Basic { username, password } => {
                builder.auth(Credentials::Basic(username.clone(), password.clone()))
            }
            SearchAuth::Bearer { token } => builder.auth(Credentials::Bearer(token.clone())),
        };
    }

    let transport = builder.build().map_err(|e| ClusterError::Transport {
        message: format!("Failed to build transport: {}", e),
    })?;

    Ok(Elasticsearch::new(transport))
}

fn transport_error(e: elasticsearch::Error) -> ClusterError {
    ClusterError::Transport {
        message: e.to_string(),
    }
}

fn wait_for_status(status: HealthStatus) -> WaitForStatus {
    match status {
        HealthStatus::Green => WaitForStatus::Green,
        HealthStatus::Yellow => WaitForStatus::Yellow,
        HealthStatus::Red => WaitForStatus::Red,
    }
}

impl SearchClient for ElasticsearchClient {
    fn create_index(&self, index: &str, body: &Value, ignore: &[u16]) -> ClusterResult<Value> {
        let indices = self.client.indices();
        let request = indices
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send();
        self.execute(request, ignore)
    }

    fn put_alias(&self, indices: &[String], name: &str, ignore: &[u16]) -> ClusterResult<Value> {
        let names: Vec<&str> = indices.iter().map(String::as_str).collect();
        let indices = self.client.indices();
        let request = indices
            .put_alias(IndicesPutAliasParts::IndexName(&names, name))
            .send();
        self.execute(request, ignore)
    }

    fn get_alias(&self, index: &str, ignore: &[u16]) -> ClusterResult<Value> {
        let names = [index];
        let indices = self.client.indices();
        let request = indices
            .get_alias(IndicesGetAliasParts::Index(&names))
            .send();
        self.execute(request, ignore)
    }

    fn put_template(&self, name: &str, body: &Value, ignore: &[u16]) -> ClusterResult<Value> {
        let indices = self.client.indices();
        let request = indices
            .put_template(IndicesPutTemplateParts::Name(name))
            .body(body)
            .send();
        self.execute(request, ignore)
    }

    fn delete_index(&self, index: &str, ignore: &[u16]) -> ClusterResult<Value> {
        let names = [index];
        let indices = self.client.indices();
        let request = indices
            .delete(IndicesDeleteParts::Index(&names))
            .send();
        self.execute(request, ignore)
    }

    fn info(&self) -> ClusterResult<Value> {
        self.execute(self.client.info().send(), &[])
    }

    fn flush(&self, index: &str) -> ClusterResult<Value> {
        let names = [index];
        let indices = self.client.indices();
        let request = indices
            .flush(IndicesFlushParts::Index(&names))
            .wait_if_ongoing(true)
            .send();
        self.execute(request, &[])
    }

    fn refresh(&self, index: &str) -> ClusterResult<Value> {
        let names = [index];
        let indices = self.client.indices();
        let request = indices
            .refresh(IndicesRefreshParts::Index(&names))
            .send();
        self.execute(request, &[])
    }

    fn cluster_health(&self, status: HealthStatus, timeout: Duration) -> ClusterResult<Value> {
        let timeout_param = format!("{}ms", timeout.as_millis());
        let cluster = self.client.cluster();
        let request = cluster
            .health(ClusterHealthParts::None)
            .wait_for_status(wait_for_status(status))
            .timeout(&timeout_param)
            .request_timeout(timeout)
            .send();
        self.execute(request, &[])
    }
}
