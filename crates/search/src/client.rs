//! Cluster client abstraction.
//!
//! The registry never talks HTTP itself. It drives a [`SearchClient`],
//! passing along the HTTP statuses the caller chose to tolerate. A status in
//! that ignore list is treated as success and its body is returned as the
//! response, which may itself be an error payload.

use std::fmt::{self, Debug};
use std::time::Duration;

use serde_json::Value;

use crate::error::{ClusterError, ClusterResult};

/// HTTP 400, returned when an index or alias already exists.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// HTTP 404, returned when an index or alias does not exist.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Cluster health levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// All shards allocated.
    Green,
    /// All primary shards allocated.
    Yellow,
    /// Some primary shards unallocated.
    Red,
}

impl HealthStatus {
    /// Returns the name used by the cluster API.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous client for the index, alias and template APIs of a cluster.
///
/// Every call blocks until the cluster answered. Timeouts and retries are
/// the implementation's business.
pub trait SearchClient: Debug + Send + Sync {
    /// Creates `index` with the given settings/mappings body.
    fn create_index(&self, index: &str, body: &Value, ignore: &[u16]) -> ClusterResult<Value>;

    /// Binds all `indices` to the alias `name`.
    fn put_alias(&self, indices: &[String], name: &str, ignore: &[u16]) -> ClusterResult<Value>;

    /// Returns the aliases of `index`, keyed by concrete index name.
    ///
    /// When `index` is an alias the keys are the indices it points at.
    fn get_alias(&self, index: &str, ignore: &[u16]) -> ClusterResult<Value>;

    /// Creates or replaces the index template `name`.
    fn put_template(&self, name: &str, body: &Value, ignore: &[u16]) -> ClusterResult<Value>;

    /// Deletes `index`.
    fn delete_index(&self, index: &str, ignore: &[u16]) -> ClusterResult<Value>;

    /// Returns the cluster info document (`version.number`, ...).
    fn info(&self) -> ClusterResult<Value>;

    /// Flushes `index`, waiting for an ongoing flush to finish.
    fn flush(&self, index: &str) -> ClusterResult<Value>;

    /// Refreshes `index`.
    fn refresh(&self, index: &str) -> ClusterResult<Value>;

    /// Waits until the cluster reaches `status` or `timeout` elapses.
    fn cluster_health(&self, status: HealthStatus, timeout: Duration) -> ClusterResult<Value>;
}

/// Turns an HTTP status and body into a client result.
///
/// Successful statuses and statuses listed in `ignore` yield the decoded
/// body (`null` when empty). Anything else is a [`ClusterError::Status`].
pub fn interpret_response(status: u16, body: &str, ignore: &[u16]) -> ClusterResult<Value> {
    let success = (200..300).contains(&status);
    if !success && !ignore.contains(&status) {
        return Err(ClusterError::Status {
            status,
            body: body.to_string(),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(body).map_err(|e| ClusterError::Decode {
        message: e.to_string(),
    })
}
