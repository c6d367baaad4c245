use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use helios_search::{ClusterError, ClusterResult, HealthStatus, SearchClient};
use serde_json::{Map, Value, json};

/// A request received by the mock cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateIndex { index: String, body: Value, ignore: Vec<u16> },
    PutAlias { indices: Vec<String>, name: String, ignore: Vec<u16> },
    GetAlias { name: String, ignore: Vec<u16> },
    PutTemplate { name: String, body: Value, ignore: Vec<u16> },
    DeleteIndex { index: String, ignore: Vec<u16> },
    Info,
    Flush { index: String },
    Refresh { index: String },
    ClusterHealth { status: HealthStatus },
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<Call>,
    /// Index name to the aliases bound to it.
    indices: BTreeMap<String, BTreeSet<String>>,
    templates: BTreeMap<String, Value>,
    /// Index or alias name whose next write fails with a 500.
    fail_on: Option<String>,
}

/// In-memory cluster that records every request.
#[derive(Debug, Clone, Default)]
pub struct MockSearchClient {
    state: Arc<Mutex<MockState>>,
}

fn status_error(status: u16, body: Value, ignore: &[u16]) -> ClusterResult<Value> {
    if ignore.contains(&status) {
        Ok(body)
    } else {
        Err(ClusterError::Status {
            status,
            body: body.to_string(),
        })
    }
}

fn acknowledged() -> Value {
    json!({"acknowledged": true})
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an existing index bound to `aliases`.
    pub fn with_index(self, index: &str, aliases: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.indices.insert(
                index.to_string(),
                aliases.iter().map(|a| (*a).to_string()).collect(),
            );
        }
        self
    }

    /// Makes the next create/alias/delete/template call on `name` fail.
    pub fn fail_on(&self, name: &str) {
        self.state.lock().unwrap().fail_on = Some(name.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn index_names(&self) -> Vec<String> {
        self.state.lock().unwrap().indices.keys().cloned().collect()
    }

    pub fn aliases_of(&self, index: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .indices
            .get(index)
            .map(|aliases| aliases.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn template(&self, name: &str) -> Option<Value> {
        self.state.lock().unwrap().templates.get(name).cloned()
    }
}

impl MockState {
    fn take_failure(&mut self, name: &str) -> bool {
        if self.fail_on.as_deref() == Some(name) {
            self.fail_on = None;
            true
        } else {
            false
        }
    }
}

fn internal_error() -> ClusterError {
    ClusterError::Status {
        status: 500,
        body: r#"{"error": "internal"}"#.to_string(),
    }
}

impl SearchClient for MockSearchClient {
    fn create_index(&self, index: &str, body: &Value, ignore: &[u16]) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateIndex {
            index: index.to_string(),
            body: body.clone(),
            ignore: ignore.to_vec(),
        });
        if state.take_failure(index) {
            return Err(internal_error());
        }
        if state.indices.contains_key(index) {
            return status_error(
                400,
                json!({
                    "error": {"type": "resource_already_exists_exception", "index": index},
                    "status": 400
                }),
                ignore,
            );
        }

        let aliases = body
            .get("aliases")
            .and_then(Value::as_object)
            .map(|aliases| aliases.keys().cloned().collect())
            .unwrap_or_default();
        state.indices.insert(index.to_string(), aliases);
        Ok(json!({"acknowledged": true, "shards_acknowledged": true, "index": index}))
    }

    fn put_alias(&self, indices: &[String], name: &str, ignore: &[u16]) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PutAlias {
            indices: indices.to_vec(),
            name: name.to_string(),
            ignore: ignore.to_vec(),
        });
        if state.take_failure(name) {
            return Err(internal_error());
        }
        if let Some(missing) = indices.iter().find(|i| !state.indices.contains_key(*i)) {
            return status_error(
                404,
                json!({
                    "error": {"type": "index_not_found_exception", "index": missing},
                    "status": 404
                }),
                ignore,
            );
        }

        for index in indices {
            if let Some(aliases) = state.indices.get_mut(index) {
                aliases.insert(name.to_string());
            }
        }
        Ok(acknowledged())
    }

    fn get_alias(&self, index: &str, ignore: &[u16]) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetAlias {
            name: index.to_string(),
            ignore: ignore.to_vec(),
        });

        // `GET /{index}/_alias` resolves concrete indices and aliases alike.
        let mut found = Map::new();
        for (name, aliases) in &state.indices {
            if name == index || aliases.contains(index) {
                let aliases: Map<String, Value> =
                    aliases.iter().map(|a| (a.clone(), json!({}))).collect();
                found.insert(name.clone(), json!({"aliases": aliases}));
            }
        }
        if found.is_empty() {
            return status_error(
                404,
                json!({
                    "error": {"type": "index_not_found_exception", "index": index},
                    "status": 404
                }),
                ignore,
            );
        }
        Ok(Value::Object(found))
    }

    fn put_template(&self, name: &str, body: &Value, ignore: &[u16]) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PutTemplate {
            name: name.to_string(),
            body: body.clone(),
            ignore: ignore.to_vec(),
        });
        if state.take_failure(name) {
            return Err(internal_error());
        }
        state.templates.insert(name.to_string(), body.clone());
        Ok(acknowledged())
    }

    fn delete_index(&self, index: &str, ignore: &[u16]) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteIndex {
            index: index.to_string(),
            ignore: ignore.to_vec(),
        });
        if state.take_failure(index) {
            return Err(internal_error());
        }
        if state.indices.remove(index).is_none() {
            return status_error(
                404,
                json!({
                    "error": {"type": "index_not_found_exception", "index": index},
                    "status": 404
                }),
                ignore,
            );
        }
        Ok(acknowledged())
    }

    fn info(&self) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Info);
        Ok(json!({
            "name": "mock",
            "version": {"number": "7.17.5", "build_flavor": "default"}
        }))
    }

    fn flush(&self, index: &str) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Flush {
            index: index.to_string(),
        });
        Ok(json!({"_shards": {"total": 1, "successful": 1, "failed": 0}}))
    }

    fn refresh(&self, index: &str) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Refresh {
            index: index.to_string(),
        });
        Ok(json!({"_shards": {"total": 1, "successful": 1, "failed": 0}}))
    }

    fn cluster_health(&self, status: HealthStatus, _timeout: Duration) -> ClusterResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ClusterHealth { status });
        Ok(json!({"status": status.as_str(), "timed_out": false}))
    }
}
