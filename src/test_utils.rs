// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses and the node fleet.

use crate::error::{ControllerError, Result};
use crate::kubernetes::FleetStore;
use crate::types::{
    NodeLabelPolicy, NodeLabelPolicySpec, NodeLabelPolicyStatus, NodeLabelPolicyStrategy,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::{Request, Response};
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "https://kubernetes.default.svc")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();
        responses
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response
                .unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a minimal Node JSON response
pub fn node_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Node",
        "metadata": {
            "name": name,
            "uid": format!("{}-uid", name),
            "resourceVersion": "100",
            "creationTimestamp": "2026-01-01T00:00:00Z"
        },
        "status": {
            "conditions": [{ "type": "Ready", "status": "True" }]
        }
    })
    .to_string()
}

/// Create a NodeLabelPolicy JSON response
pub fn policy_json(name: &str, strategy: &str, count: i32) -> String {
    serde_json::json!({
        "apiVersion": "nlp.lento.dev/v1alpha1",
        "kind": "NodeLabelPolicy",
        "metadata": {
            "name": name,
            "uid": format!("{}-uid", name),
            "resourceVersion": "7"
        },
        "spec": {
            "strategy": { "type": strategy, "count": count },
            "labels": { "env": "prod" }
        }
    })
    .to_string()
}

fn status_json(reason: &str, code: u16, message: String) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json("NotFound", 404, format!("{} \"{}\" not found", resource, name))
}

/// Create a 409 conflict response, as returned for a stale resourceVersion
pub fn conflict_json(resource: &str, name: &str) -> String {
    status_json(
        "Conflict",
        409,
        format!(
            "Operation cannot be fulfilled on {} \"{}\": the object has been modified",
            resource, name
        ),
    )
}

/// A kube API error with the given HTTP code
pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} ({})", reason, code),
        reason: reason.to_string(),
        code,
    })
}

/// Fixed reference time for node creation timestamps
pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Build a node with a single Ready condition of the given status
pub fn make_node(name: &str, created: DateTime<Utc>, ready: &str) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            creation_timestamp: Some(Time(created)),
            ..Default::default()
        },
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: ready.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn ready_node(name: &str, created: DateTime<Utc>) -> Node {
    make_node(name, created, "True")
}

pub fn with_labels(mut node: Node, labels: &[(&str, &str)]) -> Node {
    let map = node.labels_mut();
    for (k, v) in labels {
        map.insert(k.to_string(), v.to_string());
    }
    node
}

pub fn make_policy(name: &str, strategy: &str, count: i32, labels: &[(&str, &str)]) -> NodeLabelPolicy {
    NodeLabelPolicy {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: NodeLabelPolicySpec {
            strategy: NodeLabelPolicyStrategy {
                strategy_type: strategy.to_string(),
                count,
            },
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        },
        status: None,
    }
}

#[derive(Default)]
struct FleetState {
    nodes: Vec<Node>,
    policies: BTreeMap<String, NodeLabelPolicy>,
    node_writes: Vec<String>,
    policy_writes: usize,
    statuses: BTreeMap<String, NodeLabelPolicyStatus>,
    reject_node_writes: HashSet<String>,
    fail_list: bool,
}

/// In-memory fleet of nodes and policies.
///
/// Node writes are recorded in order and applied in place, so a test can
/// run several passes against the same fleet and inspect the result.
#[derive(Clone, Default)]
pub struct FakeFleetStore {
    state: Arc<Mutex<FleetState>>,
}

impl FakeFleetStore {
    pub fn new(nodes: Vec<Node>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().nodes = nodes;
        store
    }

    pub fn with_policy(self, policy: NodeLabelPolicy) -> Self {
        self.state
            .lock()
            .unwrap()
            .policies
            .insert(policy.name_any(), policy);
        self
    }

    /// Make every write to the named node fail with a 409 conflict
    pub fn reject_writes_to(&self, node: &str) {
        self.state
            .lock()
            .unwrap()
            .reject_node_writes
            .insert(node.to_string());
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn node(&self, name: &str) -> Node {
        self.state
            .lock()
            .unwrap()
            .nodes
            .iter()
            .find(|n| n.name_any() == name)
            .cloned()
            .unwrap()
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.state.lock().unwrap().nodes.clone()
    }

    pub fn labels_of(&self, name: &str) -> BTreeMap<String, String> {
        self.node(name).labels().clone()
    }

    /// Names of the nodes written so far, in write order
    pub fn node_writes(&self) -> Vec<String> {
        self.state.lock().unwrap().node_writes.clone()
    }

    pub fn policy_writes(&self) -> usize {
        self.state.lock().unwrap().policy_writes
    }

    pub fn policy(&self, name: &str) -> Option<NodeLabelPolicy> {
        self.state.lock().unwrap().policies.get(name).cloned()
    }

    pub fn status_of(&self, name: &str) -> Option<NodeLabelPolicyStatus> {
        self.state.lock().unwrap().statuses.get(name).cloned()
    }

    /// Mark a policy as being deleted, as the API server does when finalizers are present
    pub fn request_deletion(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(policy) = state.policies.get_mut(name) {
            policy.metadata.deletion_timestamp = Some(Time(base_time()));
        }
    }

    pub fn remove_policy(&self, name: &str) {
        self.state.lock().unwrap().policies.remove(name);
    }
}

#[async_trait]
impl FleetStore for FakeFleetStore {
    async fn get_policy(&self, name: &str) -> Result<Option<NodeLabelPolicy>> {
        Ok(self.state.lock().unwrap().policies.get(name).cloned())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(ControllerError::read("nodes", api_error(500, "InternalError")));
        }
        Ok(state.nodes.clone())
    }

    async fn update_node(&self, node: &Node) -> Result<Node> {
        let name = node.name_any();
        let mut state = self.state.lock().unwrap();
        if state.reject_node_writes.contains(&name) {
            return Err(ControllerError::write(
                format!("node {}", name),
                api_error(409, "Conflict"),
            ));
        }
        state.node_writes.push(name.clone());
        match state.nodes.iter_mut().find(|n| n.name_any() == name) {
            Some(stored) => *stored = node.clone(),
            None => state.nodes.push(node.clone()),
        }
        Ok(node.clone())
    }

    async fn update_policy(&self, policy: &NodeLabelPolicy) -> Result<NodeLabelPolicy> {
        let mut state = self.state.lock().unwrap();
        state.policy_writes += 1;
        let name = policy.name_any();
        // The API server drops an object once its last finalizer is gone during deletion
        if policy.metadata.deletion_timestamp.is_some() && policy.finalizers().is_empty() {
            state.policies.remove(&name);
        } else {
            state.policies.insert(name, policy.clone());
        }
        Ok(policy.clone())
    }

    async fn update_policy_status(&self, name: &str, status: &NodeLabelPolicyStatus) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(name.to_string(), status.clone());
        Ok(())
    }
}
