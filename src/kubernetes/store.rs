// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read and write access to Nodes and NodeLabelPolicies

use crate::constants::OPERATOR_NAME;
use crate::error::{ControllerError, Result};
use crate::types::{NodeLabelPolicy, NodeLabelPolicyStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::{
    api::{ListParams, Patch, PatchParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

/// Operations the labeling core needs from the cluster.
///
/// Writes replace whole objects and carry the `resourceVersion` they were
/// read with, so a concurrent modification surfaces as
/// [`ControllerError::WriteConflict`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Get a policy by name, `None` when it no longer exists
    async fn get_policy(&self, name: &str) -> Result<Option<NodeLabelPolicy>>;

    /// List every node in the cluster
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Replace a node, returning the stored object
    async fn update_node(&self, node: &Node) -> Result<Node>;

    /// Replace a policy (metadata and spec), returning the stored object
    async fn update_policy(&self, policy: &NodeLabelPolicy) -> Result<NodeLabelPolicy>;

    /// Write the status subresource of a policy
    async fn update_policy_status(&self, name: &str, status: &NodeLabelPolicyStatus) -> Result<()>;
}

/// [`FleetStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeFleetStore {
    nodes: Api<Node>,
    policies: Api<NodeLabelPolicy>,
}

impl KubeFleetStore {
    pub fn new(client: Client) -> Self {
        Self {
            nodes: Api::all(client.clone()),
            policies: Api::all(client),
        }
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl FleetStore for KubeFleetStore {
    #[instrument(skip(self))]
    async fn get_policy(&self, name: &str) -> Result<Option<NodeLabelPolicy>> {
        self.policies
            .get_opt(name)
            .await
            .map_err(|e| ControllerError::read(format!("NodeLabelPolicy {}", name), e))
    }

    #[instrument(skip(self))]
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let list = self
            .nodes
            .list(&ListParams::default())
            .await
            .map_err(|e| ControllerError::read("nodes", e))?;
        debug!("Listed {} nodes", list.items.len());
        Ok(list.items)
    }

    #[instrument(skip(self, node), fields(node = %node.name_any()))]
    async fn update_node(&self, node: &Node) -> Result<Node> {
        let name = node.name_any();
        self.nodes
            .replace(&name, &post_params(), node)
            .await
            .map_err(|e| ControllerError::write(format!("node {}", name), e))
    }

    #[instrument(skip(self, policy), fields(policy = %policy.name_any()))]
    async fn update_policy(&self, policy: &NodeLabelPolicy) -> Result<NodeLabelPolicy> {
        let name = policy.name_any();
        self.policies
            .replace(&name, &post_params(), policy)
            .await
            .map_err(|e| ControllerError::write(format!("NodeLabelPolicy {}", name), e))
    }

    #[instrument(skip(self, status))]
    async fn update_policy_status(&self, name: &str, status: &NodeLabelPolicyStatus) -> Result<()> {
        let patch = serde_json::json!({ "status": status });
        let pp = PatchParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        self.policies
            .patch_status(name, &pp, &Patch::Merge(&patch))
            .await
            .map_err(|e| ControllerError::write(format!("NodeLabelPolicy {} status", name), e))?;
        Ok(())
    }
}
