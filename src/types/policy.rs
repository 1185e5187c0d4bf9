// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::labels::MANAGED_BY_PREFIX;
use crate::constants::FINALIZER;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of a NodeLabelPolicy
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(
    group = "nlp.lento.dev",
    version = "v1alpha1",
    kind = "NodeLabelPolicy",
    plural = "nodelabelpolicies"
)]
#[kube(status = "NodeLabelPolicyStatus")]
#[kube(printcolumn = r#"{"name":"Strategy","type":"string","jsonPath":".spec.strategy.type"}"#)]
#[kube(printcolumn = r#"{"name":"Count","type":"integer","jsonPath":".spec.strategy.count"}"#)]
#[serde(rename_all = "camelCase")]
pub struct NodeLabelPolicySpec {
    /// How nodes are picked for labeling
    pub strategy: NodeLabelPolicyStrategy,
    /// Labels applied to every selected node
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeLabelPolicyStrategy {
    /// One of `oldest`, `newest` or `random`
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Number of nodes to select
    #[schemars(range(min = 1))]
    pub count: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeLabelPolicyStatus {
    /// Nodes carrying this policy's labels after the last successful pass.
    /// Always serialized so that an empty selection clears a previous one.
    #[serde(default)]
    pub selected_nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reconcile_time: Option<Time>,
}

impl NodeLabelPolicy {
    /// Ownership marker label key: `<prefix>.<policy>/managed-by`
    pub fn managed_by_label_key(&self) -> String {
        managed_by_label_key(&self.name_any())
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == FINALIZER)
    }

    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}

/// Ownership marker label key for a policy name
pub fn managed_by_label_key(policy_name: &str) -> String {
    format!("{}managed-by", policy_label_prefix(policy_name))
}

/// Prefix shared by every label key a policy may own: `<prefix>.<policy>/`
pub fn policy_label_prefix(policy_name: &str) -> String {
    format!("{}.{}/", MANAGED_BY_PREFIX, policy_name)
}
