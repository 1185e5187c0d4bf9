// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node readiness checks

use k8s_openapi::api::core::v1::Node;

/// Check if a node is ready based on its status conditions.
///
/// The first `Ready` condition decides; a node without one is not ready.
pub fn is_node_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .is_some_and(|c| c.status == "True")
}

/// Keep only ready nodes, preserving their relative order
pub fn filter_ready_nodes(nodes: &[Node]) -> Vec<Node> {
    nodes.iter().filter(|n| is_node_ready(n)).cloned().collect()
}
