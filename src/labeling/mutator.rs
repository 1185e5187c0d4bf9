// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label writes for selected and unselected nodes

use crate::constants::labels::MANAGED_BY_VALUE;
use crate::error::Result;
use crate::kubernetes::FleetStore;
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument};

/// Whether a node carries the given ownership marker
pub fn is_managed_by(node: &Node, managed_by_key: &str) -> bool {
    node.labels()
        .get(managed_by_key)
        .is_some_and(|v| v == MANAGED_BY_VALUE)
}

/// Merge the desired labels and the marker into a node's labels.
/// Returns false when every label already had the wanted value.
fn merge_desired_labels(
    node: &mut Node,
    desired: &BTreeMap<String, String>,
    managed_by_key: &str,
) -> bool {
    let labels = node.labels_mut();
    let mut changed = false;
    let wanted = desired
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(std::iter::once((managed_by_key, MANAGED_BY_VALUE)));
    for (key, value) in wanted {
        if labels.get(key).map(String::as_str) != Some(value) {
            labels.insert(key.to_string(), value.to_string());
            changed = true;
        }
    }
    changed
}

/// Apply the desired labels and the ownership marker to a selected node.
///
/// Existing values are overwritten. The node is only written when something
/// changed, so a converged pass issues no writes.
#[instrument(skip(store, node, desired), fields(node = %node.name_any()))]
pub async fn apply_labels_to_node(
    store: &dyn FleetStore,
    node: &Node,
    desired: &BTreeMap<String, String>,
    managed_by_key: &str,
) -> Result<()> {
    let mut updated = node.clone();
    if !merge_desired_labels(&mut updated, desired, managed_by_key) {
        debug!("Node already carries the desired labels");
        return Ok(());
    }

    store.update_node(&updated).await?;
    info!("Applied {} labels to node", desired.len());
    Ok(())
}

/// Remove the marker and the declared label keys from every owned node
/// that is no longer selected.
///
/// Nodes without the marker are never written. The first failed write aborts
/// the pass; nodes already stripped stay stripped.
#[instrument(skip_all, fields(managed_by = %managed_by_key))]
pub async fn remove_labels_from_unselected_nodes(
    store: &dyn FleetStore,
    all_nodes: &[Node],
    selected: &[Node],
    managed_by_key: &str,
    declared: &BTreeMap<String, String>,
) -> Result<()> {
    let selected_names: HashSet<String> = selected.iter().map(|n| n.name_any()).collect();

    for node in all_nodes {
        if selected_names.contains(&node.name_any()) || !is_managed_by(node, managed_by_key) {
            continue;
        }

        let mut updated = node.clone();
        let labels = updated.labels_mut();
        labels.remove(managed_by_key);
        for key in declared.keys() {
            labels.remove(key);
        }

        store.update_node(&updated).await?;
        info!("Removed policy labels from unselected node {}", node.name_any());
    }

    Ok(())
}
