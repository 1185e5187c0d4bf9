// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster-wide removal of a policy's labels

use crate::error::Result;
use crate::kubernetes::FleetStore;
use crate::labeling::mutator::is_managed_by;
use crate::types::{managed_by_label_key, policy_label_prefix};
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Strip a policy's labels from a node's label map: the marker, every key
/// under the policy prefix, and every declared key.
pub fn strip_policy_labels(node: &mut Node, policy_name: &str, declared: &BTreeMap<String, String>) {
    let prefix = policy_label_prefix(policy_name);
    let labels = node.labels_mut();
    labels.retain(|key, _| !key.starts_with(&prefix));
    for key in declared.keys() {
        labels.remove(key);
    }
}

/// Remove every trace of a policy from the fleet.
///
/// Works without the policy record: `declared` may be empty, in which case
/// only the marker and prefixed labels are removed. Only nodes carrying the
/// marker are written. Returns the number of nodes cleaned.
#[instrument(skip(store, declared))]
pub async fn cleanup_labels_from_all_nodes(
    store: &dyn FleetStore,
    policy_name: &str,
    declared: &BTreeMap<String, String>,
) -> Result<usize> {
    let managed_by_key = managed_by_label_key(policy_name);
    let nodes = store.list_nodes().await?;

    let mut cleaned = 0;
    for node in nodes.iter().filter(|n| is_managed_by(n, &managed_by_key)) {
        let mut updated = node.clone();
        strip_policy_labels(&mut updated, policy_name, declared);
        store.update_node(&updated).await?;
        debug!("Cleaned policy labels from node {}", node.name_any());
        cleaned += 1;
    }

    info!("Cleaned labels of policy {} from {} nodes", policy_name, cleaned);
    Ok(cleaned)
}
