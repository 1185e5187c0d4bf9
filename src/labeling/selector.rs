// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node selection strategies

use crate::error::{ControllerError, Result};
use crate::labeling::readiness::filter_ready_nodes;
use crate::types::NodeLabelPolicyStrategy;
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordering rule applied to ready nodes before truncating to the requested count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Earliest creation time first
    Oldest,
    /// Latest creation time first
    Newest,
    /// Fresh uniform shuffle on every pass
    Random,
}

impl FromStr for SelectionStrategy {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "oldest" => Ok(SelectionStrategy::Oldest),
            "newest" => Ok(SelectionStrategy::Newest),
            "random" => Ok(SelectionStrategy::Random),
            other => Err(ControllerError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionStrategy::Oldest => "oldest",
            SelectionStrategy::Newest => "newest",
            SelectionStrategy::Random => "random",
        })
    }
}

/// Select nodes for a policy, shuffling with the thread-local RNG for `random`
pub fn select_nodes(nodes: &[Node], strategy: &NodeLabelPolicyStrategy) -> Result<Vec<Node>> {
    select_nodes_with_rng(nodes, strategy, &mut rand::thread_rng())
}

/// Select up to `strategy.count` ready nodes in strategy order.
///
/// An empty input, or one without ready nodes, yields an empty selection even
/// when the strategy type is not recognized.
pub fn select_nodes_with_rng<R: Rng + ?Sized>(
    nodes: &[Node],
    strategy: &NodeLabelPolicyStrategy,
    rng: &mut R,
) -> Result<Vec<Node>> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    let mut ready = filter_ready_nodes(nodes);
    if ready.is_empty() {
        return Ok(Vec::new());
    }

    match strategy.strategy_type.parse::<SelectionStrategy>()? {
        SelectionStrategy::Oldest => {
            ready.sort_by(|a, b| by_creation(a, b).then_with(|| by_name(a, b)))
        }
        SelectionStrategy::Newest => {
            ready.sort_by(|a, b| by_creation(b, a).then_with(|| by_name(a, b)))
        }
        SelectionStrategy::Random => ready.shuffle(rng),
    }

    let count = usize::try_from(strategy.count).unwrap_or(0);
    ready.truncate(count);
    Ok(ready)
}

/// Creation time ascending. A missing timestamp sorts first.
fn by_creation(a: &Node, b: &Node) -> Ordering {
    let created = |n: &Node| n.metadata.creation_timestamp.as_ref().map(|t| t.0);
    created(a).cmp(&created(b))
}

fn by_name(a: &Node, b: &Node) -> Ordering {
    a.name_any().cmp(&b.name_any())
}
