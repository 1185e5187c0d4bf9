// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node selection and label ownership logic.

pub mod cleanup;
pub mod mutator;
pub mod readiness;
pub mod selector;

pub use cleanup::{cleanup_labels_from_all_nodes, strip_policy_labels};
pub use mutator::{apply_labels_to_node, is_managed_by, remove_labels_from_unselected_nodes};
pub use readiness::{filter_ready_nodes, is_node_ready};
pub use selector::{select_nodes, select_nodes_with_rng, SelectionStrategy};
