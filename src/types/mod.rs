// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types served by the controller.

pub mod policy;

pub use policy::{
    managed_by_label_key, policy_label_prefix, NodeLabelPolicy, NodeLabelPolicySpec,
    NodeLabelPolicyStatus, NodeLabelPolicyStrategy,
};
