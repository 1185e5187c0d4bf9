// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and access to nodes and policies.

pub mod crd;
pub mod store;

pub use crd::wait_for_policy_crd;
pub use store::{FleetStore, KubeFleetStore};

#[cfg(test)]
pub use store::MockFleetStore;
