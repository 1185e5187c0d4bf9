// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Node label keys written by the controller
pub mod labels {
    /// Prefix of every policy-owned label key: `<PREFIX>.<policy>/...`
    pub const MANAGED_BY_PREFIX: &str = "nlp.lento.dev";
    /// Value of the ownership marker label
    pub const MANAGED_BY_VALUE: &str = "true";
}

/// Finalizer placed on every NodeLabelPolicy before its labels are applied
pub const FINALIZER: &str = "nlp.lento.dev/finalizer";

/// The controller name used for field management and logging
pub const OPERATOR_NAME: &str = "node-label-controller";

/// Requeue configuration
pub mod requeue {
    /// Delay before the next pass after a successful reconciliation
    pub const RECONCILE_INTERVAL_SECS: u64 = 300;
    /// Delay before retrying a pass that failed with a transient error
    pub const ERROR_REQUEUE_SECS: u64 = 60;
}

/// CRD polling configuration
pub mod crd {
    /// API group of the NodeLabelPolicy CRD
    pub const GROUP: &str = "nlp.lento.dev";
    /// Served version of the NodeLabelPolicy CRD
    pub const VERSION: &str = "v1alpha1";
    /// Kind of the NodeLabelPolicy CRD
    pub const KIND: &str = "NodeLabelPolicy";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
