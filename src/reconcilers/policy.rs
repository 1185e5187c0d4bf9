// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! NodeLabelPolicy reconciler - keeps the selected nodes labeled and cleans up on deletion.

use crate::config::Config;
use crate::constants::FINALIZER;
use crate::error::{ControllerError, Result};
use crate::kubernetes::FleetStore;
use crate::labeling::{
    apply_labels_to_node, cleanup_labels_from_all_nodes, remove_labels_from_unselected_nodes,
    select_nodes,
};
use crate::types::{NodeLabelPolicy, NodeLabelPolicyStatus};
use chrono::Utc;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::{watcher, Config as WatcherConfig};
use kube_runtime::{reflector, WatchStreamExt};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle state of a policy as seen at the start of a pass
#[derive(Debug)]
pub enum PolicyState {
    /// The policy record no longer exists
    Gone,
    /// The policy exists but does not carry the finalizer yet
    Untracked(NodeLabelPolicy),
    /// The policy exists and carries the finalizer
    Tracked(NodeLabelPolicy),
    /// Deletion was requested; labels must be removed before the record goes away
    Terminating(NodeLabelPolicy),
}

impl PolicyState {
    pub fn of(policy: Option<NodeLabelPolicy>) -> Self {
        match policy {
            None => PolicyState::Gone,
            Some(p) if p.is_deleting() => PolicyState::Terminating(p),
            Some(p) if p.has_finalizer() => PolicyState::Tracked(p),
            Some(p) => PolicyState::Untracked(p),
        }
    }
}

/// What the caller should do after a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Run again after the given delay
    Requeue(Duration),
    /// Nothing left to do for this policy until it changes
    Done,
}

impl From<PassOutcome> for Action {
    fn from(outcome: PassOutcome) -> Self {
        match outcome {
            PassOutcome::Requeue(after) => Action::requeue(after),
            PassOutcome::Done => Action::await_change(),
        }
    }
}

pub struct PolicyReconciler {
    store: Arc<dyn FleetStore>,
    config: Config,
}

impl PolicyReconciler {
    pub fn new(store: Arc<dyn FleetStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Watch all NodeLabelPolicies, and re-run every policy on any Node change.
    ///
    /// Policy events are filtered through [`policy_change_hash`], so the
    /// status written at the end of a pass does not trigger the next one.
    pub async fn run(self, client: Client) -> anyhow::Result<()> {
        let policies: Api<NodeLabelPolicy> = Api::all(client.clone());
        let nodes: Api<Node> = Api::all(client);
        let context = Arc::new(self);

        let (reader, writer) = reflector::store();
        let policy_events = watcher(policies, WatcherConfig::default())
            .default_backoff()
            .reflect(writer)
            .applied_objects()
            .predicate_filter(policy_change_hash);

        let controller = Controller::for_stream(policy_events, reader);
        let known_policies = controller.store();

        controller
            .watches(nodes, WatcherConfig::default(), move |node: Node| {
                let policies = known_policies.state();
                let refs = policies_for_node_event(policies.iter().map(|p| &**p));
                debug!(
                    "Node {} changed, re-reconciling {} policies",
                    node.name_any(),
                    refs.len()
                );
                refs
            })
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled policy: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Run one pass for the named policy.
    ///
    /// Errors abort the pass where they occur; nothing already written is undone.
    #[instrument(skip(self))]
    pub async fn reconcile_policy(&self, name: &str) -> Result<PassOutcome> {
        match PolicyState::of(self.store.get_policy(name).await?) {
            PolicyState::Gone => {
                info!("NodeLabelPolicy not found, cleaning up labels from all nodes");
                cleanup_labels_from_all_nodes(&*self.store, name, &BTreeMap::new()).await?;
                Ok(PassOutcome::Done)
            }
            PolicyState::Terminating(policy) => {
                self.finalize(policy).await?;
                Ok(PassOutcome::Done)
            }
            PolicyState::Untracked(policy) => {
                let policy = self.add_finalizer(policy).await?;
                self.apply(&policy).await
            }
            PolicyState::Tracked(policy) => self.apply(&policy).await,
        }
    }

    async fn add_finalizer(&self, mut policy: NodeLabelPolicy) -> Result<NodeLabelPolicy> {
        info!("Adding finalizer");
        policy.finalizers_mut().push(FINALIZER.to_string());
        self.store.update_policy(&policy).await
    }

    /// Remove the policy's labels everywhere, then release the finalizer.
    async fn finalize(&self, mut policy: NodeLabelPolicy) -> Result<()> {
        let name = policy.name_any();
        info!("NodeLabelPolicy is being deleted, cleaning up labels");
        cleanup_labels_from_all_nodes(&*self.store, &name, &policy.spec.labels).await?;

        if policy.has_finalizer() {
            policy.finalizers_mut().retain(|f| f != FINALIZER);
            self.store.update_policy(&policy).await?;
            info!("Removed finalizer");
        }
        Ok(())
    }

    /// Normal pass: label the selected nodes, unlabel the rest, record status.
    async fn apply(&self, policy: &NodeLabelPolicy) -> Result<PassOutcome> {
        let name = policy.name_any();
        let strategy = &policy.spec.strategy;
        info!(
            "Reconciling NodeLabelPolicy with strategy {} (count {})",
            strategy.strategy_type, strategy.count
        );

        let nodes = self.store.list_nodes().await?;
        let selected = select_nodes(&nodes, strategy)?;

        debug!(
            "Node selection: strategy={} count={} total_nodes={} selected={}",
            strategy.strategy_type,
            strategy.count,
            nodes.len(),
            selected.len()
        );
        for (i, node) in selected.iter().enumerate() {
            debug!(
                "Selected node #{}: {} (created {})",
                i,
                node.name_any(),
                node.metadata
                    .creation_timestamp
                    .as_ref()
                    .map(|t| t.0.to_rfc3339())
                    .unwrap_or_default()
            );
        }

        let managed_by_key = policy.managed_by_label_key();
        for node in &selected {
            apply_labels_to_node(&*self.store, node, &policy.spec.labels, &managed_by_key)
                .await?;
        }
        remove_labels_from_unselected_nodes(
            &*self.store,
            &nodes,
            &selected,
            &managed_by_key,
            &policy.spec.labels,
        )
        .await?;

        let status = NodeLabelPolicyStatus {
            selected_nodes: selected.iter().map(|n| n.name_any()).collect(),
            last_reconcile_time: Some(Time(Utc::now())),
        };
        self.store.update_policy_status(&name, &status).await?;

        info!(
            "Successfully reconciled NodeLabelPolicy, selected nodes: {:?}",
            status.selected_nodes
        );
        Ok(PassOutcome::Requeue(self.config.reconcile_interval))
    }
}

/// Hash of the policy fields that warrant a new pass: identity, spec
/// generation, deletion request and finalizers. Status and resource version
/// are left out.
pub fn policy_change_hash(policy: &NodeLabelPolicy) -> Option<u64> {
    let mut hasher = DefaultHasher::new();
    policy.metadata.uid.hash(&mut hasher);
    policy.metadata.generation.hash(&mut hasher);
    policy.metadata.deletion_timestamp.is_some().hash(&mut hasher);
    policy.finalizers().hash(&mut hasher);
    Some(hasher.finish())
}

/// Every known policy must be re-evaluated when any node changes
pub fn policies_for_node_event<'a>(
    policies: impl IntoIterator<Item = &'a NodeLabelPolicy>,
) -> Vec<ObjectRef<NodeLabelPolicy>> {
    policies.into_iter().map(ObjectRef::from_obj).collect()
}

async fn reconcile(policy: Arc<NodeLabelPolicy>, ctx: Arc<PolicyReconciler>) -> Result<Action> {
    ctx.reconcile_policy(&policy.name_any()).await.map(Action::from)
}

fn error_policy(
    policy: Arc<NodeLabelPolicy>,
    error: &ControllerError,
    ctx: Arc<PolicyReconciler>,
) -> Action {
    error!("Reconciliation of {} failed: {}", policy.name_any(), error);
    if error.is_retryable() {
        Action::requeue(ctx.config.error_requeue)
    } else {
        Action::await_change()
    }
}
