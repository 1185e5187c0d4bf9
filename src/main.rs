// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use node_label_controller::config::{Config, LogLevel};
use node_label_controller::kubernetes::{wait_for_policy_crd, KubeFleetStore};
use node_label_controller::reconcilers::PolicyReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing, RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.log_level.level_filter().into()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(invalid) = &config.invalid_log_level {
        error!(
            "Invalid LOG_LEVEL '{}', supported: {}; using {}",
            invalid,
            LogLevel::supported(),
            config.log_level
        );
    }

    info!("Starting node label controller");
    info!(
        "Configuration loaded: reconcile_interval={:?}, error_requeue={:?}",
        config.reconcile_interval, config.error_requeue
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for NodeLabelPolicy CRD to become available...");
    wait_for_policy_crd(&client).await?;

    let store = Arc::new(KubeFleetStore::new(client.clone()));
    let reconciler = PolicyReconciler::new(store, config);

    info!("Starting NodeLabelPolicy reconciler...");
    reconciler.run(client).await?;

    warn!("NodeLabelPolicy reconciler stopped");
    Ok(())
}
