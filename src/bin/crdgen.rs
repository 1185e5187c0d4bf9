// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prints the NodeLabelPolicy CRD manifest as YAML.

use kube::CustomResourceExt;
use node_label_controller::types::NodeLabelPolicy;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&NodeLabelPolicy::crd())?);
    Ok(())
}
