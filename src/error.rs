// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("unsupported strategy type: {0}")]
    UnsupportedStrategy(String),

    #[error("failed to read {target}: {source}")]
    StoreRead {
        target: String,
        #[source]
        source: kube::Error,
    },

    #[error("write conflict on {target}: {source}")]
    WriteConflict {
        target: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to update {target}: {source}")]
    StoreWrite {
        target: String,
        #[source]
        source: kube::Error,
    },
}

impl ControllerError {
    /// Wrap a failed list/get call.
    pub fn read(target: impl Into<String>, source: kube::Error) -> Self {
        ControllerError::StoreRead {
            target: target.into(),
            source,
        }
    }

    /// Wrap a failed write, separating optimistic-lock conflicts from other failures.
    pub fn write(target: impl Into<String>, source: kube::Error) -> Self {
        let target = target.into();
        match &source {
            kube::Error::Api(resp) if resp.code == 409 => {
                ControllerError::WriteConflict { target, source }
            }
            _ => ControllerError::StoreWrite { target, source },
        }
    }

    /// Whether re-running the same pass unchanged can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ControllerError::UnsupportedStrategy(_))
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
