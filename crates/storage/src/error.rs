// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("failed to open intent log at {path}: {source}")]
    Open { path: String, #[source] source: std::io::Error },
    #[error("failed to write intent record: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to rotate intent log: {0}")]
    Rotate(#[source] std::io::Error),
    #[error("failed to read intent log: {0}")]
    Read(#[source] std::io::Error),
}
