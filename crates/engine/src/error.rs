// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Connector(#[from] snapd_adapters::ConnectorError),
    #[error(transparent)]
    Wal(#[from] snapd_storage::WalError),
    #[error(transparent)]
    Config(#[from] snapd_adapters::ConfigError),
}
