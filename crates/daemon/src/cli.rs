// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface: a flat set of flags for a single long-running
//! process, not a subcommand tree (there is no separate client process
//! to address).

use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

#[derive(Debug, Parser)]
#[command(name = "snaptool", version = VERSION, about = "Clustered filesystem snapshot scheduling daemon")]
pub struct Cli {
    /// Path to the snaptool TOML configuration document.
    #[arg(short = 'c', long = "configfile", default_value = "snaptool.toml")]
    pub configfile: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). Repeatable.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Connect to the configured cluster once, report the result, and exit.
    #[arg(long = "test-connection-only")]
    pub test_connection_only: bool,

    /// Override the status UI's HTTP port from the config file. 0 disables it.
    #[arg(short = 'p', long = "http-port")]
    pub http_port: Option<u16>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
