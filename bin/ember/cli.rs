// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Ember.

// Ember is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ember is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ember.  If not, see <http://www.gnu.org/licenses/>.

//! Command line definition.

use clap::{App, Arg};

/// Raw command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Chain preset name.
    pub chain: Option<String>,
    /// Path to a TOML config file.
    pub config: Option<String>,
    /// JSON-RPC listen interface.
    pub jsonrpc_interface: Option<String>,
    /// JSON-RPC listen port.
    pub jsonrpc_port: Option<u16>,
    /// Engine API listen port.
    pub engine_port: Option<u16>,
    /// Minimal pool gas price.
    pub min_gas_price: Option<u64>,
    /// Pool capacity.
    pub pool_limit: Option<usize>,
    /// Logging directives.
    pub logging: Option<String>,
    /// Disable colour output.
    pub no_color: bool,
}

/// Parse the process arguments.
pub fn parse() -> Args {
    let matches = App::new("ember")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ember: a staged-sync Ethereum execution client")
        .arg(
            Arg::with_name("chain")
                .long("chain")
                .takes_value(true)
                .help("Chain preset: test or test-pos"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::with_name("jsonrpc-interface")
                .long("jsonrpc-interface")
                .takes_value(true)
                .help("Interface the JSON-RPC server binds to"),
        )
        .arg(
            Arg::with_name("jsonrpc-port")
                .long("jsonrpc-port")
                .takes_value(true)
                .help("Port of the JSON-RPC server"),
        )
        .arg(
            Arg::with_name("engine-port")
                .long("engine-port")
                .takes_value(true)
                .help("Port of the Engine API server"),
        )
        .arg(
            Arg::with_name("min-gas-price")
                .long("min-gas-price")
                .takes_value(true)
                .help("Lowest gas price the pool admits"),
        )
        .arg(
            Arg::with_name("pool-limit")
                .long("pool-limit")
                .takes_value(true)
                .help("Transaction pool capacity"),
        )
        .arg(
            Arg::with_name("logging")
                .short("l")
                .long("logging")
                .takes_value(true)
                .help("Logging directives, e.g. sync=debug,txpool=trace"),
        )
        .arg(
            Arg::with_name("no-color")
                .long("no-color")
                .help("Disable coloured log output"),
        )
        .get_matches();

    Args {
        chain: matches.value_of("chain").map(str::to_owned),
        config: matches.value_of("config").map(str::to_owned),
        jsonrpc_interface: matches.value_of("jsonrpc-interface").map(str::to_owned),
        jsonrpc_port: matches
            .value_of("jsonrpc-port")
            .and_then(|v| v.parse().ok()),
        engine_port: matches.value_of("engine-port").and_then(|v| v.parse().ok()),
        min_gas_price: matches
            .value_of("min-gas-price")
            .and_then(|v| v.parse().ok()),
        pool_limit: matches.value_of("pool-limit").and_then(|v| v.parse().ok()),
        logging: matches.value_of("logging").map(str::to_owned),
        no_color: matches.is_present("no-color"),
    }
}
