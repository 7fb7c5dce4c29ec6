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

//! Typed configuration assembled from the command line and the optional
//! TOML file. Command-line values win.

use std::{fs, net::SocketAddr};

use embercore::Spec;
use embercore_miner::Options as PoolOptions;
use serde_derive::Deserialize;

use crate::cli::Args;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct TomlFile {
    chain: Option<String>,
    rpc: Option<TomlRpc>,
    pool: Option<TomlPool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct TomlRpc {
    interface: Option<String>,
    port: Option<u16>,
    engine_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct TomlPool {
    limit: Option<usize>,
    min_gas_price: Option<u64>,
}

/// Everything the runner needs to start the node.
pub struct Configuration {
    /// Chain specification.
    pub spec: Spec,
    /// JSON-RPC listen address.
    pub rpc_addr: SocketAddr,
    /// Engine API listen address.
    pub engine_addr: SocketAddr,
    /// Pool limits.
    pub pool: PoolOptions,
    /// Logger settings.
    pub logger: ember_logger::Config,
}

impl Configuration {
    /// Merge the argument set with the optional config file.
    pub fn from_args(args: &Args) -> Result<Configuration, String> {
        let file: TomlFile = match args.config {
            Some(ref path) => {
                let raw = fs::read_to_string(path)
                    .map_err(|e| format!("cannot read config file {}: {}", path, e))?;
                toml::from_str(&raw).map_err(|e| format!("invalid config file: {}", e))?
            }
            None => TomlFile::default(),
        };

        let chain = args
            .chain
            .clone()
            .or_else(|| file.chain.clone())
            .unwrap_or_else(|| "test-pos".into());
        let spec = match chain.as_str() {
            "test" => Spec::new_test(),
            "test-pos" => Spec::new_test_pos(),
            other => return Err(format!("unknown chain preset: {}", other)),
        };

        let file_rpc = file.rpc.unwrap_or_default();
        let interface = args
            .jsonrpc_interface
            .clone()
            .or(file_rpc.interface)
            .unwrap_or_else(|| "127.0.0.1".into());
        let rpc_port = args.jsonrpc_port.or(file_rpc.port).unwrap_or(8545);
        let engine_port = args.engine_port.or(file_rpc.engine_port).unwrap_or(8551);
        let rpc_addr = format!("{}:{}", interface, rpc_port)
            .parse()
            .map_err(|e| format!("invalid rpc address: {}", e))?;
        let engine_addr = format!("{}:{}", interface, engine_port)
            .parse()
            .map_err(|e| format!("invalid engine address: {}", e))?;

        let file_pool = file.pool.unwrap_or_default();
        let mut pool = PoolOptions::default();
        if let Some(limit) = args.pool_limit.or(file_pool.limit) {
            pool.max_count = limit;
        }
        if let Some(price) = args.min_gas_price.or(file_pool.min_gas_price) {
            pool.minimal_gas_price = price.into();
        }

        Ok(Configuration {
            spec,
            rpc_addr,
            engine_addr,
            pool,
            logger: ember_logger::Config {
                mode: args.logging.clone(),
                color: !args.no_color,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_pos_test_chain() {
        let configuration = Configuration::from_args(&Args::default()).unwrap();
        assert_eq!(configuration.spec.name, "test-pos");
        assert_eq!(configuration.rpc_addr.port(), 8545);
        assert_eq!(configuration.engine_addr.port(), 8551);
    }

    #[test]
    fn cli_beats_defaults() {
        let args = Args {
            chain: Some("test".into()),
            jsonrpc_port: Some(9000),
            min_gas_price: Some(5),
            ..Default::default()
        };
        let configuration = Configuration::from_args(&args).unwrap();
        assert_eq!(configuration.spec.name, "test");
        assert_eq!(configuration.rpc_addr.port(), 9000);
        assert_eq!(configuration.pool.minimal_gas_price, 5.into());
    }

    #[test]
    fn unknown_chain_is_refused() {
        let args = Args {
            chain: Some("mainnet-of-dreams".into()),
            ..Default::default()
        };
        assert!(Configuration::from_args(&args).is_err());
    }
}
