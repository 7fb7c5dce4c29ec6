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

//! Node assembly: store, client, pool, sync driver thread, RPC and Engine
//! API servers.

use std::{sync::Arc, thread};

use crossbeam_channel::unbounded;
use embercore::Client;
use embercore_kv::MemoryStore;
use embercore_miner::{Client as PoolClient, TransactionQueue};
use embercore_sync::{DriverMessage, MemorySource, Pipeline, StageError};
use ember_rpc::v1::{
    helpers::{FilterManager, PoolClientAdapter},
    impls::{EngineClient, EthClient, NetClient, Web3Client},
    traits::{Engine, Eth, Net, Web3},
};
use jsonrpc_core::IoHandler;
use log::{info, warn};

use crate::configuration::Configuration;

/// Run the node until the RPC server stops.
pub fn execute(configuration: Configuration) -> Result<(), String> {
    let _tail = ember_logger::setup_log(&configuration.logger)?;

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let client =
        Client::new(store.clone(), configuration.spec.clone()).map_err(|e| e.to_string())?;
    info!(
        "Starting Ember on chain {} (genesis {:?})",
        configuration.spec.name,
        client.block_hash(0).expect("genesis was planted; qed"),
    );

    let source = Arc::new(MemorySource::new());
    let pool = Arc::new(TransactionQueue::new(configuration.pool.clone()));
    let filters = Arc::new(FilterManager::new(client.clone()));
    let (driver_tx, driver_rx) = unbounded::<DriverMessage>();

    // the driver owns the write path; everything else reads
    let driver = {
        let mut pipeline = Pipeline::new(
            store.clone(),
            configuration.spec.clone(),
            source.clone(),
            client.sync_state(),
        );
        let pool = pool.clone();
        let pool_view = PoolClientAdapter::new(client.clone());
        thread::Builder::new()
            .name("sync".into())
            .spawn(move || {
                while let Ok(message) = driver_rx.recv() {
                    let outcome = match message {
                        DriverMessage::Forkchoice {
                            head,
                            safe,
                            finalized,
                        } => pipeline.apply_forkchoice(head, safe, finalized),
                        DriverMessage::NewBlocks => match pipeline.announced_target() {
                            Some(target) => pipeline.run_to(target),
                            None => Ok(0),
                        },
                        DriverMessage::Shutdown => break,
                    };
                    match outcome {
                        Ok(_) => pool.cull(&pool_view),
                        Err(StageError::Cancelled) => break,
                        Err(error) => warn!(target: "sync", "sync error: {}", error),
                    }
                    pool.evict_stale();
                }
            })
            .map_err(|e| format!("cannot spawn the sync thread: {}", e))?
    };

    let mut eth_io = IoHandler::new();
    eth_io.extend_with(EthClient::new(client.clone(), pool.clone(), filters.clone()).to_delegate());
    eth_io.extend_with(NetClient::new(client.clone()).to_delegate());
    eth_io.extend_with(Web3Client.to_delegate());
    let rpc_server = ember_rpc::start_http(&configuration.rpc_addr, 4, eth_io)
        .map_err(|e| format!("cannot start the JSON-RPC server: {}", e))?;
    info!("JSON-RPC server listening on {}", configuration.rpc_addr);

    let mut engine_io = IoHandler::new();
    engine_io.extend_with(
        EngineClient::new(
            client.clone(),
            source.clone(),
            driver_tx.clone(),
            pool.clone(),
        )
        .to_delegate(),
    );
    let _engine_server = ember_rpc::start_http(&configuration.engine_addr, 2, engine_io)
        .map_err(|e| format!("cannot start the Engine API server: {}", e))?;
    info!(
        "Engine API server listening on {}",
        configuration.engine_addr
    );

    rpc_server.wait();
    let _ = driver_tx.send(DriverMessage::Shutdown);
    let _ = driver.join();
    Ok(())
}
