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

//! Ember JSON-RPC and Engine API servers.

#[macro_use]
extern crate serde_derive;

pub mod v1;

use std::net::SocketAddr;

use jsonrpc_core::IoHandler;
use jsonrpc_http_server::{Server, ServerBuilder};

/// Start an HTTP JSON-RPC server with the given handler.
pub fn start_http(addr: &SocketAddr, threads: usize, io: IoHandler) -> std::io::Result<Server> {
    ServerBuilder::new(io)
        .threads(threads)
        .start_http(addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}
