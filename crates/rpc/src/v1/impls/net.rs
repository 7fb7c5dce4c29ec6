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

//! Net rpc implementation.

use std::sync::Arc;

use embercore::Client;
use ethereum_types::U256;
use jsonrpc_core::Result;

use crate::v1::traits::Net;

/// Net rpc implementation.
pub struct NetClient {
    client: Arc<Client>,
}

impl NetClient {
    /// New net handler.
    pub fn new(client: Arc<Client>) -> Self {
        NetClient { client }
    }
}

impl Net for NetClient {
    fn version(&self) -> Result<String> {
        Ok(format!("{}", self.client.spec().params.network_id))
    }

    fn peer_count(&self) -> Result<U256> {
        // block exchange currently happens through the Engine API only
        Ok(U256::zero())
    }

    fn is_listening(&self) -> Result<bool> {
        Ok(true)
    }
}
