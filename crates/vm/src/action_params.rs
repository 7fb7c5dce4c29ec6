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

//! Evm input params.

use std::sync::Arc;

use ethereum_types::{Address, U256};
use parity_bytes::Bytes;

/// The kind of frame being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// An ordinary message call.
    Call,
    /// A contract creation.
    Create,
}

impl Default for CallKind {
    fn default() -> Self {
        CallKind::Call
    }
}

/// Action (call/create) input params.
#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    /// Address of the account this frame executes as.
    pub address: Address,
    /// Immediate caller.
    pub sender: Address,
    /// Transaction originator.
    pub origin: Address,
    /// Gas available to the frame.
    pub gas: U256,
    /// Effective gas price of the originating transaction.
    pub gas_price: U256,
    /// Value transferred into the frame.
    pub value: U256,
    /// Code being executed, when any.
    pub code: Option<Arc<Bytes>>,
    /// Input data.
    pub data: Option<Bytes>,
    /// Frame kind.
    pub kind: CallKind,
}
