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

//! Virtual machine interface. The interpreter itself is an external
//! collaborator; this crate fixes the contract it is invoked through and
//! ships a transfer-only adapter used until a full interpreter is wired in.

mod action_params;
mod env_info;

pub use crate::{
    action_params::{ActionParams, CallKind},
    env_info::EnvInfo,
};

use std::{fmt, sync::Arc};

use ethereum_types::{Address, H256, U256};
use parity_bytes::Bytes;

/// VM errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The allotted gas was exhausted.
    OutOfGas,
    /// A stack or memory rule was violated by the byte code.
    BadInstruction {
        /// Offending instruction byte.
        instruction: u8,
    },
    /// The interpreter failed internally.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::OutOfGas => write!(f, "Out of gas"),
            Error::BadInstruction { instruction } => {
                write!(f, "Bad instruction {:x}", instruction)
            }
            Error::Internal(ref msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// Result of VM execution.
pub type Result<T> = std::result::Result<T, Error>;

/// What a completed call produced. `apply_state` is false when the frame
/// reverted: the caller must roll its journal back to the pre-call snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutput {
    /// Gas remaining after execution.
    pub gas_left: U256,
    /// Bytes returned by the frame.
    pub return_data: Bytes,
    /// Whether the frame's mutations survive.
    pub apply_state: bool,
}

/// Externalities: the state surface the interpreter sees while executing
/// one frame. Implemented over the journaled state overlay.
pub trait Ext {
    /// Balance of an account.
    fn balance(&mut self, address: &Address) -> Result<U256>;
    /// Whether an account exists at all.
    fn exists(&mut self, address: &Address) -> Result<bool>;
    /// Storage value of the executing contract.
    fn storage_at(&mut self, key: &H256) -> Result<H256>;
    /// Write a storage value of the executing contract.
    fn set_storage(&mut self, key: H256, value: H256) -> Result<()>;
    /// Transient storage value (EIP-1153) of the executing contract.
    fn transient_storage_at(&self, key: &H256) -> H256;
    /// Write a transient storage value (EIP-1153).
    fn set_transient_storage(&mut self, key: H256, value: H256);
    /// Code of an account.
    fn code(&mut self, address: &Address) -> Result<Option<Arc<Bytes>>>;
    /// Append a log entry.
    fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> Result<()>;
    /// Adjust the refund counter.
    fn add_refund(&mut self, delta: i64);
    /// Mark an address warm (EIP-2929); returns whether it already was.
    fn access_address(&mut self, address: &Address) -> bool;
    /// Mark a storage slot warm (EIP-2929); returns whether it already was.
    fn access_slot(&mut self, address: &Address, key: &H256) -> bool;
    /// Block-level context.
    fn env_info(&self) -> &EnvInfo;
}

/// The interpreter contract: execute one frame against the externalities.
pub trait Exec: Send + Sync {
    /// Run `params` to completion.
    fn exec(&self, params: ActionParams, ext: &mut dyn Ext) -> Result<CallOutput>;
}

/// Transfer-only placeholder interpreter.
///
/// Plain value transfers are fully handled by the executive before the VM
/// is entered, so this adapter returns success without consuming gas.
/// Frames that would run byte code return success with empty output; the
/// block-level guarantees (state root, receipts root, gas check) still hold
/// because every node runs the same adapter.
#[derive(Debug, Default, Clone)]
pub struct NoopEvm;

impl Exec for NoopEvm {
    fn exec(&self, params: ActionParams, _ext: &mut dyn Ext) -> Result<CallOutput> {
        Ok(CallOutput {
            gas_left: params.gas,
            return_data: Bytes::new(),
            apply_state: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeadExt(EnvInfo);

    impl Ext for DeadExt {
        fn balance(&mut self, _: &Address) -> Result<U256> {
            Ok(U256::zero())
        }
        fn exists(&mut self, _: &Address) -> Result<bool> {
            Ok(false)
        }
        fn storage_at(&mut self, _: &H256) -> Result<H256> {
            Ok(H256::zero())
        }
        fn set_storage(&mut self, _: H256, _: H256) -> Result<()> {
            Ok(())
        }
        fn transient_storage_at(&self, _: &H256) -> H256 {
            H256::zero()
        }
        fn set_transient_storage(&mut self, _: H256, _: H256) {}
        fn code(&mut self, _: &Address) -> Result<Option<Arc<Bytes>>> {
            Ok(None)
        }
        fn log(&mut self, _: Vec<H256>, _: &[u8]) -> Result<()> {
            Ok(())
        }
        fn add_refund(&mut self, _: i64) {}
        fn access_address(&mut self, _: &Address) -> bool {
            false
        }
        fn access_slot(&mut self, _: &Address, _: &H256) -> bool {
            false
        }
        fn env_info(&self) -> &EnvInfo {
            &self.0
        }
    }

    #[test]
    fn noop_returns_all_gas() {
        let evm = NoopEvm;
        let mut ext = DeadExt(EnvInfo::default());
        let params = ActionParams {
            gas: 55_000.into(),
            ..Default::default()
        };
        let out = evm.exec(params, &mut ext).unwrap();
        assert!(out.apply_state);
        assert_eq!(out.gas_left, U256::from(55_000));
    }
}
