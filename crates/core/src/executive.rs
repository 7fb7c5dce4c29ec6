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

//! Transaction execution: validity checks, gas purchase, the VM frame, and
//! fee settlement, all against the journaled overlay.

use common_types::{
    log_entry::LogEntry,
    transaction::{self, Action, Authorization, SignedTransaction, TypedTransaction},
};
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use parity_bytes::Bytes;
use rlp::RlpStream;
use vm::{ActionParams, CallKind, CallOutput, EnvInfo, Exec, Ext};

use crate::{error::Error, spec::CommonParams, state::State};

/// The address a contract created by `sender` at `nonce` deploys to.
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    Address::from_slice(&keccak(stream.out()).as_bytes()[12..])
}

/// Transaction execution outcome, the raw material of a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    /// Whether the top-level frame succeeded.
    pub success: bool,
    /// Gas spent by the transaction, refunds already applied.
    pub gas_used: U256,
    /// Bytes returned by the top-level frame.
    pub output: Bytes,
    /// Address of the created contract, for creations.
    pub contract_address: Option<Address>,
    /// Logs emitted.
    pub logs: Vec<LogEntry>,
}

/// Transaction executor bound to one overlay and one block environment.
pub struct Executive<'a> {
    state: &'a mut State,
    env: &'a EnvInfo,
    params: &'a CommonParams,
    evm: &'a dyn Exec,
}

impl<'a> Executive<'a> {
    /// Basic constructor.
    pub fn new(
        state: &'a mut State,
        env: &'a EnvInfo,
        params: &'a CommonParams,
        evm: &'a dyn Exec,
    ) -> Self {
        Executive {
            state,
            env,
            params,
            evm,
        }
    }

    /// Execute a transaction from a recovered sender with full validity
    /// checks.
    pub fn transact(&mut self, tx: &SignedTransaction) -> Result<Executed, Error> {
        self.execute(tx.sender(), &tx.unsigned, true)
    }

    /// Execute without nonce and balance enforcement, for `eth_call` and
    /// gas estimation.
    pub fn transact_virtual(
        &mut self,
        sender: Address,
        tx: &TypedTransaction,
    ) -> Result<Executed, Error> {
        self.execute(sender, tx, false)
    }

    fn execute(
        &mut self,
        sender: Address,
        tx: &TypedTransaction,
        check_sender: bool,
    ) -> Result<Executed, Error> {
        let gas_limit = tx.tx().gas;
        let value = tx.tx().value;
        let effective_gas_price = tx.effective_gas_price(self.env.base_fee);

        if let Some(chain_id) = tx.chain_id() {
            if chain_id != self.params.chain_id {
                return Err(transaction::Error::InvalidChainId.into());
            }
        }
        if gas_limit > self.env.gas_limit {
            return Err(transaction::Error::GasLimitExceeded {
                limit: self.env.gas_limit,
                got: gas_limit,
            }
            .into());
        }
        let intrinsic = U256::from(tx.gas_required());
        if gas_limit < intrinsic {
            return Err(transaction::Error::IntrinsicGasTooLow {
                minimal: intrinsic,
                got: gas_limit,
            }
            .into());
        }

        let account_nonce = self.state.nonce(&sender)?;
        if check_sender {
            let tx_nonce = tx.tx().nonce;
            if tx_nonce < U256::from(account_nonce) {
                return Err(transaction::Error::NonceTooLow {
                    minimal: account_nonce.into(),
                    got: tx_nonce,
                }
                .into());
            }
            if tx_nonce > U256::from(account_nonce) {
                return Err(transaction::Error::NonceTooHigh {
                    limit: account_nonce.into(),
                    got: tx_nonce,
                }
                .into());
            }
            let cost = gas_limit * effective_gas_price + value;
            let balance = self.state.balance(&sender)?;
            if balance < cost {
                return Err(transaction::Error::InsufficientFunds { balance, cost }.into());
            }
        }

        let recipient = match tx.tx().action {
            Action::Call(ref to) => Some(*to),
            Action::Create => None,
        };
        self.state.begin_transaction(
            &sender,
            recipient.as_ref(),
            &self.params.precompile_addresses(self.env.number),
            tx.access_list(),
        );

        self.state
            .sub_balance(&sender, gas_limit * effective_gas_price)?;
        self.state.inc_nonce(&sender)?;

        if let Some(authorizations) = tx.authorization_list() {
            self.apply_authorizations(authorizations)?;
        }

        let frame_snapshot = self.state.snapshot();
        let frame_gas = gas_limit - intrinsic;
        let (outcome, created) = match tx.tx().action {
            Action::Call(to) => {
                self.state.touch(&to);
                self.state.sub_balance(&sender, value)?;
                self.state.add_balance(&to, value)?;
                let code = match self.state.delegation(&to)? {
                    Some(target) => self.state.code(&target)?,
                    None => self.state.code(&to)?,
                };
                let params = ActionParams {
                    address: to,
                    sender,
                    origin: sender,
                    gas: frame_gas,
                    gas_price: effective_gas_price,
                    value,
                    code,
                    data: Some(tx.tx().data.clone()),
                    kind: CallKind::Call,
                };
                let mut ext = Externalities {
                    state: &mut *self.state,
                    env: self.env,
                    address: to,
                };
                (self.evm.exec(params, &mut ext), None)
            }
            Action::Create => {
                let created = contract_address(&sender, account_nonce);
                self.state.sub_balance(&sender, value)?;
                self.state.new_contract(&created, value, 1)?;
                let params = ActionParams {
                    address: created,
                    sender,
                    origin: sender,
                    gas: frame_gas,
                    gas_price: effective_gas_price,
                    value,
                    code: Some(std::sync::Arc::new(tx.tx().data.clone())),
                    data: None,
                    kind: CallKind::Create,
                };
                let mut ext = Externalities {
                    state: &mut *self.state,
                    env: self.env,
                    address: created,
                };
                let result = self.evm.exec(params, &mut ext);
                if let Ok(CallOutput {
                    apply_state: true,
                    ref return_data,
                    ..
                }) = result
                {
                    if !return_data.is_empty() {
                        self.state.set_code(&created, return_data.clone())?;
                    }
                }
                (result, Some(created))
            }
        };

        let (success, gas_left, output) = match outcome {
            Ok(CallOutput {
                gas_left,
                return_data,
                apply_state: true,
            }) => (true, gas_left, return_data),
            Ok(CallOutput {
                gas_left,
                return_data,
                apply_state: false,
            }) => {
                self.state.revert_to_snapshot(frame_snapshot);
                (false, gas_left, return_data)
            }
            Err(_) => {
                // a failing frame consumes everything it was given
                self.state.revert_to_snapshot(frame_snapshot);
                (false, U256::zero(), Bytes::new())
            }
        };

        let gas_used_pre_refund = gas_limit - gas_left.min(frame_gas);
        let refund = if success {
            let counter = self.state.refund().max(0) as u64;
            // EIP-3529 caps the refund at a fifth of the gas spent
            U256::from(counter).min(gas_used_pre_refund / 5)
        } else {
            U256::zero()
        };
        let gas_used = gas_used_pre_refund - refund;

        self.state
            .add_balance(&sender, (gas_limit - gas_used) * effective_gas_price)?;
        let per_gas_fee = match self.env.base_fee {
            // the base fee portion is burned
            Some(_) => tx.effective_priority_fee(self.env.base_fee),
            None => effective_gas_price,
        };
        let author_fee = gas_used * per_gas_fee;
        if !author_fee.is_zero() {
            self.state.balance_increase(&self.env.author, author_fee)?;
        }

        Ok(Executed {
            success,
            gas_used,
            output,
            contract_address: created,
            logs: self.state.logs().to_vec(),
        })
    }

    // EIP-7702: apply delegation tuples. Invalid tuples are skipped, never
    // fatal.
    fn apply_authorizations(&mut self, authorizations: &[Authorization]) -> Result<(), Error> {
        for authorization in authorizations {
            if !authorization.chain_id.is_zero()
                && authorization.chain_id != U256::from(self.params.chain_id)
            {
                continue;
            }
            let authority = match authorization.authority() {
                Ok(authority) => authority,
                Err(_) => continue,
            };
            if self.state.nonce(&authority)? != authorization.nonce {
                continue;
            }
            let target = if authorization.address.is_zero() {
                None
            } else {
                Some(authorization.address)
            };
            self.state.set_delegation(&authority, target)?;
            self.state.inc_nonce(&authority)?;
        }
        Ok(())
    }
}

// The state surface handed to the interpreter for one frame.
struct Externalities<'x> {
    state: &'x mut State,
    env: &'x EnvInfo,
    address: Address,
}

impl<'x> Ext for Externalities<'x> {
    fn balance(&mut self, address: &Address) -> vm::Result<U256> {
        self.state
            .balance(address)
            .map_err(|e| vm::Error::Internal(e.to_string()))
    }

    fn exists(&mut self, address: &Address) -> vm::Result<bool> {
        self.state
            .exists(address)
            .map_err(|e| vm::Error::Internal(e.to_string()))
    }

    fn storage_at(&mut self, key: &H256) -> vm::Result<H256> {
        let address = self.address;
        self.state
            .storage_at(&address, key)
            .map_err(|e| vm::Error::Internal(e.to_string()))
    }

    fn set_storage(&mut self, key: H256, value: H256) -> vm::Result<()> {
        let address = self.address;
        self.state
            .set_storage(&address, key, value)
            .map_err(|e| vm::Error::Internal(e.to_string()))
    }

    fn transient_storage_at(&self, key: &H256) -> H256 {
        self.state.transient_storage_at(&self.address, key)
    }

    fn set_transient_storage(&mut self, key: H256, value: H256) {
        let address = self.address;
        self.state.set_transient_storage(&address, key, value)
    }

    fn code(&mut self, address: &Address) -> vm::Result<Option<std::sync::Arc<Bytes>>> {
        self.state
            .code(address)
            .map_err(|e| vm::Error::Internal(e.to_string()))
    }

    fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> vm::Result<()> {
        self.state.add_log(LogEntry {
            address: self.address,
            topics,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn add_refund(&mut self, delta: i64) {
        self.state.add_refund(delta)
    }

    fn access_address(&mut self, address: &Address) -> bool {
        self.state.access_address(address)
    }

    fn access_slot(&mut self, address: &Address, key: &H256) -> bool {
        self.state.access_slot(address, key)
    }

    fn env_info(&self) -> &EnvInfo {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{spec::Spec, state::StateReader};
    use common_types::{basic_account::BasicAccount, transaction::Transaction};
    use parity_crypto::publickey::{Generator, KeyPair, Random};
    use vm::NoopEvm;

    struct FundedReader(Vec<(Address, U256)>);

    impl StateReader for FundedReader {
        fn account(&mut self, address: &Address) -> Result<Option<BasicAccount>, Error> {
            Ok(self
                .0
                .iter()
                .find(|(a, _)| a == address)
                .map(|(_, balance)| BasicAccount::with_balance(*balance)))
        }
        fn storage(&mut self, _: &[u8]) -> Result<Option<H256>, Error> {
            Ok(None)
        }
        fn code(&mut self, _: &H256) -> Result<Option<Bytes>, Error> {
            Ok(None)
        }
    }

    fn funded_state(keypair: &KeyPair, balance: u64) -> State {
        State::new(Box::new(FundedReader(vec![(
            keypair.address(),
            balance.into(),
        )])))
    }

    fn env() -> EnvInfo {
        EnvInfo {
            number: 1,
            author: Address::from_low_u64_be(0xc0ffee),
            timestamp: 10,
            gas_limit: 30_000_000.into(),
            base_fee: None,
            chain_id: 1337,
            ..Default::default()
        }
    }

    fn transfer(keypair: &KeyPair, nonce: u64, to: Address, value: u64, gas_price: u64) -> SignedTransaction {
        TypedTransaction::Legacy(Transaction {
            nonce: nonce.into(),
            gas_price: gas_price.into(),
            gas: 21_000.into(),
            action: Action::Call(to),
            value: value.into(),
            data: vec![],
        })
        .sign(keypair.secret(), Some(1337))
    }

    #[test]
    fn plain_transfer_moves_value_and_pays_the_author() {
        let keypair = Random.generate();
        let spec = Spec::new_test();
        let mut state = funded_state(&keypair, 10_000_000);
        let env = env();
        let to = Address::from_low_u64_be(0xd00d);
        let tx = transfer(&keypair, 0, to, 1_000, 2);

        let executed = Executive::new(&mut state, &env, &spec.params, &NoopEvm)
            .transact(&tx)
            .unwrap();
        assert!(executed.success);
        assert_eq!(executed.gas_used, 21_000.into());

        assert_eq!(state.balance(&to).unwrap(), 1_000.into());
        assert_eq!(
            state.balance(&keypair.address()).unwrap(),
            U256::from(10_000_000 - 1_000 - 21_000 * 2)
        );
        assert_eq!(state.balance(&env.author).unwrap(), (21_000 * 2).into());
        assert_eq!(state.nonce(&keypair.address()).unwrap(), 1);
    }

    #[test]
    fn nonce_gaps_are_rejected() {
        let keypair = Random.generate();
        let spec = Spec::new_test();
        let mut state = funded_state(&keypair, 10_000_000);
        let env = env();
        let tx = transfer(&keypair, 3, Address::from_low_u64_be(1), 0, 1);
        match Executive::new(&mut state, &env, &spec.params, &NoopEvm).transact(&tx) {
            Err(Error::Transaction(transaction::Error::NonceTooHigh { .. })) => {}
            other => panic!("expected NonceTooHigh, got {:?}", other),
        }
    }

    #[test]
    fn insufficient_funds_are_rejected() {
        let keypair = Random.generate();
        let spec = Spec::new_test();
        let mut state = funded_state(&keypair, 1_000);
        let env = env();
        let tx = transfer(&keypair, 0, Address::from_low_u64_be(1), 500, 1);
        match Executive::new(&mut state, &env, &spec.params, &NoopEvm).transact(&tx) {
            Err(Error::Transaction(transaction::Error::InsufficientFunds { .. })) => {}
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
    }

    #[test]
    fn creation_assigns_the_rlp_address() {
        let keypair = Random.generate();
        let spec = Spec::new_test();
        let mut state = funded_state(&keypair, 100_000_000);
        let env = env();
        let tx = TypedTransaction::Legacy(Transaction {
            nonce: 0.into(),
            gas_price: 1.into(),
            gas: 60_000.into(),
            action: Action::Create,
            value: 5.into(),
            data: vec![0x60, 0x00],
        })
        .sign(keypair.secret(), Some(1337));

        let executed = Executive::new(&mut state, &env, &spec.params, &NoopEvm)
            .transact(&tx)
            .unwrap();
        let expected = contract_address(&keypair.address(), 0);
        assert_eq!(executed.contract_address, Some(expected));
        assert_eq!(state.balance(&expected).unwrap(), 5.into());
    }

    #[test]
    fn base_fee_portion_is_burned() {
        let keypair = Random.generate();
        let spec = Spec::new_test();
        let mut state = funded_state(&keypair, 100_000_000);
        let mut env = env();
        env.base_fee = Some(10.into());
        // legacy gas price 12 under a base fee of 10: tip of 2 per gas
        let tx = transfer(&keypair, 0, Address::from_low_u64_be(1), 0, 12);
        let executed = Executive::new(&mut state, &env, &spec.params, &NoopEvm)
            .transact(&tx)
            .unwrap();
        assert!(executed.success);
        assert_eq!(state.balance(&env.author).unwrap(), (21_000u64 * 2).into());
    }
}
