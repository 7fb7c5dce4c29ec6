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

//! The read client: every query the RPC and Engine-API façades need,
//! answered over read-only snapshots of the store. Writes flow through the
//! sync pipeline exclusively; the only write this module ever performs is
//! planting the genesis block into an empty database.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use common_types::{
    block::{Block, BlockBody},
    filter::Filter,
    header::Header,
    ids::BlockId,
    log_entry::LocalizedLogEntry,
    receipt::Receipt,
    transaction::{LocalizedTransaction, TypedTransaction, TypedTxId},
    BlockNumber,
};
use embercore_kv::{tables, KeyValueStore, ReadTransaction};
use ethereum_types::{Address, Bloom, H256, U256};
use log::info;
use parity_bytes::Bytes;
use vm::{EnvInfo, Exec, NoopEvm};

use crate::{
    commitment,
    engines::EngineSelector,
    error::Error,
    executive::{Executed, Executive},
    spec::Spec,
    state::{AsOfReader, Domains, LatestReader, State, StateReader},
};

/// Forkchoice pointer keys.
pub const FORKCHOICE_HEAD: &[u8] = b"head";
/// Safe-block pointer key.
pub const FORKCHOICE_SAFE: &[u8] = b"safe";
/// Finalized-block pointer key.
pub const FORKCHOICE_FINALIZED: &[u8] = b"finalized";

/// Stage name whose progress is the published head.
const FINISH_STAGE: &[u8] = b"Finish";

/// Sync progress shared between the driver and the RPC workers.
#[derive(Debug, Default)]
pub struct SyncState {
    /// Highest block fully processed.
    pub current: AtomicU64,
    /// Target head the driver works towards.
    pub target: AtomicU64,
}

impl SyncState {
    /// Whether a sync is in flight.
    pub fn is_syncing(&self) -> bool {
        let current = self.current.load(Ordering::Relaxed);
        let target = self.target.load(Ordering::Relaxed);
        target > current
    }
}

/// A receipt localized in its block, ready for the RPC surface.
#[derive(Debug, Clone)]
pub struct LocalizedReceipt {
    /// Transaction hash.
    pub transaction_hash: H256,
    /// Index within the block.
    pub transaction_index: usize,
    /// Containing block hash.
    pub block_hash: H256,
    /// Containing block number.
    pub block_number: BlockNumber,
    /// Cumulative gas at this receipt.
    pub cumulative_gas_used: U256,
    /// Gas used by this transaction alone.
    pub gas_used: U256,
    /// Created contract, for creations.
    pub contract_address: Option<Address>,
    /// Localized logs.
    pub logs: Vec<LocalizedLogEntry>,
    /// Bloom over the logs.
    pub log_bloom: Bloom,
    /// EIP-658 status.
    pub success: bool,
    /// Transaction variant.
    pub tx_type: TypedTxId,
    /// Price actually paid per gas unit.
    pub effective_gas_price: U256,
    /// Sender.
    pub from: Address,
    /// Recipient, absent for creations.
    pub to: Option<Address>,
}

/// Read client over the store.
pub struct Client {
    store: Arc<dyn KeyValueStore>,
    spec: Spec,
    engines: EngineSelector,
    domains: Domains,
    sync: Arc<SyncState>,
    evm: Arc<dyn Exec>,
}

impl Client {
    /// Open a client over `store`, planting the genesis block when the
    /// database is empty.
    pub fn new(store: Arc<dyn KeyValueStore>, spec: Spec) -> Result<Arc<Client>, Error> {
        let client = Client {
            engines: EngineSelector::new(spec.params.clone()),
            domains: Domains::default(),
            sync: Arc::new(SyncState::default()),
            evm: Arc::new(NoopEvm),
            store,
            spec,
        };
        client.ensure_genesis()?;
        Ok(Arc::new(client))
    }

    fn ensure_genesis(&self) -> Result<(), Error> {
        {
            let read = self.store.begin_read()?;
            if read
                .get(tables::CANONICAL_HASHES, &embercore_kv::encode_number(0))?
                .is_some()
            {
                return Ok(());
            }
        }
        let mut tx = self.store.begin_write()?;
        for (address, balance) in &self.spec.genesis_accounts {
            let account = common_types::basic_account::BasicAccount::with_balance(*balance);
            self.domains
                .accounts
                .put(tx.as_mut(), address.as_bytes(), &rlp::encode(&account), 0)?;
        }
        let mut genesis = self.spec.genesis_header();
        genesis.state_root = commitment::state_root(tx.as_read())?;
        let hash = genesis.hash();
        let zero = embercore_kv::encode_number(0);
        tx.put(tables::HEADERS, &zero, &genesis.rlp())?;
        tx.put(tables::CANONICAL_HASHES, &zero, hash.as_bytes())?;
        tx.put(tables::HEADER_NUMBERS, hash.as_bytes(), &zero)?;
        tx.put(tables::BODIES, &zero, &BlockBody::default().rlp_bytes())?;
        tx.put(tables::MAX_TX_NUM, &zero, &zero)?;
        tx.put(tables::FORKCHOICE, FORKCHOICE_HEAD, hash.as_bytes())?;
        tx.put(tables::FORKCHOICE, FORKCHOICE_SAFE, hash.as_bytes())?;
        tx.put(tables::FORKCHOICE, FORKCHOICE_FINALIZED, hash.as_bytes())?;
        tx.commit()?;
        info!(target: "client", "Planted genesis block {:?} for chain {}", hash, self.spec.name);
        Ok(())
    }

    /// The chain specification.
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// The engine pair.
    pub fn engines(&self) -> &EngineSelector {
        &self.engines
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Shared sync progress.
    pub fn sync_state(&self) -> Arc<SyncState> {
        self.sync.clone()
    }

    fn read(&self) -> Result<Box<dyn ReadTransaction>, Error> {
        Ok(self.store.begin_read()?)
    }

    /// Progress of the Finish stage: the published head.
    pub fn best_block_number(&self) -> BlockNumber {
        self.read()
            .ok()
            .and_then(|tx| {
                tx.get(tables::SYNC_STAGE_PROGRESS, FINISH_STAGE)
                    .ok()
                    .flatten()
            })
            .and_then(|raw| embercore_kv::decode_number(&raw).ok())
            .unwrap_or(0)
    }

    fn forkchoice_pointer(&self, key: &[u8]) -> Option<H256> {
        let tx = self.read().ok()?;
        let raw = tx.get(tables::FORKCHOICE, key).ok()??;
        Some(H256::from_slice(&raw))
    }

    /// Resolve a block id to a canonical number.
    pub fn resolve_block_id(&self, id: BlockId) -> Option<BlockNumber> {
        match id {
            BlockId::Number(number) => {
                if number <= self.best_block_number() {
                    Some(number)
                } else {
                    None
                }
            }
            BlockId::Earliest => Some(0),
            BlockId::Latest | BlockId::Pending => Some(self.best_block_number()),
            BlockId::Hash(hash) => self.block_number_of(&hash),
            BlockId::Safe => self
                .forkchoice_pointer(FORKCHOICE_SAFE)
                .and_then(|hash| self.block_number_of(&hash)),
            BlockId::Finalized => self
                .forkchoice_pointer(FORKCHOICE_FINALIZED)
                .and_then(|hash| self.block_number_of(&hash)),
        }
    }

    /// Number of a block hash, canonical or not.
    pub fn block_number_of(&self, hash: &H256) -> Option<BlockNumber> {
        let tx = self.read().ok()?;
        let raw = tx.get(tables::HEADER_NUMBERS, hash.as_bytes()).ok()??;
        embercore_kv::decode_number(&raw).ok()
    }

    /// Canonical hash at a height.
    pub fn block_hash(&self, number: BlockNumber) -> Option<H256> {
        let tx = self.read().ok()?;
        let raw = tx
            .get(tables::CANONICAL_HASHES, &embercore_kv::encode_number(number))
            .ok()??;
        Some(H256::from_slice(&raw))
    }

    /// Header at a block id.
    pub fn block_header(&self, id: BlockId) -> Option<Header> {
        let number = self.resolve_block_id(id)?;
        let tx = self.read().ok()?;
        let raw = tx
            .get(tables::HEADERS, &embercore_kv::encode_number(number))
            .ok()??;
        rlp::decode(&raw).ok()
    }

    /// Body at a block id.
    pub fn block_body(&self, id: BlockId) -> Option<BlockBody> {
        let number = self.resolve_block_id(id)?;
        let tx = self.read().ok()?;
        let raw = tx
            .get(tables::BODIES, &embercore_kv::encode_number(number))
            .ok()??;
        BlockBody::decode(&raw).ok()
    }

    /// Full block at a block id.
    pub fn block(&self, id: BlockId) -> Option<Block> {
        let header = self.block_header(id)?;
        let body = self.block_body(BlockId::Number(header.number))?;
        Some(Block {
            header,
            transactions: body.transactions,
            uncles: body.uncles,
            withdrawals: body.withdrawals,
        })
    }

    /// All receipts of a block.
    pub fn block_receipts(&self, number: BlockNumber) -> Option<Vec<Receipt>> {
        let tx = self.read().ok()?;
        let raw = tx
            .get(tables::BLOCK_RECEIPTS, &embercore_kv::encode_number(number))
            .ok()??;
        Receipt::decode_list(&raw).ok()
    }

    /// Locate a transaction by hash through the lookup index.
    pub fn transaction(&self, hash: &H256) -> Option<LocalizedTransaction> {
        let tx = self.read().ok()?;
        let raw = tx.get(tables::TX_LOOKUP, hash.as_bytes()).ok()??;
        let number = embercore_kv::decode_number(&raw).ok()?;
        drop(tx);
        let block_hash = self.block_hash(number)?;
        let body = self.block_body(BlockId::Number(number))?;
        let index = body
            .transactions
            .iter()
            .position(|candidate| candidate.hash() == *hash)?;
        let sender = self.sender_of(number, index);
        Some(LocalizedTransaction {
            signed: body.transactions.into_iter().nth(index)?,
            block_number: number,
            block_hash,
            transaction_index: index,
            cached_sender: sender,
        })
    }

    /// Sender cached by the senders stage.
    pub fn sender_of(&self, number: BlockNumber, index: usize) -> Option<Address> {
        let tx = self.read().ok()?;
        let raw = tx
            .get(tables::SENDERS, &embercore_kv::encode_number(number))
            .ok()??;
        let offset = index * 20;
        if raw.len() < offset + 20 {
            return None;
        }
        Some(Address::from_slice(&raw[offset..offset + 20]))
    }

    /// Receipt of one transaction, localized.
    pub fn transaction_receipt(&self, hash: &H256) -> Option<LocalizedReceipt> {
        let mut located = self.transaction(hash)?;
        let receipts = self.block_receipts(located.block_number)?;
        let index = located.transaction_index;
        let receipt = receipts.get(index)?.clone();
        let prior_cumulative = if index == 0 {
            U256::zero()
        } else {
            receipts[index - 1].cumulative_gas_used
        };
        let prior_logs: usize = receipts[..index].iter().map(|r| r.logs.len()).sum();
        let header = self.block_header(BlockId::Number(located.block_number))?;
        let from = located.sender();
        let to = match located.signed.unsigned.tx().action {
            common_types::transaction::Action::Call(ref to) => Some(*to),
            common_types::transaction::Action::Create => None,
        };
        let effective_gas_price = located
            .signed
            .unsigned
            .effective_gas_price(header.base_fee_per_gas);
        let contract_address = match to {
            Some(_) => None,
            None => Some(crate::executive::contract_address(
                &from,
                located.signed.unsigned.tx().nonce.low_u64(),
            )),
        };
        let logs = receipt
            .logs
            .iter()
            .enumerate()
            .map(|(i, entry)| LocalizedLogEntry {
                entry: entry.clone(),
                block_hash: located.block_hash,
                block_number: located.block_number,
                transaction_hash: *hash,
                transaction_index: index,
                log_index: prior_logs + i,
                transaction_log_index: i,
            })
            .collect();
        Some(LocalizedReceipt {
            transaction_hash: *hash,
            transaction_index: index,
            block_hash: located.block_hash,
            block_number: located.block_number,
            cumulative_gas_used: receipt.cumulative_gas_used,
            gas_used: receipt.cumulative_gas_used - prior_cumulative,
            contract_address,
            logs,
            log_bloom: receipt.log_bloom,
            success: receipt.success,
            tx_type: receipt.tx_type,
            effective_gas_price,
            from,
            to,
        })
    }

    fn max_tx_num(&self, number: BlockNumber) -> Result<u64, Error> {
        let tx = self.read()?;
        let raw = tx
            .get(tables::MAX_TX_NUM, &embercore_kv::encode_number(number))?
            .ok_or(embercore_kv::Error::NotFound)?;
        Ok(embercore_kv::decode_number(&raw)?)
    }

    // A state reader pinned at `id`: latest cursors for the head, as-of
    // otherwise.
    fn reader_at(&self, number: BlockNumber) -> Result<Box<dyn StateReader>, Error> {
        if number >= self.best_block_number() {
            let tx = self.read()?;
            Ok(Box::new(LatestReader::new(tx.as_ref())?))
        } else {
            let tx_number = self.max_tx_num(number)?;
            Ok(Box::new(AsOfReader::new(self.read()?, tx_number)))
        }
    }

    /// Balance of an account at a block.
    pub fn balance(&self, address: &Address, id: BlockId) -> Option<U256> {
        let number = self.resolve_block_id(id)?;
        let mut reader = self.reader_at(number).ok()?;
        reader
            .account(address)
            .ok()?
            .map(|account| account.balance)
            .or(Some(U256::zero()))
    }

    /// Nonce of an account at a block.
    pub fn nonce(&self, address: &Address, id: BlockId) -> Option<U256> {
        let number = self.resolve_block_id(id)?;
        let mut reader = self.reader_at(number).ok()?;
        reader
            .account(address)
            .ok()?
            .map(|account| U256::from(account.nonce))
            .or(Some(U256::zero()))
    }

    /// Code of an account at a block.
    pub fn code(&self, address: &Address, id: BlockId) -> Option<Bytes> {
        let number = self.resolve_block_id(id)?;
        let mut reader = self.reader_at(number).ok()?;
        let account = reader.account(address).ok()??;
        if !account.has_code() {
            return Some(Bytes::new());
        }
        reader.code(&account.code_hash).ok()?
    }

    /// Storage slot of an account at a block.
    pub fn storage_at(&self, address: &Address, slot: &H256, id: BlockId) -> Option<H256> {
        let number = self.resolve_block_id(id)?;
        let mut reader = self.reader_at(number).ok()?;
        let account = match reader.account(address).ok()? {
            Some(account) => account,
            None => return Some(H256::zero()),
        };
        let key = crate::state::storage_key(address, account.incarnation, slot);
        Some(reader.storage(&key).ok()?.unwrap_or_else(H256::zero))
    }

    /// Logs matching a filter over canonical blocks.
    pub fn logs(&self, filter: &Filter) -> Vec<LocalizedLogEntry> {
        let from = match self.resolve_block_id(filter.from_block) {
            Some(from) => from,
            None => return Vec::new(),
        };
        let to = match self.resolve_block_id(filter.to_block) {
            Some(to) => to,
            None => return Vec::new(),
        };
        let mut found = Vec::new();
        for number in from..=to {
            let header = match self.block_header(BlockId::Number(number)) {
                Some(header) => header,
                None => continue,
            };
            if !filter.bloom_match(&header.log_bloom) {
                continue;
            }
            let receipts = self.block_receipts(number).unwrap_or_default();
            let body = match self.block_body(BlockId::Number(number)) {
                Some(body) => body,
                None => continue,
            };
            let block_hash = header.hash();
            let mut log_index = 0usize;
            for (tx_index, receipt) in receipts.iter().enumerate() {
                for (i, entry) in receipt.logs.iter().enumerate() {
                    if filter.matches(entry) {
                        found.push(LocalizedLogEntry {
                            entry: entry.clone(),
                            block_hash,
                            block_number: number,
                            transaction_hash: body
                                .transactions
                                .get(tx_index)
                                .map(|tx| tx.hash())
                                .unwrap_or_default(),
                            transaction_index: tx_index,
                            log_index,
                            transaction_log_index: i,
                        });
                    }
                    log_index += 1;
                }
            }
        }
        if let Some(limit) = filter.limit {
            let drop = found.len().saturating_sub(limit);
            found.drain(..drop);
        }
        found
    }

    /// Execution environment implied by a header.
    pub fn env_info(&self, header: &Header) -> EnvInfo {
        EnvInfo {
            number: header.number,
            author: header.author,
            timestamp: header.timestamp,
            difficulty: header.difficulty,
            prevrandao: header.mix_digest,
            gas_limit: header.gas_limit,
            base_fee: header.base_fee_per_gas,
            chain_id: self.spec.params.chain_id,
        }
    }

    /// Run a transaction against the state at `id` without committing.
    pub fn call(
        &self,
        tx: &TypedTransaction,
        sender: Address,
        id: BlockId,
    ) -> Result<Executed, Error> {
        let header = self
            .block_header(id)
            .ok_or(embercore_kv::Error::NotFound)?;
        let reader = self.reader_at(header.number)?;
        let mut state = State::new(reader);
        let env = self.env_info(&header);
        let mut executive = Executive::new(&mut state, &env, &self.spec.params, &*self.evm);
        executive.transact_virtual(sender, tx)
    }

    /// Gas estimation: execution cost plus intrinsic floor.
    pub fn estimate_gas(
        &self,
        tx: &TypedTransaction,
        sender: Address,
        id: BlockId,
    ) -> Result<U256, Error> {
        let executed = self.call(tx, sender, id)?;
        Ok(executed.gas_used.max(U256::from(tx.gas_required())))
    }

    /// Median effective gas price over the most recent blocks.
    pub fn gas_price_median(&self, block_count: u64) -> U256 {
        let best = self.best_block_number();
        let mut prices = Vec::new();
        let from = best.saturating_sub(block_count.saturating_sub(1));
        for number in from..=best {
            let header = match self.block_header(BlockId::Number(number)) {
                Some(header) => header,
                None => continue,
            };
            if let Some(body) = self.block_body(BlockId::Number(number)) {
                for tx in &body.transactions {
                    prices.push(tx.unsigned.effective_gas_price(header.base_fee_per_gas));
                }
            }
        }
        if prices.is_empty() {
            let head = self.block_header(BlockId::Latest);
            return head
                .and_then(|h| h.base_fee_per_gas)
                .unwrap_or_else(|| U256::from(1_000_000_000u64));
        }
        prices.sort();
        prices[prices.len() / 2]
    }

    /// Median priority fee over the most recent blocks.
    pub fn priority_fee_median(&self, block_count: u64) -> U256 {
        let best = self.best_block_number();
        let mut tips = Vec::new();
        let from = best.saturating_sub(block_count.saturating_sub(1));
        for number in from..=best {
            let header = match self.block_header(BlockId::Number(number)) {
                Some(header) => header,
                None => continue,
            };
            if let Some(body) = self.block_body(BlockId::Number(number)) {
                for tx in &body.transactions {
                    tips.push(tx.unsigned.effective_priority_fee(header.base_fee_per_gas));
                }
            }
        }
        if tips.is_empty() {
            return U256::from(1_000_000_000u64);
        }
        tips.sort();
        tips[tips.len() / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embercore_kv::MemoryStore;

    fn client() -> Arc<Client> {
        let mut spec = Spec::new_test();
        spec.genesis_accounts = vec![(Address::from_low_u64_be(1), 1_000_000.into())];
        Client::new(Arc::new(MemoryStore::new()), spec).unwrap()
    }

    #[test]
    fn genesis_is_planted_once() {
        let client = client();
        let genesis = client.block_header(BlockId::Number(0)).expect("genesis");
        assert_eq!(genesis.number, 0);
        assert_eq!(client.block_hash(0), Some(genesis.hash()));
        // a second client over the same store leaves it alone
        let again = Client::new(client.store().clone(), client.spec().clone()).unwrap();
        assert_eq!(
            again.block_header(BlockId::Number(0)).unwrap().hash(),
            genesis.hash()
        );
    }

    #[test]
    fn genesis_alloc_is_readable() {
        let client = client();
        assert_eq!(
            client.balance(&Address::from_low_u64_be(1), BlockId::Latest),
            Some(1_000_000.into())
        );
        assert_eq!(
            client.balance(&Address::from_low_u64_be(2), BlockId::Latest),
            Some(U256::zero())
        );
    }

    #[test]
    fn unknown_blocks_resolve_to_none() {
        let client = client();
        assert_eq!(client.resolve_block_id(BlockId::Number(5)), None);
        assert!(client.block_header(BlockId::Number(5)).is_none());
    }

    #[test]
    fn forkchoice_pointers_start_at_genesis() {
        let client = client();
        let genesis = client.block_hash(0).unwrap();
        assert_eq!(client.resolve_block_id(BlockId::Safe), Some(0));
        assert_eq!(client.resolve_block_id(BlockId::Finalized), Some(0));
        assert_eq!(client.block_number_of(&genesis), Some(0));
    }
}
