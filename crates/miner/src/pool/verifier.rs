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

//! Transaction admission checks, cheapest first: structure and gas before
//! the expensive signature recovery, state-dependent checks last.

use common_types::transaction::{
    self, Action, SignedTransaction, TypedTransaction, UnverifiedTransaction,
};
use ethereum_types::U256;

use super::{client::Client, Options};

/// Verify a raw transaction for pool admission.
pub fn verify(
    client: &dyn Client,
    options: &Options,
    tx: UnverifiedTransaction,
) -> Result<SignedTransaction, transaction::Error> {
    // structural constraints of the typed variants
    match tx.unsigned {
        TypedTransaction::Blob(_) | TypedTransaction::SetCode(_) => {
            if tx.unsigned.tx().action == Action::Create {
                return Err(transaction::Error::RecipientRequired);
            }
        }
        _ => {}
    }

    let gas = tx.unsigned.tx().gas;
    let block_gas_limit = client.block_gas_limit();
    if gas > block_gas_limit {
        return Err(transaction::Error::GasLimitExceeded {
            limit: block_gas_limit,
            got: gas,
        });
    }

    let required = U256::from(tx.unsigned.gas_required());
    if gas < required {
        return Err(transaction::Error::IntrinsicGasTooLow {
            minimal: required,
            got: gas,
        });
    }

    let base_fee = client.base_fee();
    let effective_price = tx.unsigned.effective_gas_price(base_fee);
    if effective_price < options.minimal_gas_price {
        return Err(transaction::Error::GasPriceTooLow {
            minimal: options.minimal_gas_price,
            got: effective_price,
        });
    }

    // signature recovery is the expensive step
    let signed = SignedTransaction::new(tx)?;

    let account = client.account_details(&signed.sender());
    let nonce = signed.unsigned.tx().nonce;
    if nonce < account.nonce {
        return Err(transaction::Error::NonceTooLow {
            minimal: account.nonce,
            got: nonce,
        });
    }
    let cost = signed.unsigned.tx().value
        + gas * effective_price;
    if account.balance < cost {
        return Err(transaction::Error::InsufficientFunds {
            balance: account.balance,
            cost,
        });
    }

    Ok(signed)
}
