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

//! Beacon chain withdrawal (EIP-4895).

use ethereum_types::{Address, U256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// Scale factor between the withdrawal amount unit (Gwei) and Wei.
pub const GWEI_TO_WEI: u64 = 1_000_000_000;

/// A validator withdrawal pushed by the consensus layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Withdrawal {
    /// Monotonically increasing withdrawal index.
    pub index: u64,
    /// Index of the validator on the beacon chain.
    pub validator_index: u64,
    /// Recipient of the withdrawn amount.
    pub address: Address,
    /// Amount in Gwei.
    pub amount: u64,
}

impl Withdrawal {
    /// Withdrawal amount converted to Wei.
    pub fn amount_wei(&self) -> U256 {
        U256::from(self.amount) * U256::from(GWEI_TO_WEI)
    }
}

impl Encodable for Withdrawal {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.index);
        s.append(&self.validator_index);
        s.append(&self.address);
        s.append(&self.amount);
    }
}

impl Decodable for Withdrawal {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Withdrawal {
            index: rlp.val_at(0)?,
            validator_index: rlp.val_at(1)?,
            address: rlp.val_at(2)?,
            amount: rlp.val_at(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlp_round_trip() {
        let withdrawal = Withdrawal {
            index: 7,
            validator_index: 42,
            address: Address::from_low_u64_be(0xbeef),
            amount: 2_500_000,
        };
        let encoded = rlp::encode(&withdrawal);
        assert_eq!(
            rlp::decode::<Withdrawal>(&encoded).unwrap(),
            withdrawal
        );
    }

    #[test]
    fn amount_is_gwei() {
        let withdrawal = Withdrawal {
            amount: 3,
            ..Default::default()
        };
        assert_eq!(withdrawal.amount_wei(), U256::from(3_000_000_000u64));
    }
}
