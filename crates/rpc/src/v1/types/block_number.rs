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

//! Block number tag.

use common_types::ids::BlockId;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Represents rpc api block number param.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BlockNumber {
    /// Number
    Num(u64),
    /// Latest block
    Latest,
    /// Earliest block (genesis)
    Earliest,
    /// Pending block (being mined)
    Pending,
    /// The most recent block considered safe by the consensus layer
    Safe,
    /// The most recent finalized block
    Finalized,
}

impl Default for BlockNumber {
    fn default() -> Self {
        BlockNumber::Latest
    }
}

impl From<BlockNumber> for BlockId {
    fn from(number: BlockNumber) -> Self {
        match number {
            BlockNumber::Num(n) => BlockId::Number(n),
            BlockNumber::Latest => BlockId::Latest,
            BlockNumber::Earliest => BlockId::Earliest,
            BlockNumber::Pending => BlockId::Pending,
            BlockNumber::Safe => BlockId::Safe,
            BlockNumber::Finalized => BlockId::Finalized,
        }
    }
}

impl Serialize for BlockNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            BlockNumber::Num(ref x) => serializer.serialize_str(&format!("0x{:x}", x)),
            BlockNumber::Latest => serializer.serialize_str("latest"),
            BlockNumber::Earliest => serializer.serialize_str("earliest"),
            BlockNumber::Pending => serializer.serialize_str("pending"),
            BlockNumber::Safe => serializer.serialize_str("safe"),
            BlockNumber::Finalized => serializer.serialize_str("finalized"),
        }
    }
}

impl<'a> Deserialize<'a> for BlockNumber {
    fn deserialize<D>(deserializer: D) -> Result<BlockNumber, D::Error>
    where
        D: Deserializer<'a>,
    {
        deserializer.deserialize_any(BlockNumberVisitor)
    }
}

struct BlockNumberVisitor;

impl<'a> de::Visitor<'a> for BlockNumberVisitor {
    type Value = BlockNumber;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "a block number or 'latest', 'earliest', 'pending', 'safe' or 'finalized'"
        )
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        match value {
            "latest" => Ok(BlockNumber::Latest),
            "earliest" => Ok(BlockNumber::Earliest),
            "pending" => Ok(BlockNumber::Pending),
            "safe" => Ok(BlockNumber::Safe),
            "finalized" => Ok(BlockNumber::Finalized),
            _ if value.starts_with("0x") => u64::from_str_radix(&value[2..], 16)
                .map(BlockNumber::Num)
                .map_err(|e| de::Error::custom(format!("Invalid block number: {}", e))),
            _ => Err(de::Error::custom(
                "Invalid block number: missing 0x prefix",
            )),
        }
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        self.visit_str(value.as_ref())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(BlockNumber::Num(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tags_and_numbers() {
        let parsed: Vec<BlockNumber> = serde_json::from_str(
            r#"["0xa", "latest", "earliest", "pending", "safe", "finalized"]"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                BlockNumber::Num(10),
                BlockNumber::Latest,
                BlockNumber::Earliest,
                BlockNumber::Pending,
                BlockNumber::Safe,
                BlockNumber::Finalized,
            ]
        );
    }

    #[test]
    fn rejects_bare_decimal_strings() {
        assert!(serde_json::from_str::<BlockNumber>(r#""10""#).is_err());
    }
}
