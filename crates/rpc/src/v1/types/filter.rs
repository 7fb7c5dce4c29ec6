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

//! RPC log filter.

use common_types::filter::Filter as EthFilter;
use ethereum_types::{H160, H256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{BlockNumber, Log};

/// Variadic value: absent, a single value, or an array of values.
#[derive(Debug, PartialEq, Clone)]
pub enum VariadicValue<T> {
    /// Single
    Single(T),
    /// List
    Multiple(Vec<T>),
    /// None
    Null,
}

impl<'a, T> Deserialize<'a> for VariadicValue<T>
where
    T: serde::de::DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<VariadicValue<T>, D::Error>
    where
        D: Deserializer<'a>,
    {
        let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(VariadicValue::Null);
        }
        serde_json::from_value(value.clone())
            .map(VariadicValue::Single)
            .or_else(|_| serde_json::from_value(value).map(VariadicValue::Multiple))
            .map_err(|err| serde::de::Error::custom(format!("Invalid variadic value: {}", err)))
    }
}

impl<T> VariadicValue<T> {
    fn into_vec(self) -> Option<Vec<T>> {
        match self {
            VariadicValue::Null => None,
            VariadicValue::Single(value) => Some(vec![value]),
            VariadicValue::Multiple(values) => Some(values),
        }
    }
}

/// Filter
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Filter {
    /// From Block
    pub from_block: Option<BlockNumber>,
    /// To Block
    pub to_block: Option<BlockNumber>,
    /// Address
    pub address: Option<VariadicValue<H160>>,
    /// Topics
    pub topics: Option<Vec<VariadicValue<H256>>>,
    /// Limit
    pub limit: Option<usize>,
}

impl From<Filter> for EthFilter {
    fn from(filter: Filter) -> Self {
        let mut topics: Vec<Option<Vec<H256>>> = filter
            .topics
            .into_iter()
            .flatten()
            .map(VariadicValue::into_vec)
            .collect();
        while topics.len() < 4 {
            topics.push(None);
        }
        EthFilter {
            from_block: filter.from_block.unwrap_or_default().into(),
            to_block: filter.to_block.unwrap_or_default().into(),
            address: filter.address.and_then(VariadicValue::into_vec),
            topics,
            limit: filter.limit,
        }
    }
}

/// Result of a `eth_getFilterChanges` poll.
#[derive(Debug, Clone)]
pub enum FilterChanges {
    /// New block hashes since the last poll.
    Hashes(Vec<H256>),
    /// New logs since the last poll.
    Logs(Vec<Log>),
}

impl Serialize for FilterChanges {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            FilterChanges::Hashes(ref hashes) => hashes.serialize(serializer),
            FilterChanges::Logs(ref logs) => logs.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_types::ids::BlockId;

    #[test]
    fn deserializes_single_and_multiple_addresses() {
        let filter: Filter = serde_json::from_str(
            r#"{"address": "0x0000000000000000000000000000000000000001"}"#,
        )
        .unwrap();
        let eth: EthFilter = filter.into();
        assert_eq!(eth.address, Some(vec![H160::from_low_u64_be(1)]));

        let filter: Filter = serde_json::from_str(
            r#"{"address": ["0x0000000000000000000000000000000000000001", "0x0000000000000000000000000000000000000002"]}"#,
        )
        .unwrap();
        let eth: EthFilter = filter.into();
        assert_eq!(eth.address.map(|a| a.len()), Some(2));
    }

    #[test]
    fn null_topics_match_everything() {
        let filter: Filter = serde_json::from_str(r#"{"topics": [null, "0x0000000000000000000000000000000000000000000000000000000000000005"]}"#).unwrap();
        let eth: EthFilter = filter.into();
        assert_eq!(eth.topics.len(), 4);
        assert_eq!(eth.topics[0], None);
        assert_eq!(eth.topics[1], Some(vec![H256::from_low_u64_be(5)]));
        assert_eq!(eth.from_block, BlockId::Latest);
    }
}
