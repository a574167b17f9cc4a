/*
   Copyright 2019 Supercomputing Systems AG

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.

*/

//! Serde helpers for wire types that travel as hex strings in json bundles.

/// (De)serialize any SCALE codec type as `0x` prefixed hex of its encoding.
///
/// Use with `#[serde(with = "xt_primitives::serde_impls::scale_hex")]`.
pub mod scale_hex {
	use codec::{Decode, DecodeAll, Encode};
	use serde::{Deserializer, Serializer};

	pub fn serialize<T: Encode, S: Serializer>(
		value: &T,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		impl_serde::serialize::serialize(&value.encode(), serializer)
	}

	pub fn deserialize<'de, T: Decode, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<T, D::Error> {
		let bytes = impl_serde::serialize::deserialize(deserializer)?;
		T::decode_all(&mut &bytes[..]).map_err(serde::de::Error::custom)
	}
}

/// `Option<Vec<u8>>` as optional hex string.
pub mod option_bytes {
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(
		value: &Option<Vec<u8>>,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		match value {
			Some(bytes) => impl_serde::serialize::serialize(bytes, serializer),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<Vec<u8>>, D::Error> {
		Option::<String>::deserialize(deserializer)?
			.map(|hex| impl_serde::serialize::from_hex(&hex).map_err(serde::de::Error::custom))
			.transpose()
	}
}
