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

//! Chain independent type definitions.

use crate::{Error, Result};
use sp_core::crypto::Ss58Codec;

pub type Hash = sp_core::H256;
pub type AccountId = sp_runtime::AccountId32;
pub type BlockNumber = u64;
pub type Nonce = u64;
pub type Balance = u128;

/// Pallet index followed by the call variant index.
pub type CallIndex = [u8; 2];

/// The address form used in signed extrinsics. Only the `Id` variant is ever produced.
pub type ExtrinsicAddress = sp_runtime::MultiAddress<AccountId, ()>;

/// The only extrinsic format version that can be signed and assembled.
pub const EXTRINSIC_FORMAT_VERSION: u8 = 4;

/// Signature payloads longer than this are hashed with blake2_256 before signing.
pub const MAX_PLAIN_PAYLOAD_LEN: usize = 256;

/// Parse an account given either as SS58 string or as `0x` prefixed 32 byte hex.
pub fn parse_account(input: &str) -> Result<AccountId> {
	let input = input.trim();
	if input.starts_with("0x") {
		let bytes = impl_serde::serialize::from_hex(input)
			.map_err(|e| Error::InvalidInput(format!("account `{input}`: {e}")))?;
		let raw: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
			Error::InvalidInput(format!("account must be 32 bytes, got {}", bytes.len()))
		})?;
		return Ok(AccountId::new(raw))
	}
	AccountId::from_ss58check(input)
		.map_err(|e| Error::InvalidInput(format!("account `{input}`: {e:?}")))
}
