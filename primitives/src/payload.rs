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

//! The payload a signer commits to.
//!
//! The flattened byte form follows the node's signed extension order:
//! the extra data (era, nonce, tip and optional extensions) is appended to the
//! call, followed by the additional signed data (versions, genesis hash and the
//! mortality checkpoint).

use crate::{
	serde_impls::scale_hex, AccountId, Balance, BlockNumber, Era, Error, Hash, Nonce, Result,
	MAX_PLAIN_PAYLOAD_LEN,
};
use codec::{Compact, Decode, Encode};
use serde::{Deserialize, Serialize};
use sp_crypto_hashing::blake2_256;

/// Optional signed extensions whose presence changes the payload layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedExtensionLayout {
	/// `ChargeAssetTxPayment` instead of `ChargeTransactionPayment`: the tip is
	/// followed by an optional asset id, which is always `None`.
	pub asset_tip: bool,
	/// `CheckMetadataHash`: a mode byte in the extra and an optional metadata
	/// hash in the additional signed data. Always disabled.
	pub metadata_hash_check: bool,
}

impl SignedExtensionLayout {
	/// Signed extensions whose extra and additional signed data the payload encodes.
	pub const KNOWN_EXTENSIONS: &'static [&'static str] = &[
		"CheckNonZeroSender",
		"CheckSpecVersion",
		"CheckTxVersion",
		"CheckGenesis",
		"CheckMortality",
		"CheckEra",
		"CheckNonce",
		"CheckWeight",
		"ChargeTransactionPayment",
		"ChargeAssetTxPayment",
		"CheckMetadataHash",
	];

	pub fn is_known(identifier: &str) -> bool {
		Self::KNOWN_EXTENSIONS.contains(&identifier)
	}

	/// Derive the layout from the signed extension identifiers a node declares in its metadata.
	/// Identifiers outside [`Self::KNOWN_EXTENSIONS`] are skipped, the caller has to make
	/// sure they add no data.
	pub fn from_identifiers<'a>(identifiers: impl IntoIterator<Item = &'a str>) -> Self {
		identifiers.into_iter().fold(Self::default(), |mut layout, identifier| {
			match identifier {
				"ChargeAssetTxPayment" => layout.asset_tip = true,
				"CheckMetadataHash" => layout.metadata_hash_check = true,
				_ => {},
			}
			layout
		})
	}

	/// Era, nonce, tip and the optional extension data. This is also the part of
	/// a signed extrinsic between signature and call.
	pub fn encode_extra(&self, era: &Era, nonce: Nonce, tip: Balance, out: &mut Vec<u8>) {
		era.encode_to(out);
		Compact(nonce).encode_to(out);
		Compact(tip).encode_to(out);
		if self.asset_tip {
			None::<u32>.encode_to(out);
		}
		if self.metadata_hash_check {
			// Mode::Disabled
			0u8.encode_to(out);
		}
	}

	fn encode_additional_signed(
		&self,
		spec_version: u32,
		transaction_version: u32,
		genesis_hash: &Hash,
		checkpoint: &Hash,
		out: &mut Vec<u8>,
	) {
		spec_version.encode_to(out);
		transaction_version.encode_to(out);
		genesis_hash.encode_to(out);
		checkpoint.encode_to(out);
		if self.metadata_hash_check {
			None::<Hash>.encode_to(out);
		}
	}
}

/// A chain state snapshot where every field may still be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialChainState {
	pub address: Option<AccountId>,
	pub block_hash: Option<Hash>,
	pub block_number: Option<BlockNumber>,
	pub genesis_hash: Option<Hash>,
	pub nonce: Option<Nonce>,
	pub version: Option<u8>,
	pub spec_version: Option<u32>,
	pub transaction_version: Option<u32>,
}

/// Chain state read at a single block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainState {
	pub address: AccountId,
	pub block_hash: Hash,
	pub block_number: BlockNumber,
	pub genesis_hash: Hash,
	pub nonce: Nonce,
	/// Extrinsic format version.
	pub version: u8,
	pub spec_version: u32,
	pub transaction_version: u32,
}

impl PartialChainState {
	pub fn complete(self) -> Result<ChainState> {
		Ok(ChainState {
			address: self.address.ok_or(Error::MissingField("address"))?,
			block_hash: self.block_hash.ok_or(Error::MissingField("blockHash"))?,
			block_number: self.block_number.ok_or(Error::MissingField("blockNumber"))?,
			genesis_hash: self.genesis_hash.ok_or(Error::MissingField("genesisHash"))?,
			nonce: self.nonce.ok_or(Error::MissingField("nonce"))?,
			version: self.version.ok_or(Error::MissingField("version"))?,
			spec_version: self.spec_version.ok_or(Error::MissingField("specVersion"))?,
			transaction_version: self
				.transaction_version
				.ok_or(Error::MissingField("transactionVersion"))?,
		})
	}
}

impl From<ChainState> for PartialChainState {
	fn from(state: ChainState) -> Self {
		Self {
			address: Some(state.address),
			block_hash: Some(state.block_hash),
			block_number: Some(state.block_number),
			genesis_hash: Some(state.genesis_hash),
			nonce: Some(state.nonce),
			version: Some(state.version),
			spec_version: Some(state.spec_version),
			transaction_version: Some(state.transaction_version),
		}
	}
}

/// Everything a signer commits to. Read-only once built.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
	pub address: AccountId,
	/// Mortality checkpoint. Equals `genesis_hash` for immortal transactions.
	pub block_hash: Hash,
	pub genesis_hash: Hash,
	pub nonce: Nonce,
	#[serde(with = "impl_serde::serialize")]
	pub method: Vec<u8>,
	#[serde(with = "scale_hex")]
	pub era: Era,
	pub tip: Balance,
	pub version: u8,
	pub spec_version: u32,
	pub transaction_version: u32,
	#[serde(default)]
	pub extensions: SignedExtensionLayout,
}

impl SignaturePayload {
	/// Build the payload for an already encoded call.
	///
	/// Does not check that the chain state fields stem from one block; that is up to the caller.
	/// For a mortal era the chain state block must be the era's birth block, since its hash
	/// is the mortality checkpoint.
	pub fn build(
		method: Vec<u8>,
		era: Era,
		chain_state: PartialChainState,
		tip: Balance,
		extensions: SignedExtensionLayout,
	) -> Result<Self> {
		let state = chain_state.complete()?;
		if !era.is_normalized() {
			return Err(Error::InvalidEra(format!("{era:?} is not a normalized era")))
		}
		if !era.is_immortal() && era.birth(state.block_number) != state.block_number {
			return Err(Error::MissingField("birthBlockHash"))
		}
		let block_hash = if era.is_immortal() { state.genesis_hash } else { state.block_hash };
		let payload = Self {
			address: state.address,
			block_hash,
			genesis_hash: state.genesis_hash,
			nonce: state.nonce,
			method,
			era,
			tip,
			version: state.version,
			spec_version: state.spec_version,
			transaction_version: state.transaction_version,
			extensions,
		};
		log::debug!("signature payload: 0x{}", hex::encode(payload.encoded()));
		Ok(payload)
	}

	/// The flattened payload bytes.
	pub fn encoded(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(self.method.len() + 128);
		out.extend_from_slice(&self.method);
		self.extensions.encode_extra(&self.era, self.nonce, self.tip, &mut out);
		self.extensions.encode_additional_signed(
			self.spec_version,
			self.transaction_version,
			&self.genesis_hash,
			&self.block_hash,
			&mut out,
		);
		out
	}

	/// The bytes that actually get signed: `encoded()`, hashed if it is longer than 256 bytes.
	pub fn to_sign(&self) -> Vec<u8> {
		let encoded = self.encoded();
		if encoded.len() > MAX_PLAIN_PAYLOAD_LEN {
			blake2_256(&encoded).to_vec()
		} else {
			encoded
		}
	}
}
