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

//! Primitives for substrate extrinsics.

use crate::{
	account_of, verify, Balance, Era, Error, ExtrinsicAddress, Hash, Nonce, Result,
	SignaturePayload, SignedExtensionLayout, TaggedSignature, EXTRINSIC_FORMAT_VERSION,
};
use codec::{Compact, Decode, Encode, Error as CodecError, Input, Output};
use sp_crypto_hashing::blake2_256;
use sp_runtime::MultiAddress;

/// Bit set on the version byte of a signed extrinsic.
const SIGNED_BIT: u8 = 0b1000_0000;

/// An extrinsic without signature: `Compact(len) ++ version ++ call`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedExtrinsic {
	pub version: u8,
	pub call: Vec<u8>,
}

impl UnsignedExtrinsic {
	pub fn new(version: u8, call: Vec<u8>) -> Self {
		Self { version, call }
	}
}

impl Encode for UnsignedExtrinsic {
	fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
		let mut inner = Vec::with_capacity(1 + self.call.len());
		inner.push(self.version & !SIGNED_BIT);
		inner.extend_from_slice(&self.call);
		inner.encode_to(dest);
	}
}

impl Decode for UnsignedExtrinsic {
	fn decode<I: Input>(input: &mut I) -> core::result::Result<Self, CodecError> {
		let inner: Vec<u8> = Decode::decode(input)?;
		let (version, call) = inner.split_first().ok_or("empty extrinsic")?;
		if version & SIGNED_BIT != 0 {
			return Err("extrinsic is signed".into())
		}
		Ok(Self { version: *version, call: call.to_vec() })
	}
}

/// A fully signed extrinsic, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedExtrinsic {
	pub version: u8,
	pub address: ExtrinsicAddress,
	pub signature: TaggedSignature,
	pub era: Era,
	pub nonce: Nonce,
	pub tip: Balance,
	pub extensions: SignedExtensionLayout,
	pub call: Vec<u8>,
}

impl SignedExtrinsic {
	/// Decode the wire form. The signed extension layout is not part of the bytes
	/// and has to be supplied.
	pub fn decode_with_layout(bytes: &[u8], extensions: SignedExtensionLayout) -> Result<Self> {
		let inner: Vec<u8> = Decode::decode(&mut &bytes[..])?;
		let input = &mut &inner[..];

		let version_byte = input.read_byte()?;
		if version_byte & SIGNED_BIT == 0 {
			return Err(Error::InvalidInput("extrinsic is not signed".into()))
		}
		let address = ExtrinsicAddress::decode(input)?;
		let signature = TaggedSignature::decode(input)?;
		let era = Era::decode(input)?;
		let nonce = Compact::<Nonce>::decode(input)?.0;
		let tip = Compact::<Balance>::decode(input)?.0;
		if extensions.asset_tip && Option::<u32>::decode(input)?.is_some() {
			return Err(Error::InvalidInput("asset id must be None".into()))
		}
		if extensions.metadata_hash_check && u8::decode(input)? != 0 {
			return Err(Error::InvalidInput("metadata hash check must be disabled".into()))
		}

		Ok(Self {
			version: version_byte & !SIGNED_BIT,
			address,
			signature,
			era,
			nonce,
			tip,
			extensions,
			call: input.to_vec(),
		})
	}

	/// The transaction hash the node reports for this extrinsic.
	pub fn hash(&self) -> Hash {
		Hash::from(blake2_256(&self.encode()))
	}

	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.encode()))
	}
}

impl Encode for SignedExtrinsic {
	fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
		let mut inner = Vec::with_capacity(1 + 33 + 66 + 16 + self.call.len());
		inner.push(self.version | SIGNED_BIT);
		self.address.encode_to(&mut inner);
		self.signature.encode_to(&mut inner);
		self.extensions.encode_extra(&self.era, self.nonce, self.tip, &mut inner);
		inner.extend_from_slice(&self.call);
		inner.encode_to(dest);
	}
}

/// Combine an unsigned extrinsic, the signer's public key and a signature into
/// a signed extrinsic.
///
/// Era, nonce, tip and call are taken from the payload the signature was made over.
pub fn attach(
	unsigned: &UnsignedExtrinsic,
	signer_public: &[u8],
	signature: TaggedSignature,
	payload: &SignaturePayload,
) -> Result<SignedExtrinsic> {
	if unsigned.version != payload.version {
		return Err(Error::ExtrinsicVersionMismatch {
			unsigned: unsigned.version,
			payload: payload.version,
		})
	}
	if payload.version != EXTRINSIC_FORMAT_VERSION {
		return Err(Error::UnsupportedExtrinsicVersion(payload.version))
	}
	if unsigned.call != payload.method {
		return Err(Error::CallMismatch)
	}

	let account = account_of(signature.scheme(), signer_public)?;
	if account != payload.address {
		return Err(Error::SignerMismatch {
			signer: account.to_string(),
			payload: payload.address.to_string(),
		})
	}
	if !verify(&signature, &payload.to_sign(), &account) {
		return Err(Error::BadSignature)
	}

	let extrinsic = SignedExtrinsic {
		version: payload.version,
		address: MultiAddress::Id(account),
		signature,
		era: payload.era,
		nonce: payload.nonce,
		tip: payload.tip,
		extensions: payload.extensions,
		call: payload.method.clone(),
	};
	log::info!("assembled signed extrinsic {:?}", extrinsic.hash());
	Ok(extrinsic)
}
