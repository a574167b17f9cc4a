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

//! Signer used to sign signature payloads.
//!
//! Keypairs are derived from a secret for the duration of a single [`sign`] call
//! and are never stored or logged.

use crate::{AccountId, Error, Result};
use codec::{Decode, Encode, Input, Output};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use sp_core::{ecdsa, ed25519, sr25519, Pair};
use sp_runtime::{
	traits::{IdentifyAccount, Verify},
	MultiSignature, MultiSigner,
};
use zeroize::Zeroizing;

/// The supported signature schemes. The discriminant is the tag byte in front
/// of a signature on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SignatureScheme {
	#[codec(index = 0)]
	Ed25519 = 0,
	#[codec(index = 1)]
	Sr25519 = 1,
	#[codec(index = 2)]
	Ecdsa = 2,
}

impl SignatureScheme {
	pub fn tag(self) -> u8 {
		self as u8
	}

	pub fn from_tag(tag: u8) -> Result<Self> {
		match tag {
			0 => Ok(Self::Ed25519),
			1 => Ok(Self::Sr25519),
			2 => Ok(Self::Ecdsa),
			other => Err(Error::UnsupportedScheme(format!("tag {other:#04x}"))),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Ed25519 => "ed25519",
			Self::Sr25519 => "sr25519",
			Self::Ecdsa => "ecdsa",
		}
	}

	/// Length of a raw signature, without the tag byte.
	pub fn signature_len(self) -> usize {
		match self {
			Self::Ed25519 | Self::Sr25519 => 64,
			Self::Ecdsa => 65,
		}
	}
}

impl FromStr for SignatureScheme {
	type Err = Error;

	fn from_str(name: &str) -> Result<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"ed25519" => Ok(Self::Ed25519),
			"sr25519" => Ok(Self::Sr25519),
			"ecdsa" => Ok(Self::Ecdsa),
			_ => Err(Error::UnsupportedScheme(name.to_string())),
		}
	}
}

impl TryFrom<String> for SignatureScheme {
	type Error = Error;

	fn try_from(name: String) -> Result<Self> {
		name.parse()
	}
}

impl fmt::Display for SignatureScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A raw signature together with its scheme.
///
/// Encodes as the scheme tag followed by the raw signature bytes, which is the
/// same layout as a `MultiSignature`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSignature {
	scheme: SignatureScheme,
	#[serde(with = "impl_serde::serialize")]
	bytes: Vec<u8>,
}

impl TaggedSignature {
	pub fn new(scheme: SignatureScheme, bytes: Vec<u8>) -> Result<Self> {
		if bytes.len() != scheme.signature_len() {
			return Err(Error::InvalidInput(format!(
				"{scheme} signature must be {} bytes, got {}",
				scheme.signature_len(),
				bytes.len()
			)))
		}
		Ok(Self { scheme, bytes })
	}

	pub fn scheme(&self) -> SignatureScheme {
		self.scheme
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn to_multi_signature(&self) -> Result<MultiSignature> {
		Ok(MultiSignature::decode(&mut self.encode().as_slice())?)
	}
}

impl Encode for TaggedSignature {
	fn size_hint(&self) -> usize {
		1 + self.bytes.len()
	}

	fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
		dest.push_byte(self.scheme.tag());
		dest.write(&self.bytes);
	}
}

impl Decode for TaggedSignature {
	fn decode<I: Input>(input: &mut I) -> core::result::Result<Self, codec::Error> {
		let scheme = SignatureScheme::from_tag(input.read_byte()?)
			.map_err(|_| codec::Error::from("unknown signature scheme tag"))?;
		let mut bytes = vec![0u8; scheme.signature_len()];
		input.read(&mut bytes)?;
		Ok(Self { scheme, bytes })
	}
}

impl From<MultiSignature> for TaggedSignature {
	fn from(signature: MultiSignature) -> Self {
		let (scheme, bytes) = match signature {
			MultiSignature::Ed25519(s) => (SignatureScheme::Ed25519, s.0.to_vec()),
			MultiSignature::Sr25519(s) => (SignatureScheme::Sr25519, s.0.to_vec()),
			MultiSignature::Ecdsa(s) => (SignatureScheme::Ecdsa, s.0.to_vec()),
		};
		Self { scheme, bytes }
	}
}

/// Trait to be implemented by anything that can sign signature payloads.
pub trait SignExtrinsic {
	fn scheme(&self) -> SignatureScheme;

	/// Sign the given payload bytes, which are expected to be `SignaturePayload::to_sign`.
	fn sign(&self, payload: &[u8]) -> TaggedSignature;

	/// Raw public key. 33 bytes for ecdsa (compressed), 32 otherwise.
	fn public(&self) -> Vec<u8>;

	fn public_account_id(&self) -> AccountId;
}

/// A keypair of one of the supported schemes, derived from a secret.
pub enum ExtrinsicSigner {
	Ed25519(ed25519::Pair),
	Sr25519(sr25519::Pair),
	Ecdsa(ecdsa::Pair),
}

impl ExtrinsicSigner {
	/// Accepts a raw `0x` hex seed, a BIP-39 mnemonic or a secret URI such as
	/// `//Alice` or `<phrase>//hard/soft///password`.
	pub fn from_secret(scheme: SignatureScheme, secret: &str) -> Result<Self> {
		let invalid = |e: sp_core::crypto::SecretStringError| {
			Error::InvalidSecret(scheme, format!("{e:?}"))
		};
		Ok(match scheme {
			SignatureScheme::Ed25519 =>
				Self::Ed25519(ed25519::Pair::from_string(secret, None).map_err(invalid)?),
			SignatureScheme::Sr25519 =>
				Self::Sr25519(sr25519::Pair::from_string(secret, None).map_err(invalid)?),
			SignatureScheme::Ecdsa =>
				Self::Ecdsa(ecdsa::Pair::from_string(secret, None).map_err(invalid)?),
		})
	}

	fn multi_signer(&self) -> MultiSigner {
		match self {
			Self::Ed25519(pair) => pair.public().into(),
			Self::Sr25519(pair) => pair.public().into(),
			Self::Ecdsa(pair) => pair.public().into(),
		}
	}
}

impl SignExtrinsic for ExtrinsicSigner {
	fn scheme(&self) -> SignatureScheme {
		match self {
			Self::Ed25519(_) => SignatureScheme::Ed25519,
			Self::Sr25519(_) => SignatureScheme::Sr25519,
			Self::Ecdsa(_) => SignatureScheme::Ecdsa,
		}
	}

	fn sign(&self, payload: &[u8]) -> TaggedSignature {
		let signature: MultiSignature = match self {
			Self::Ed25519(pair) => pair.sign(payload).into(),
			Self::Sr25519(pair) => pair.sign(payload).into(),
			Self::Ecdsa(pair) => pair.sign(payload).into(),
		};
		signature.into()
	}

	fn public(&self) -> Vec<u8> {
		match self {
			Self::Ed25519(pair) => pair.public().0.to_vec(),
			Self::Sr25519(pair) => pair.public().0.to_vec(),
			Self::Ecdsa(pair) => pair.public().0.to_vec(),
		}
	}

	fn public_account_id(&self) -> AccountId {
		self.multi_signer().into_account()
	}
}

/// Result of a signing operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignOutput {
	pub scheme: SignatureScheme,
	pub signature: TaggedSignature,
	pub public: Vec<u8>,
}

/// Sign `message` with the keypair derived from `secret`.
///
/// Ed25519 and ecdsa signatures are deterministic, sr25519 signatures are not.
/// The keypair is dropped before returning.
pub fn sign(secret: &str, scheme: SignatureScheme, message: &[u8]) -> Result<SignOutput> {
	let secret = Zeroizing::new(secret.trim().to_owned());
	let signer = ExtrinsicSigner::from_secret(scheme, &secret)?;
	let signature = signer.sign(message);
	log::debug!("signed {} byte payload with {}", message.len(), scheme);
	Ok(SignOutput { scheme, signature, public: signer.public() })
}

/// Derive the account id of a raw public key.
///
/// For ecdsa this is the blake2_256 hash of the compressed public key.
pub fn account_of(scheme: SignatureScheme, public: &[u8]) -> Result<AccountId> {
	let wrong_len = |_| {
		Error::InvalidInput(format!("{} bytes is not a valid {scheme} public key", public.len()))
	};
	let signer: MultiSigner = match scheme {
		SignatureScheme::Ed25519 => ed25519::Public::try_from(public).map_err(wrong_len)?.into(),
		SignatureScheme::Sr25519 => sr25519::Public::try_from(public).map_err(wrong_len)?.into(),
		SignatureScheme::Ecdsa => ecdsa::Public::try_from(public).map_err(wrong_len)?.into(),
	};
	Ok(signer.into_account())
}

/// Check a tagged signature over `message` against an account id.
pub fn verify(signature: &TaggedSignature, message: &[u8], account: &AccountId) -> bool {
	match signature.to_multi_signature() {
		Ok(signature) => signature.verify(message, account),
		Err(_) => false,
	}
}
