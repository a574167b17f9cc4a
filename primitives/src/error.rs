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

use crate::SignatureScheme;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid era: {0}")]
	InvalidEra(String),
	#[error("chain state field `{0}` is missing")]
	MissingField(&'static str),
	/// The secret could not be turned into a keypair. Never carries the secret itself.
	#[error("secret is not valid for {0}: {1}")]
	InvalidSecret(SignatureScheme, String),
	#[error("unsupported signature scheme `{0}`")]
	UnsupportedScheme(String),
	#[error("extrinsic version mismatch: unsigned extrinsic v{unsigned}, payload v{payload}")]
	ExtrinsicVersionMismatch { unsigned: u8, payload: u8 },
	#[error("unsupported extrinsic version {0}")]
	UnsupportedExtrinsicVersion(u8),
	#[error("signer account {signer} does not match the payload address {payload}")]
	SignerMismatch { signer: String, payload: String },
	#[error("signature does not verify against the signature payload")]
	BadSignature,
	#[error("call of the unsigned extrinsic differs from the signed method")]
	CallMismatch,
	#[error("invalid input: {0}")]
	InvalidInput(String),
	#[error("codec error: {0}")]
	Codec(#[from] codec::Error),
}
