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

//! What travels between the stages. A build bundle can be carried to an
//! air-gapped machine, signed there, and the sign bundle carried back.

use crate::api::{Error, Result};
use codec::{Decode, DecodeAll, Encode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use xt_node_api::Metadata;
use xt_primitives::{
	serde_impls::{option_bytes, scale_hex},
	Error as PrimitivesError, SignOutput, SignatureScheme, SignaturePayload, TaggedSignature,
	UnsignedExtrinsic,
};

/// Output of the build stage.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildBundle {
	pub signature_payload: SignaturePayload,
	/// The exact bytes to sign.
	#[serde(with = "impl_serde::serialize")]
	pub to_sign: Vec<u8>,
	#[serde(with = "scale_hex")]
	pub unsigned_extrinsic: UnsignedExtrinsic,
	/// SCALE encoded node metadata, only present if requested at build time.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "option_bytes")]
	pub metadata: Option<Vec<u8>>,
}

impl BuildBundle {
	pub fn new(
		signature_payload: SignaturePayload,
		unsigned_extrinsic: UnsignedExtrinsic,
		metadata: Option<&Metadata>,
	) -> Self {
		Self {
			to_sign: signature_payload.to_sign(),
			signature_payload,
			unsigned_extrinsic,
			metadata: metadata.map(Encode::encode),
		}
	}

	/// A bundle is consistent if `to_sign` is derived from the payload and the
	/// unsigned extrinsic carries the payload's call.
	pub fn verify_consistency(&self) -> Result<()> {
		if self.to_sign != self.signature_payload.to_sign() {
			return Err(Error::InvalidInput("toSign does not match the signature payload".into()))
		}
		if self.unsigned_extrinsic.call != self.signature_payload.method {
			return Err(PrimitivesError::CallMismatch.into())
		}
		Ok(())
	}

	/// The embedded metadata, decoded.
	pub fn metadata(&self) -> Result<Option<Metadata>> {
		self.metadata
			.as_ref()
			.map(|bytes| Metadata::decode_all(&mut &bytes[..]).map_err(Error::from))
			.transpose()
	}
}

/// Output of the sign stage.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignBundle {
	pub scheme: SignatureScheme,
	/// Raw signature, without the scheme tag.
	#[serde(with = "impl_serde::serialize")]
	pub signature: Vec<u8>,
	#[serde(with = "impl_serde::serialize")]
	pub public: Vec<u8>,
}

impl SignBundle {
	pub fn tagged_signature(&self) -> Result<TaggedSignature> {
		Ok(TaggedSignature::new(self.scheme, self.signature.clone())?)
	}
}

/// A bundle passed between stages, written as JSON or as hex of its SCALE encoding.
pub trait Bundle: Serialize + DeserializeOwned + Encode + Decode {
	/// Fail with a more specific error than "malformed" before the JSON is decoded.
	fn check_json(_json: &serde_json::Value) -> Result<()> {
		Ok(())
	}

	/// Same as [`Bundle::check_json`], for the SCALE bytes.
	fn check_encoded(_bytes: &[u8]) -> Result<()> {
		Ok(())
	}
}

impl Bundle for BuildBundle {}

impl Bundle for SignBundle {
	fn check_json(json: &serde_json::Value) -> Result<()> {
		if let Some(scheme) = json.get("scheme").and_then(serde_json::Value::as_str) {
			scheme.parse::<SignatureScheme>()?;
		}
		Ok(())
	}

	fn check_encoded(bytes: &[u8]) -> Result<()> {
		// The scheme tag comes first.
		if let Some(tag) = bytes.first() {
			SignatureScheme::from_tag(*tag)?;
		}
		Ok(())
	}
}

impl From<SignOutput> for SignBundle {
	fn from(output: SignOutput) -> Self {
		Self {
			scheme: output.scheme,
			signature: output.signature.as_bytes().to_vec(),
			public: output.public,
		}
	}
}

/// How bundles are written. Reading detects the format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
	/// Pretty printed JSON, bytes as `0x` hex strings.
	#[default]
	Json,
	/// `0x` hex string of the SCALE encoding.
	Hex,
}

pub fn encode_bundle<T: Bundle>(bundle: &T, format: BundleFormat) -> Result<String> {
	match format {
		BundleFormat::Json => serde_json::to_string_pretty(bundle)
			.map_err(|e| Error::InvalidInput(format!("cannot serialize bundle: {e}"))),
		BundleFormat::Hex => Ok(format!("0x{}", hex::encode(bundle.encode()))),
	}
}

pub fn decode_bundle<T: Bundle>(input: &str) -> Result<T> {
	let malformed = |e: serde_json::Error| Error::InvalidInput(format!("malformed bundle: {e}"));
	let input = input.trim();
	if input.starts_with('{') {
		let json: serde_json::Value = serde_json::from_str(input).map_err(malformed)?;
		T::check_json(&json)?;
		serde_json::from_value(json).map_err(malformed)
	} else if let Some(hex) = input.strip_prefix("0x") {
		let bytes = hex::decode(hex)
			.map_err(|e| Error::InvalidInput(format!("malformed bundle hex: {e}")))?;
		T::check_encoded(&bytes)?;
		Ok(T::decode_all(&mut &bytes[..])?)
	} else {
		Err(Error::InvalidInput("bundle is neither JSON nor 0x prefixed hex".into()))
	}
}
