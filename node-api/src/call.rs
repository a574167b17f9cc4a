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

//! Resolve a call by pallet and call name and encode its arguments.

use crate::{
	encode::{encode_value_as_type, EncodeError},
	metadata::{Metadata, MetadataError},
	value::Value,
};
use codec::{Encode, Output};
use log::debug;
use xt_primitives::CallIndex;

/// A call resolved against the metadata: `[pallet index, call index] ++ arguments`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedCall {
	call_index: CallIndex,
	args: Vec<u8>,
}

impl EncodedCall {
	pub fn new(call_index: CallIndex, args: Vec<u8>) -> Self {
		Self { call_index, args }
	}

	pub fn call_index(&self) -> CallIndex {
		self.call_index
	}

	pub fn pallet_index(&self) -> u8 {
		self.call_index[0]
	}

	/// The concatenated argument encodings.
	pub fn args(&self) -> &[u8] {
		&self.args
	}
}

impl Encode for EncodedCall {
	fn size_hint(&self) -> usize {
		2 + self.args.len()
	}

	fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
		dest.write(&self.call_index);
		dest.write(&self.args);
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
	#[error(transparent)]
	UnknownCall(#[from] MetadataError),
	#[error("{pallet}.{call} takes {expected} arguments, got {actual}")]
	ArgumentCountMismatch { pallet: String, call: String, expected: usize, actual: usize },
	#[error("argument {index} ({name}) of {pallet}.{call}: {source}")]
	ArgumentTypeMismatch {
		pallet: String,
		call: String,
		index: usize,
		name: String,
		source: EncodeError,
	},
}

/// Encode the call `pallet.call(args..)` with the argument types the metadata declares.
///
/// Arguments are positional. Pallet and call names are matched exactly first and
/// then case insensitive, ignoring underscores.
pub fn encode_call(
	metadata: &Metadata,
	pallet: &str,
	call: &str,
	args: &[Value],
) -> Result<EncodedCall, CallError> {
	let pallet_metadata = metadata.pallet_by_name_err(pallet)?;
	let variant = pallet_metadata.call_variant_by_name_err(call)?;

	if variant.fields.len() != args.len() {
		return Err(CallError::ArgumentCountMismatch {
			pallet: pallet_metadata.name().to_string(),
			call: variant.name.clone(),
			expected: variant.fields.len(),
			actual: args.len(),
		})
	}

	let mut encoded_args = Vec::new();
	for (index, (field, arg)) in variant.fields.iter().zip(args).enumerate() {
		encode_value_as_type(arg, field.ty.id, metadata.types(), &mut encoded_args).map_err(
			|source| CallError::ArgumentTypeMismatch {
				pallet: pallet_metadata.name().to_string(),
				call: variant.name.clone(),
				index,
				name: field.name.clone().unwrap_or_else(|| format!("#{index}")),
				source,
			},
		)?;
	}

	let encoded = EncodedCall::new([pallet_metadata.index(), variant.index], encoded_args);
	debug!(
		"encoded call {}.{}: 0x{}",
		pallet_metadata.name(),
		variant.name,
		hex::encode(encoded.encode())
	);
	Ok(encoded)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{test_metadata, BalancesCall, SignedExtensions, SystemCall};
	use sp_runtime::{AccountId32, MultiAddress};

	const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

	fn transfer_args(amount: u128) -> Vec<Value> {
		vec![Value::string(BOB), Value::uint(amount)]
	}

	#[test]
	fn balances_transfer_resolves_to_0500() {
		let metadata = test_metadata(SignedExtensions::Default);
		let call = encode_call(&metadata, "Balances", "transfer", &transfer_args(1000)).unwrap();

		let bob = <AccountId32 as sp_core::crypto::Ss58Codec>::from_ss58check(BOB).unwrap();
		let expected = BalancesCall::transfer { dest: MultiAddress::Id(bob), value: 1000 };
		assert_eq!(call.call_index(), [5, 0]);
		assert_eq!(call.encode(), [vec![5u8], expected.encode()].concat());
	}

	#[test]
	fn encoding_is_deterministic() {
		let metadata = test_metadata(SignedExtensions::Default);
		let encode = || encode_call(&metadata, "balances", "transferKeepAlive", &transfer_args(7));
		let first = encode().unwrap();
		let second = encode().unwrap();
		assert_eq!(first, second);
		assert_eq!(first.call_index(), [5, 3]);
	}

	#[test]
	fn remark_accepts_text_and_hex() {
		let metadata = test_metadata(SignedExtensions::Default);
		let text = encode_call(&metadata, "System", "remark", &[Value::string("hi")]).unwrap();
		let hex = encode_call(&metadata, "System", "remark", &[Value::string("0x6869")]).unwrap();

		assert_eq!(text, hex);
		let remark = SystemCall::remark { remark: b"hi".to_vec() };
		assert_eq!(text.encode(), [vec![0u8], remark.encode()].concat());
	}

	#[test]
	fn unknown_pallet_or_call_is_unknown_call() {
		let metadata = test_metadata(SignedExtensions::Default);
		assert!(matches!(
			encode_call(&metadata, "Staking", "bond", &[]),
			Err(CallError::UnknownCall(MetadataError::PalletNameNotFound(_)))
		));
		assert!(matches!(
			encode_call(&metadata, "Balances", "burn", &[]),
			Err(CallError::UnknownCall(MetadataError::CallNotFound { .. }))
		));
	}

	#[test]
	fn wrong_argument_count_is_rejected() {
		let metadata = test_metadata(SignedExtensions::Default);
		assert!(matches!(
			encode_call(&metadata, "Balances", "transfer", &[Value::string(BOB)]),
			Err(CallError::ArgumentCountMismatch { expected: 2, actual: 1, .. })
		));
	}

	#[test]
	fn argument_of_wrong_type_names_the_argument() {
		let metadata = test_metadata(SignedExtensions::Default);
		let args = [Value::string(BOB), Value::bool(true)];
		let result = encode_call(&metadata, "Balances", "transfer", &args);
		assert!(matches!(
			result,
			Err(CallError::ArgumentTypeMismatch { index: 1, ref name, .. }) if name == "value"
		));
	}
}
