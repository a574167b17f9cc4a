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

/// Metadata error originated from inspecting the internal representation of the runtime metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
	/// Pallet is not in metadata.
	#[error("pallet `{0}` not found in metadata")]
	PalletNameNotFound(String),
	/// Pallet index is not in metadata.
	#[error("pallet with index {0} not found in metadata")]
	PalletIndexNotFound(u8),
	#[error("pallet `{0}` has no calls")]
	PalletHasNoCalls(String),
	/// Call is not in metadata.
	#[error("call `{call}` not found in pallet `{pallet}`")]
	CallNotFound { pallet: String, call: String },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMetadataError {
	#[error("metadata has an invalid magic prefix")]
	InvalidPrefix,
	#[error("metadata version is not supported, only V14 and V15 are")]
	InvalidVersion,
	#[error("signed extension `{0}` adds data that cannot be encoded")]
	UnsupportedSignedExtension(String),
}
