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

use crate::rpc::Error as RpcClientError;
use core::fmt;
use xt_node_api::{CallError, InvalidMetadataError};
use xt_primitives::Error as PrimitivesError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, derive_more::From)]
pub enum Error {
	/// A chain state query failed. Carries the node's answer.
	#[from(ignore)]
	ChainStateUnavailable { query: &'static str, source: RpcClientError },
	/// The node answered a state query, but not with what was asked for.
	#[from(ignore)]
	UnexpectedChainState { query: &'static str, reason: String },
	/// The node refused the extrinsic. Carries the node's answer.
	#[from(ignore)]
	SubmissionRejected(RpcClientError),
	/// Call could not be resolved or its arguments not encoded.
	Call(CallError),
	/// Invalid Metadata Error.
	InvalidMetadata(InvalidMetadataError),
	/// Era, payload, signing or assembly failed.
	Primitives(PrimitivesError),
	/// Encode / Decode Error.
	Codec(codec::Error),
	/// Malformed bundle, config or hex input.
	#[from(ignore)]
	InvalidInput(String),
}

/// The failure classes an operator has to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	UnknownCall,
	ArgumentTypeMismatch,
	InvalidEra,
	MissingField,
	InvalidSecret,
	UnsupportedScheme,
	ExtrinsicVersionMismatch,
	ChainStateUnavailable,
	SubmissionRejected,
	InvalidInput,
	SignerMismatch,
	BadSignature,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::ChainStateUnavailable { .. } | Error::UnexpectedChainState { .. } =>
				ErrorKind::ChainStateUnavailable,
			Error::SubmissionRejected(_) => ErrorKind::SubmissionRejected,
			Error::Call(CallError::UnknownCall(_)) => ErrorKind::UnknownCall,
			Error::Call(_) => ErrorKind::ArgumentTypeMismatch,
			Error::Primitives(error) => match error {
				PrimitivesError::InvalidEra(_) => ErrorKind::InvalidEra,
				PrimitivesError::MissingField(_) => ErrorKind::MissingField,
				PrimitivesError::InvalidSecret(..) => ErrorKind::InvalidSecret,
				PrimitivesError::UnsupportedScheme(_) => ErrorKind::UnsupportedScheme,
				PrimitivesError::ExtrinsicVersionMismatch { .. } |
				PrimitivesError::UnsupportedExtrinsicVersion(_) =>
					ErrorKind::ExtrinsicVersionMismatch,
				PrimitivesError::SignerMismatch { .. } => ErrorKind::SignerMismatch,
				PrimitivesError::BadSignature => ErrorKind::BadSignature,
				PrimitivesError::CallMismatch |
				PrimitivesError::InvalidInput(_) |
				PrimitivesError::Codec(_) => ErrorKind::InvalidInput,
			},
			Error::InvalidMetadata(_) | Error::Codec(_) | Error::InvalidInput(_) =>
				ErrorKind::InvalidInput,
		}
	}

	pub(crate) fn chain_state(query: &'static str) -> impl FnOnce(RpcClientError) -> Self {
		move |source| Error::ChainStateUnavailable { query, source }
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::ChainStateUnavailable { query, source } =>
				write!(f, "could not read {query} from node: {source}"),
			Error::UnexpectedChainState { query, reason } =>
				write!(f, "unexpected {query} from node: {reason}"),
			Error::SubmissionRejected(source) => write!(f, "node rejected extrinsic: {source}"),
			Error::Call(error) => write!(f, "{error}"),
			Error::InvalidMetadata(error) => write!(f, "invalid metadata: {error}"),
			Error::Primitives(error) => write!(f, "{error}"),
			Error::Codec(error) => write!(f, "codec error: {error}"),
			Error::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
		}
	}
}

impl core::error::Error for Error {
	fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
		match self {
			Error::ChainStateUnavailable { source, .. } => Some(source),
			Error::SubmissionRejected(source) => Some(source),
			Error::Call(error) => Some(error),
			Error::InvalidMetadata(error) => Some(error),
			Error::Primitives(error) => Some(error),
			Error::Codec(error) => Some(error),
			Error::UnexpectedChainState { .. } | Error::InvalidInput(_) => None,
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}
