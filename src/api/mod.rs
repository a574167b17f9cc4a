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

pub use error::{Error, ErrorKind, Result};
pub use rpc_api::*;

pub mod error;
pub mod rpc_api;

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use xt_primitives::Hash;

/// Node facing half of the pipeline: reads chain state and submits extrinsics.
/// Holds nothing but the rpc client, so one client can serve many pipelines.
#[derive(Clone)]
pub struct Api<Client> {
	client: Client,
}

impl<Client> Api<Client> {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	/// Access the rpc client.
	pub fn client(&self) -> &Client {
		&self.client
	}
}

/// Simplified TransactionStatus to allow the user to choose until when to watch
/// an extrinsic.
// Indexes must match the TransactionStatus::as_u8 from below.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XtStatus {
	Ready = 1,
	Broadcast = 2,
	InBlock = 3,
	Finalized = 6,
}

impl FromStr for XtStatus {
	type Err = String;

	fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace('_', "-").as_str() {
			"ready" => Ok(XtStatus::Ready),
			"broadcast" => Ok(XtStatus::Broadcast),
			"in-block" | "inblock" => Ok(XtStatus::InBlock),
			"finalized" => Ok(XtStatus::Finalized),
			other => Err(format!("unknown watch target: {other}")),
		}
	}
}

impl fmt::Display for XtStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			XtStatus::Ready => "ready",
			XtStatus::Broadcast => "broadcast",
			XtStatus::InBlock => "in-block",
			XtStatus::Finalized => "finalized",
		};
		f.write_str(name)
	}
}

/// Possible transaction status events.
// Copied from `sc-transaction-pool`
// (https://github.com/paritytech/substrate/blob/dddfed3d9260cf03244f15ba3db4edf9af7467e9/client/transaction-pool/api/src/lib.rs)
// as the library pulls in the whole client stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus<Hash, BlockHash> {
	/// Transaction is part of the future queue.
	Future,
	/// Transaction is part of the ready queue.
	Ready,
	/// The transaction has been broadcast to the given peers.
	Broadcast(Vec<String>),
	/// Transaction has been included in block with given hash.
	InBlock(BlockHash),
	/// The block this transaction was included in has been retracted.
	Retracted(BlockHash),
	/// Maximum number of finality watchers has been reached,
	/// old watchers are being removed.
	FinalityTimeout(BlockHash),
	/// Transaction has been finalized by a finality-gadget, e.g GRANDPA
	Finalized(BlockHash),
	/// Transaction has been replaced in the pool, by another transaction
	/// that provides the same tags. (e.g. same (sender, nonce)).
	Usurped(Hash),
	/// Transaction has been dropped from the pool because of the limit.
	Dropped,
	/// Transaction is no longer valid in the current state.
	Invalid,
}

impl<Hash, BlockHash> TransactionStatus<Hash, BlockHash> {
	pub fn as_u8(&self) -> u8 {
		match self {
			TransactionStatus::Future => 0,
			TransactionStatus::Ready => 1,
			TransactionStatus::Broadcast(_) => 2,
			TransactionStatus::InBlock(_) => 3,
			TransactionStatus::Retracted(_) => 4,
			TransactionStatus::FinalityTimeout(_) => 5,
			TransactionStatus::Finalized(_) => 6,
			TransactionStatus::Usurped(_) => 7,
			TransactionStatus::Dropped => 8,
			TransactionStatus::Invalid => 9,
		}
	}

	pub fn is_supported(&self) -> bool {
		matches!(
			self,
			TransactionStatus::Ready
				| TransactionStatus::Broadcast(_)
				| TransactionStatus::InBlock(_)
				| TransactionStatus::FinalityTimeout(_)
				| TransactionStatus::Finalized(_)
		)
	}

	/// Returns true if the input status has been reached (or overreached)
	/// and false in case the status is not yet on the expected level.
	pub fn reached_status(&self, status: XtStatus) -> bool {
		match self {
			TransactionStatus::Retracted(_) => false,
			supported if supported.is_supported() => supported.as_u8() >= status as u8,
			_ => false,
		}
	}

	pub fn block_hash(&self) -> Option<&BlockHash> {
		match self {
			TransactionStatus::InBlock(block_hash)
			| TransactionStatus::Retracted(block_hash)
			| TransactionStatus::FinalityTimeout(block_hash)
			| TransactionStatus::Finalized(block_hash) => Some(block_hash),
			_ => None,
		}
	}
}

/// How a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchOutcome {
	/// The requested status (or a later one) was reached.
	Reached,
	Dropped,
	Invalid,
	/// Replaced by another extrinsic with the same sender and nonce.
	Usurped,
	/// The watch ended without a verdict: it timed out or the stream closed.
	/// The extrinsic may still be included later.
	Unknown,
}

/// Result of watching a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrinsicReport {
	pub extrinsic_hash: Hash,
	pub block_hash: Option<Hash>,
	/// Last status received from the node, if any.
	pub status: Option<TransactionStatus<Hash, Hash>>,
	pub outcome: WatchOutcome,
}

impl ExtrinsicReport {
	pub fn new(
		extrinsic_hash: Hash,
		status: Option<TransactionStatus<Hash, Hash>>,
		outcome: WatchOutcome,
	) -> Self {
		let block_hash = status.as_ref().and_then(|s| s.block_hash().copied());
		Self { extrinsic_hash, block_hash, status, outcome }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use test_case::test_case;

	type Status = TransactionStatus<Hash, Hash>;

	#[test_case(Status::Ready, XtStatus::Ready, true)]
	#[test_case(Status::Ready, XtStatus::InBlock, false)]
	#[test_case(Status::Broadcast(vec![]), XtStatus::Ready, true)]
	#[test_case(Status::InBlock(Hash::zero()), XtStatus::InBlock, true)]
	#[test_case(Status::InBlock(Hash::zero()), XtStatus::Finalized, false)]
	#[test_case(Status::Retracted(Hash::zero()), XtStatus::InBlock, false)]
	#[test_case(Status::Finalized(Hash::zero()), XtStatus::InBlock, true)]
	#[test_case(Status::Finalized(Hash::zero()), XtStatus::Finalized, true)]
	#[test_case(Status::Dropped, XtStatus::Ready, false)]
	#[test_case(Status::Invalid, XtStatus::Finalized, false)]
	fn reached_status_compares_levels(status: Status, target: XtStatus, expected: bool) {
		assert_eq!(status.reached_status(target), expected);
	}

	#[test]
	fn status_notifications_deserialize_from_node_json() {
		let in_block: Status = serde_json::from_str(
			r#"{"inBlock":"0x0101010101010101010101010101010101010101010101010101010101010101"}"#,
		)
		.unwrap();
		assert_eq!(in_block, Status::InBlock(Hash::repeat_byte(1)));

		let ready: Status = serde_json::from_str(r#""ready""#).unwrap();
		assert_eq!(ready, Status::Ready);

		let broadcast: Status = serde_json::from_str(r#"{"broadcast":["peer"]}"#).unwrap();
		assert_eq!(broadcast, Status::Broadcast(vec!["peer".into()]));
	}

	#[test_case("ready", XtStatus::Ready)]
	#[test_case("in-block", XtStatus::InBlock)]
	#[test_case("InBlock", XtStatus::InBlock)]
	#[test_case("finalized", XtStatus::Finalized)]
	fn watch_target_parses(input: &str, expected: XtStatus) {
		assert_eq!(input.parse::<XtStatus>().unwrap(), expected);
	}

	#[test]
	fn report_takes_block_hash_from_status() {
		let report = ExtrinsicReport::new(
			Hash::repeat_byte(2),
			Some(Status::Finalized(Hash::repeat_byte(3))),
			WatchOutcome::Reached,
		);
		assert_eq!(report.block_hash, Some(Hash::repeat_byte(3)));
	}
}
