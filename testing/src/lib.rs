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

//! A fake node answering the chain state queries of the build stage.

use codec::Encode;
use serde_json::{json, Value};
use substrate_xt_pipeline::{
	config::BuildConfig,
	rpc::RpcClientMock,
	xt_node_api::test_utils::{test_metadata, SignedExtensions},
	BlockSelection,
};
use xt_primitives::Hash;

pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
pub const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

pub const GENESIS_HASH: &str = "0x9999999999999999999999999999999999999999999999999999999999999999";
pub const FINALIZED_HASH: &str =
	"0x1111111111111111111111111111111111111111111111111111111111111111";
pub const FINALIZED_NUMBER: u64 = 1000;
pub const BIRTH_HASH: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";
pub const SPEC_VERSION: u32 = 268;
pub const TRANSACTION_VERSION: u32 = 2;

pub fn hash(hex: &str) -> Hash {
	serde_json::from_value(json!(hex)).expect("fixture hashes are valid")
}

pub struct MockNode {
	pub nonce: u32,
	pub extensions: SignedExtensions,
	/// Height of the finalized block.
	pub block_number: u64,
}

impl Default for MockNode {
	fn default() -> Self {
		Self { nonce: 3, extensions: SignedExtensions::Default, block_number: FINALIZED_NUMBER }
	}
}

impl MockNode {
	/// A client whose answers describe one finalized block, at height 1000 unless
	/// configured otherwise.
	pub fn client(&self) -> RpcClientMock {
		let client = RpcClientMock::default();
		client.update_entry("chain_getFinalizedHead", json!(FINALIZED_HASH));
		client.update_entry("chain_getBlockHash", json!(GENESIS_HASH));
		client.update_entry("chain_getHeader", header(self.block_number));
		client.update_entry("state_getRuntimeVersion", runtime_version());
		client.update_entry(
			"state_getMetadata",
			json!(format!("0x{}", hex::encode(test_metadata(self.extensions).encode()))),
		);
		client.update_entry("state_call", json!(format!("0x{}", hex::encode(self.nonce.encode()))));
		client
	}
}

fn header(number: u64) -> Value {
	json!({
		"parentHash": GENESIS_HASH,
		"number": format!("{number:#x}"),
		"stateRoot": GENESIS_HASH,
		"extrinsicsRoot": GENESIS_HASH,
		"digest": { "logs": [] }
	})
}

fn runtime_version() -> Value {
	json!({
		"specName": "node",
		"implName": "node",
		"authoringVersion": 1,
		"specVersion": SPEC_VERSION,
		"implVersion": 0,
		"apis": [],
		"transactionVersion": TRANSACTION_VERSION,
		"stateVersion": 1
	})
}

/// `Balances.transfer(Bob, amount)` signed by Alice.
pub fn transfer_to_bob(amount: u128) -> BuildConfig {
	BuildConfig {
		account: ALICE.into(),
		module: "Balances".into(),
		method: "transfer".into(),
		args: vec![json!(BOB), json!(amount)],
		tip: 0,
		era_period: 0,
		block: BlockSelection::Finalized,
		include_metadata: false,
	}
}
