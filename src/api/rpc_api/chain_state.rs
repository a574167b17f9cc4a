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

//! Chain state the signature payload depends on, read as one snapshot.

use crate::{
	api::{Api, Error, Result},
	rpc::Request,
	rpc_params,
};
use async_trait::async_trait;
use codec::{Decode, Encode};
use log::*;
use serde::{Deserialize, Serialize};
use sp_core::Bytes;
use sp_runtime::traits::{BlakeTwo256, Header as HeaderT};
use sp_version::RuntimeVersion;
use xt_node_api::{InvalidMetadataError, Metadata};
use xt_primitives::{
	AccountId, BlockNumber, Hash, Nonce, PartialChainState, SignedExtensionLayout,
};

pub type Header = sp_runtime::generic::Header<BlockNumber, BlakeTwo256>;

/// Which block the snapshot is pinned to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BlockSelection {
	/// The last finalized block. Cannot be reverted, so the mortality
	/// checkpoint stays valid.
	#[default]
	Finalized,
	/// The best block. Newer, but may be retracted.
	Best,
}

/// Chain state read at a single block hash.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
	pub block_hash: Hash,
	pub block_number: BlockNumber,
	pub genesis_hash: Hash,
	pub runtime_version: RuntimeVersion,
	pub metadata: Metadata,
	pub nonce: Nonce,
}

impl ChainSnapshot {
	/// Payload builder input for `account`.
	pub fn chain_state(&self, account: AccountId) -> PartialChainState {
		PartialChainState {
			address: Some(account),
			block_hash: Some(self.block_hash),
			block_number: Some(self.block_number),
			genesis_hash: Some(self.genesis_hash),
			nonce: Some(self.nonce),
			version: Some(self.metadata.extrinsic_version()),
			spec_version: Some(self.runtime_version.spec_version),
			transaction_version: Some(self.runtime_version.transaction_version),
		}
	}

	pub fn signed_extensions(
		&self,
	) -> core::result::Result<SignedExtensionLayout, InvalidMetadataError> {
		self.metadata.signed_extension_layout()
	}
}

#[async_trait]
pub trait GetChainState {
	async fn genesis_hash(&self) -> Result<Hash>;

	async fn finalized_head(&self) -> Result<Hash>;

	async fn best_head(&self) -> Result<Hash>;

	/// Hash of the canonical block at height `number`.
	async fn block_hash(&self, number: BlockNumber) -> Result<Hash>;

	async fn header(&self, hash: Hash) -> Result<Header>;

	async fn runtime_version(&self, at: Hash) -> Result<RuntimeVersion>;

	async fn metadata(&self, at: Hash) -> Result<Metadata>;

	/// Next nonce of `account`, as the runtime sees it at block `at`.
	async fn account_nonce(&self, account: &AccountId, at: Hash) -> Result<Nonce>;

	/// Pin one block and read every field of the snapshot at its hash.
	async fn snapshot(&self, account: &AccountId, selection: BlockSelection)
		-> Result<ChainSnapshot>;
}

#[async_trait]
impl<Client> GetChainState for Api<Client>
where
	Client: Request + Send + Sync,
{
	async fn genesis_hash(&self) -> Result<Hash> {
		let hash: Option<Hash> = self
			.client()
			.request("chain_getBlockHash", params(rpc_params![0u32])?)
			.await
			.map_err(Error::chain_state("genesis hash"))?;
		hash.ok_or_else(|| unexpected("genesis hash", "node returned null"))
	}

	async fn finalized_head(&self) -> Result<Hash> {
		self.client()
			.request("chain_getFinalizedHead", params(rpc_params![])?)
			.await
			.map_err(Error::chain_state("finalized head"))
	}

	async fn best_head(&self) -> Result<Hash> {
		let hash: Option<Hash> = self
			.client()
			.request("chain_getBlockHash", params(rpc_params![])?)
			.await
			.map_err(Error::chain_state("best head"))?;
		hash.ok_or_else(|| unexpected("best head", "node returned null"))
	}

	async fn block_hash(&self, number: BlockNumber) -> Result<Hash> {
		let hash: Option<Hash> = self
			.client()
			.request("chain_getBlockHash", params(rpc_params![number])?)
			.await
			.map_err(Error::chain_state("block hash"))?;
		hash.ok_or_else(|| unexpected("block hash", format!("no block #{number}")))
	}

	async fn header(&self, hash: Hash) -> Result<Header> {
		let header: Option<Header> = self
			.client()
			.request("chain_getHeader", params(rpc_params![hash])?)
			.await
			.map_err(Error::chain_state("header"))?;
		header.ok_or_else(|| unexpected("header", format!("no header for block {hash:?}")))
	}

	async fn runtime_version(&self, at: Hash) -> Result<RuntimeVersion> {
		self.client()
			.request("state_getRuntimeVersion", params(rpc_params![at])?)
			.await
			.map_err(Error::chain_state("runtime version"))
	}

	async fn metadata(&self, at: Hash) -> Result<Metadata> {
		let bytes: Bytes = self
			.client()
			.request("state_getMetadata", params(rpc_params![at])?)
			.await
			.map_err(Error::chain_state("metadata"))?;
		Metadata::decode(&mut bytes.0.as_slice()).map_err(|e| unexpected("metadata", e.to_string()))
	}

	async fn account_nonce(&self, account: &AccountId, at: Hash) -> Result<Nonce> {
		let encoded_account = format!("0x{}", hex::encode(account.encode()));
		let bytes: Bytes = self
			.client()
			.request(
				"state_call",
				params(rpc_params!["AccountNonceApi_account_nonce", encoded_account, at])?,
			)
			.await
			.map_err(Error::chain_state("account nonce"))?;
		decode_nonce(&bytes.0).ok_or_else(|| {
			let bytes = hex::encode(&bytes.0);
			unexpected("account nonce", format!("cannot decode nonce from 0x{bytes}"))
		})
	}

	async fn snapshot(
		&self,
		account: &AccountId,
		selection: BlockSelection,
	) -> Result<ChainSnapshot> {
		let block_hash = match selection {
			BlockSelection::Finalized => self.finalized_head().await?,
			BlockSelection::Best => self.best_head().await?,
		};
		let header = self.header(block_hash).await?;
		let genesis_hash = self.genesis_hash().await?;
		let runtime_version = self.runtime_version(block_hash).await?;
		let metadata = self.metadata(block_hash).await?;
		let nonce = self.account_nonce(account, block_hash).await?;

		let snapshot = ChainSnapshot {
			block_hash,
			block_number: *header.number(),
			genesis_hash,
			runtime_version,
			metadata,
			nonce,
		};
		info!(
			"chain state snapshot at {:?} (#{}): spec {}, tx {}, nonce {}",
			snapshot.block_hash,
			snapshot.block_number,
			snapshot.runtime_version.spec_version,
			snapshot.runtime_version.transaction_version,
			snapshot.nonce
		);
		Ok(snapshot)
	}
}

/// Frame system nonces are `u32` in most runtimes, `u64` in some.
fn decode_nonce(bytes: &[u8]) -> Option<Nonce> {
	match bytes.len() {
		4 => u32::decode(&mut &bytes[..]).ok().map(Nonce::from),
		8 => u64::decode(&mut &bytes[..]).ok(),
		_ => None,
	}
}

fn params(params: crate::rpc::Result<crate::rpc::RpcParams>) -> Result<crate::rpc::RpcParams> {
	params.map_err(|e| Error::InvalidInput(e.to_string()))
}

fn unexpected(query: &'static str, reason: impl Into<String>) -> Error {
	Error::UnexpectedChainState { query, reason: reason.into() }
}
