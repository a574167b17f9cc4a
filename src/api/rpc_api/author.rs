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

//! Extrinsic submission and status watching.

use crate::{
	api::{Api, Error, ExtrinsicReport, Result, TransactionStatus, WatchOutcome, XtStatus},
	rpc::{Error as RpcClientError, HandleSubscription, Request, RpcParams, Subscribe},
	rpc_params,
};
use async_trait::async_trait;
use log::*;
use sp_crypto_hashing::blake2_256;
use std::time::Duration;
use xt_primitives::Hash;

pub type Status = TransactionStatus<Hash, Hash>;

pub type TransactionSubscriptionFor<Client> = <Client as Subscribe>::Subscription<Status>;

/// Simple extrinsic submission without any subscription.
#[async_trait]
pub trait SubmitExtrinsic {
	/// Submit an extrinsic to the substrate node, without watching.
	/// Returns the extrinsic hash.
	async fn submit_extrinsic(&self, encoded_extrinsic: Vec<u8>) -> Result<Hash>;
}

#[async_trait]
impl<Client> SubmitExtrinsic for Api<Client>
where
	Client: Request + Send + Sync,
{
	async fn submit_extrinsic(&self, encoded_extrinsic: Vec<u8>) -> Result<Hash> {
		let hex_encoded_xt = format!("0x{}", hex::encode(&encoded_extrinsic));
		debug!("sending extrinsic: {}", hex_encoded_xt);
		let xt_hash = self
			.client()
			.request("author_submitExtrinsic", submission_params(hex_encoded_xt)?)
			.await
			.map_err(Error::SubmissionRejected)?;
		info!("extrinsic {:?} submitted", xt_hash);
		Ok(xt_hash)
	}
}

#[async_trait]
pub trait SubmitAndWatch {
	type Subscription: HandleSubscription<Status>;

	/// Submit an extrinsic and return a cancellable stream of its status updates.
	async fn submit_and_watch_extrinsic(
		&self,
		encoded_extrinsic: Vec<u8>,
	) -> Result<TransactionWatch<Self::Subscription>>;

	/// Submit an extrinsic and watch it until the desired status is reached,
	/// the pool gives up on it or `timeout` expires.
	async fn submit_and_watch_extrinsic_until(
		&self,
		encoded_extrinsic: Vec<u8>,
		watch_until: XtStatus,
		timeout: Option<Duration>,
	) -> Result<ExtrinsicReport>;
}

#[async_trait]
impl<Client> SubmitAndWatch for Api<Client>
where
	Client: Subscribe + Send + Sync,
{
	type Subscription = TransactionSubscriptionFor<Client>;

	async fn submit_and_watch_extrinsic(
		&self,
		encoded_extrinsic: Vec<u8>,
	) -> Result<TransactionWatch<Self::Subscription>> {
		let tx_hash = Hash::from(blake2_256(&encoded_extrinsic));
		let hex_encoded_xt = format!("0x{}", hex::encode(&encoded_extrinsic));
		debug!("sending extrinsic for watching: {}", hex_encoded_xt);
		let subscription = self
			.client()
			.subscribe::<Status>(
				"author_submitAndWatchExtrinsic",
				submission_params(hex_encoded_xt)?,
				"author_unwatchExtrinsic",
			)
			.await
			.map_err(|e| match e {
				// Nothing was sent to the node.
				RpcClientError::SubscriptionUnsupported => Error::InvalidInput(e.to_string()),
				e => Error::SubmissionRejected(e),
			})?;
		info!("extrinsic {:?} submitted, watching", tx_hash);
		Ok(TransactionWatch::new(tx_hash, subscription))
	}

	async fn submit_and_watch_extrinsic_until(
		&self,
		encoded_extrinsic: Vec<u8>,
		watch_until: XtStatus,
		timeout: Option<Duration>,
	) -> Result<ExtrinsicReport> {
		let watch = self.submit_and_watch_extrinsic(encoded_extrinsic).await?;
		Ok(watch.watch_until(watch_until, timeout).await)
	}
}

/// Status stream of one submitted extrinsic. Dropping or cancelling it stops
/// the watch; the extrinsic itself stays in the pool.
pub struct TransactionWatch<Subscription> {
	tx_hash: Hash,
	subscription: Subscription,
	last_status: Option<Status>,
}

impl<Subscription: HandleSubscription<Status>> TransactionWatch<Subscription> {
	pub fn new(tx_hash: Hash, subscription: Subscription) -> Self {
		Self { tx_hash, subscription, last_status: None }
	}

	pub fn tx_hash(&self) -> Hash {
		self.tx_hash
	}

	pub fn last_status(&self) -> Option<&Status> {
		self.last_status.as_ref()
	}

	/// Next status update, `None` once the node closed the stream.
	pub async fn next_status(&mut self) -> Option<crate::rpc::Result<Status>> {
		let next = self.subscription.next().await;
		if let Some(Ok(status)) = &next {
			info!("extrinsic {:?}: {:?}", self.tx_hash, status);
			self.last_status = Some(status.clone());
		}
		next
	}

	/// Stop watching.
	pub async fn cancel(self) -> crate::rpc::Result<()> {
		self.subscription.unsubscribe().await
	}

	/// Watch until `target` is reached or the pool gives up on the extrinsic.
	///
	/// Running into `timeout` or a closed stream is not a failure: the outcome
	/// is then [`WatchOutcome::Unknown`], as the extrinsic may still be included.
	pub async fn watch_until(
		mut self,
		target: XtStatus,
		timeout: Option<Duration>,
	) -> ExtrinsicReport {
		let outcome = match timeout {
			Some(limit) => {
				let watched = tokio::time::timeout(limit, self.watch(target)).await;
				watched.unwrap_or_else(|_| {
					warn!(
						"extrinsic {:?} did not reach {} within {:?}, outcome unknown",
						self.tx_hash, target, limit
					);
					WatchOutcome::Unknown
				})
			},
			None => self.watch(target).await,
		};

		let report = ExtrinsicReport::new(self.tx_hash, self.last_status.clone(), outcome);
		if let Err(e) = self.subscription.unsubscribe().await {
			debug!("could not unsubscribe from extrinsic {:?}: {}", report.extrinsic_hash, e);
		}
		report
	}

	async fn watch(&mut self, target: XtStatus) -> WatchOutcome {
		while let Some(status) = self.next_status().await {
			let status = match status {
				Ok(status) => status,
				Err(e) => {
					warn!("extrinsic {:?}: unreadable status update: {}", self.tx_hash, e);
					return WatchOutcome::Unknown
				},
			};
			if status.reached_status(target) {
				return WatchOutcome::Reached
			}
			match status {
				TransactionStatus::Dropped => return WatchOutcome::Dropped,
				TransactionStatus::Invalid => return WatchOutcome::Invalid,
				TransactionStatus::Usurped(_) => return WatchOutcome::Usurped,
				TransactionStatus::FinalityTimeout(_) => {
					warn!("extrinsic {:?}: node stopped watching for finality", self.tx_hash);
					return WatchOutcome::Unknown
				},
				_ => {},
			}
		}
		warn!("status stream of extrinsic {:?} closed before reaching {}", self.tx_hash, target);
		WatchOutcome::Unknown
	}
}

fn submission_params(hex_encoded_xt: String) -> Result<RpcParams> {
	rpc_params![hex_encoded_xt].map_err(|e| Error::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{api::ErrorKind, rpc::RpcClientMock};
	use serde_json::json;

	const BLOCK: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";

	fn block() -> Hash {
		serde_json::from_value(json!(BLOCK)).unwrap()
	}

	#[tokio::test]
	async fn submit_returns_node_hash() {
		let client = RpcClientMock::default();
		client.update_entry("author_submitExtrinsic", json!(BLOCK));
		let api = Api::new(client);

		let hash = api.submit_extrinsic(vec![4, 5, 0]).await.unwrap();
		assert_eq!(hash, block());
		assert_eq!(
			api.client().params_of("author_submitExtrinsic"),
			vec![Some("[\"0x040500\"]".to_string())]
		);
	}

	#[tokio::test]
	async fn rejection_is_submission_rejected() {
		let client = RpcClientMock::default();
		client.update_error(
			"author_submitExtrinsic",
			"1010: Invalid Transaction: Inability to pay some fees",
		);
		let api = Api::new(client);

		let error = api.submit_extrinsic(vec![4]).await.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::SubmissionRejected);
		assert!(error.to_string().contains("Inability to pay some fees"));
	}

	#[tokio::test]
	async fn watch_reaches_finalized() {
		let client = RpcClientMock::default();
		client.update_subscription(
			"author_submitAndWatchExtrinsic",
			vec![json!("ready"), json!({ "inBlock": BLOCK }), json!({ "finalized": BLOCK })],
			false,
		);
		let api = Api::new(client);

		let report = api
			.submit_and_watch_extrinsic_until(vec![4, 5, 0], XtStatus::Finalized, None)
			.await
			.unwrap();
		assert_eq!(report.outcome, WatchOutcome::Reached);
		assert_eq!(report.block_hash, Some(block()));
		assert_eq!(report.extrinsic_hash, Hash::from(blake2_256(&[4, 5, 0])));
	}

	#[tokio::test]
	async fn watch_stops_at_in_block_when_asked() {
		let client = RpcClientMock::default();
		client.update_subscription(
			"author_submitAndWatchExtrinsic",
			vec![json!("ready"), json!({ "inBlock": BLOCK })],
			true,
		);
		let api = Api::new(client);

		let report = api
			.submit_and_watch_extrinsic_until(
				vec![1],
				XtStatus::InBlock,
				Some(Duration::from_secs(5)),
			)
			.await
			.unwrap();
		assert_eq!(report.outcome, WatchOutcome::Reached);
		assert_eq!(report.status, Some(Status::InBlock(block())));
	}

	#[tokio::test]
	async fn timeout_yields_unknown_outcome() {
		let client = RpcClientMock::default();
		client.update_subscription(
			"author_submitAndWatchExtrinsic",
			vec![json!("ready"), json!({ "inBlock": BLOCK })],
			true,
		);
		let api = Api::new(client);

		let report = api
			.submit_and_watch_extrinsic_until(
				vec![1],
				XtStatus::Finalized,
				Some(Duration::from_millis(50)),
			)
			.await
			.unwrap();
		assert_eq!(report.outcome, WatchOutcome::Unknown);
		assert_eq!(report.status, Some(Status::InBlock(block())));
	}

	#[tokio::test]
	async fn closed_stream_yields_unknown_outcome() {
		let client = RpcClientMock::default();
		client.update_subscription("author_submitAndWatchExtrinsic", vec![json!("ready")], false);
		let api = Api::new(client);

		let report =
			api.submit_and_watch_extrinsic_until(vec![1], XtStatus::InBlock, None).await.unwrap();
		assert_eq!(report.outcome, WatchOutcome::Unknown);
	}

	#[tokio::test]
	async fn pool_verdicts_end_the_watch() {
		let client = RpcClientMock::default();
		client.update_subscription(
			"author_submitAndWatchExtrinsic",
			vec![json!("ready"), json!("invalid")],
			true,
		);
		let api = Api::new(client);

		let report =
			api.submit_and_watch_extrinsic_until(vec![1], XtStatus::Finalized, None).await.unwrap();
		assert_eq!(report.outcome, WatchOutcome::Invalid);
	}

	#[tokio::test]
	async fn watch_rejection_is_submission_rejected() {
		let client = RpcClientMock::default();
		client.update_error(
			"author_submitAndWatchExtrinsic",
			"1012: Transaction is temporarily banned",
		);
		let api = Api::new(client);

		let error = api.submit_and_watch_extrinsic(vec![1]).await.err().unwrap();
		assert_eq!(error.kind(), ErrorKind::SubmissionRejected);
	}

	#[tokio::test]
	async fn watch_can_be_cancelled() {
		let client = RpcClientMock::default();
		client.update_subscription("author_submitAndWatchExtrinsic", vec![json!("ready")], true);
		let api = Api::new(client);

		let mut watch = api.submit_and_watch_extrinsic(vec![1]).await.unwrap();
		assert_eq!(watch.next_status().await.unwrap().unwrap(), Status::Ready);
		assert_eq!(watch.last_status(), Some(&Status::Ready));
		watch.cancel().await.unwrap();
	}
}
