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

//! In-memory stand-in for a node, answering requests from a method keyed table.
//! Answers registered for specific parameters take precedence.

use crate::rpc::{Error, HandleSubscription, Request, Result, RpcParams, Subscribe};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
	collections::{HashMap, VecDeque},
	marker::PhantomData,
	sync::{PoisonError, RwLock},
};

type MethodKey = String;

#[derive(Debug, Clone)]
enum MockResponse {
	Value(Value),
	Error(String),
}

#[derive(Debug, Clone, Default)]
struct MockStream {
	notifications: Vec<Value>,
	/// Keep the stream open after the last notification instead of closing it.
	stall: bool,
}

/// Answers `request` from a table of canned JSON responses. Every request is
/// recorded together with its parameters.
#[derive(Debug, Default)]
pub struct RpcClientMock {
	responses: RwLock<HashMap<MethodKey, MockResponse>>,
	responses_by_params: RwLock<HashMap<(MethodKey, String), Value>>,
	streams: RwLock<HashMap<MethodKey, MockStream>>,
	requests: RwLock<Vec<(MethodKey, Option<String>)>>,
}

impl RpcClientMock {
	pub fn new(state: HashMap<MethodKey, Value>) -> Self {
		let responses =
			state.into_iter().map(|(method, value)| (method, MockResponse::Value(value))).collect();
		Self { responses: RwLock::new(responses), ..Default::default() }
	}

	pub fn update_entry(&self, key: &str, value: Value) {
		let mut lock = self.responses.write().unwrap_or_else(PoisonError::into_inner);
		lock.insert(key.to_string(), MockResponse::Value(value));
	}

	/// Answer `key` with `value` only when called with exactly `params` (as JSON, e.g. `[1000]`).
	pub fn update_entry_for(&self, key: &str, params: &str, value: Value) {
		let mut lock = self.responses_by_params.write().unwrap_or_else(PoisonError::into_inner);
		lock.insert((key.to_string(), params.to_string()), value);
	}

	/// Let the node answer `key` with a JSON-RPC error.
	pub fn update_error(&self, key: &str, message: &str) {
		let mut lock = self.responses.write().unwrap_or_else(PoisonError::into_inner);
		lock.insert(key.to_string(), MockResponse::Error(message.to_string()));
	}

	/// Notifications sent on a subscription to `key`. With `stall` the stream stays
	/// open after the last notification, like a node that never finalizes.
	pub fn update_subscription(&self, key: &str, notifications: Vec<Value>, stall: bool) {
		let mut lock = self.streams.write().unwrap_or_else(PoisonError::into_inner);
		lock.insert(key.to_string(), MockStream { notifications, stall });
	}

	/// All requests and subscriptions received so far, with their JSON parameters.
	pub fn requests(&self) -> Vec<(String, Option<String>)> {
		self.requests.read().unwrap_or_else(PoisonError::into_inner).clone()
	}

	/// Parameters of every request sent to `method`.
	pub fn params_of(&self, method: &str) -> Vec<Option<String>> {
		self.requests()
			.into_iter()
			.filter(|(key, _)| key == method)
			.map(|(_, params)| params)
			.collect()
	}

	fn record(&self, method: &str, params: RpcParams) -> Option<String> {
		let params = params.build();
		let mut lock = self.requests.write().unwrap_or_else(PoisonError::into_inner);
		lock.push((method.to_string(), params.clone()));
		params
	}

	fn rejection(&self, method: &str) -> Option<String> {
		match self.responses.read().unwrap_or_else(PoisonError::into_inner).get(method) {
			Some(MockResponse::Error(message)) => Some(message.clone()),
			_ => None,
		}
	}

	fn response(&self, method: &str, params: Option<&str>) -> Result<Value> {
		if let Some(params) = params {
			let by_params = self.responses_by_params.read().unwrap_or_else(PoisonError::into_inner);
			if let Some(value) = by_params.get(&(method.to_string(), params.to_string())) {
				return Ok(value.clone())
			}
		}
		let lock = self.responses.read().unwrap_or_else(PoisonError::into_inner);
		match lock.get(method) {
			Some(MockResponse::Value(value)) => Ok(value.clone()),
			Some(MockResponse::Error(message)) => Err(Error::Node(message.clone())),
			None => Err(Error::Node(format!("-32601: Method not found: {method}"))),
		}
	}
}

#[async_trait]
impl Request for RpcClientMock {
	async fn request<R: DeserializeOwned + Send>(
		&self,
		method: &str,
		params: RpcParams,
	) -> Result<R> {
		let params = self.record(method, params);
		let response = self.response(method, params.as_deref())?;
		Ok(serde_json::from_value(response)?)
	}
}

#[async_trait]
impl Subscribe for RpcClientMock {
	type Subscription<Notification>
		= MockSubscription<Notification>
	where
		Notification: DeserializeOwned + Send;

	async fn subscribe<Notification: DeserializeOwned + Send>(
		&self,
		sub: &str,
		params: RpcParams,
		_unsub: &str,
	) -> Result<Self::Subscription<Notification>> {
		self.record(sub, params);
		if let Some(message) = self.rejection(sub) {
			return Err(Error::Node(message))
		}

		let stream = self
			.streams
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(sub)
			.cloned()
			.unwrap_or_default();
		Ok(MockSubscription {
			notifications: stream.notifications.into(),
			stall: stream.stall,
			_phantom: PhantomData,
		})
	}
}

#[derive(Debug)]
pub struct MockSubscription<Notification> {
	notifications: VecDeque<Value>,
	stall: bool,
	_phantom: PhantomData<fn() -> Notification>,
}

#[async_trait]
impl<Notification: DeserializeOwned + Send> HandleSubscription<Notification>
	for MockSubscription<Notification>
{
	async fn next(&mut self) -> Option<Result<Notification>> {
		match self.notifications.pop_front() {
			Some(value) => Some(serde_json::from_value(value).map_err(Error::from)),
			None if self.stall => futures_util::future::pending().await,
			None => None,
		}
	}

	async fn unsubscribe(self) -> Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[tokio::test]
	async fn canned_response_is_returned_and_request_recorded() {
		let client = RpcClientMock::default();
		client.update_entry("chain_getFinalizedHead", json!("0x01"));

		let head: String = client
			.request("chain_getFinalizedHead", crate::rpc_params![].unwrap())
			.await
			.unwrap();
		assert_eq!(head, "0x01");
		assert_eq!(client.params_of("chain_getFinalizedHead"), vec![None]);
	}

	#[tokio::test]
	async fn answer_for_specific_params_takes_precedence() {
		let client = RpcClientMock::default();
		client.update_entry("chain_getBlockHash", json!("0x00"));
		client.update_entry_for("chain_getBlockHash", "[1000]", json!("0x03e8"));

		let birth: String = client
			.request("chain_getBlockHash", crate::rpc_params![1000u64].unwrap())
			.await
			.unwrap();
		let genesis: String = client
			.request("chain_getBlockHash", crate::rpc_params![0u32].unwrap())
			.await
			.unwrap();
		assert_eq!((birth.as_str(), genesis.as_str()), ("0x03e8", "0x00"));
	}

	#[tokio::test]
	async fn error_entry_surfaces_node_message() {
		let client = RpcClientMock::default();
		client.update_error("author_submitExtrinsic", "1010: Invalid Transaction");

		let result: Result<String> =
			client.request("author_submitExtrinsic", crate::rpc_params!["0x00"].unwrap()).await;
		assert!(matches!(result, Err(Error::Node(message)) if message.contains("1010")));
	}

	#[tokio::test]
	async fn subscription_closes_after_last_notification() {
		let client = RpcClientMock::default();
		client.update_subscription("sub", vec![json!("ready"), json!(1)], false);

		let mut subscription: MockSubscription<Value> =
			client.subscribe("sub", RpcParams::new(), "unsub").await.unwrap();
		assert_eq!(subscription.next().await.unwrap().unwrap(), json!("ready"));
		assert_eq!(subscription.next().await.unwrap().unwrap(), json!(1));
		assert!(subscription.next().await.is_none());
	}
}
