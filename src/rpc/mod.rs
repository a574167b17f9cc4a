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

//! Client side of the node's JSON-RPC interface.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use error::{Error, Result};

#[cfg(feature = "jsonrpsee-client")]
pub use jsonrpsee_client::{JsonrpseeClient, JsonrpseeHttpClient, NodeClient};
#[cfg(feature = "jsonrpsee-client")]
pub mod jsonrpsee_client;

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockSubscription, RpcClientMock};
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub mod error;

/// Trait to be implemented by the rpc client for sending rpc requests.
#[async_trait]
pub trait Request {
	/// Sends a RPC request to the substrate node and returns the deserialized answer.
	async fn request<R: DeserializeOwned + Send>(&self, method: &str, params: RpcParams)
		-> Result<R>;
}

/// Trait to be implemented by the rpc client for subscribing to the substrate node.
#[async_trait]
pub trait Subscribe {
	type Subscription<Notification>: HandleSubscription<Notification>
	where
		Notification: DeserializeOwned + Send;

	async fn subscribe<Notification: DeserializeOwned + Send>(
		&self,
		sub: &str,
		params: RpcParams,
		unsub: &str,
	) -> Result<Self::Subscription<Notification>>;
}

/// Trait to use the full functionality of a subscription returned by [`Subscribe`].
#[async_trait]
pub trait HandleSubscription<Notification: DeserializeOwned + Send>: Send {
	/// Returns the next notification from the stream.
	/// This may return `None` if the subscription has been terminated,
	/// which may happen if the channel becomes full or is dropped.
	async fn next(&mut self) -> Option<Result<Notification>>;

	/// Unsubscribe and consume the subscription.
	async fn unsubscribe(self) -> Result<()>;
}

/// Positional parameters of a rpc request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcParams(Vec<Value>);

impl RpcParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a plain value into the parameter list.
	pub fn insert<P: Serialize>(&mut self, value: P) -> Result<()> {
		self.0.push(serde_json::to_value(value)?);
		Ok(())
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Finish the building process and return a JSON array string,
	/// or `None` for a request without parameters.
	pub fn build(self) -> Option<String> {
		if self.0.is_empty() {
			return None
		}
		Some(Value::Array(self.0).to_string())
	}

	pub fn into_inner(self) -> Vec<Value> {
		self.0
	}
}

/// Build [`RpcParams`] from a list of serializable values.
///
/// Evaluates to `rpc::Result<RpcParams>`, failing if a value can not be serialized.
#[macro_export]
macro_rules! rpc_params {
	($($param:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut params = $crate::rpc::RpcParams::new();
		#[allow(unused_mut)]
		let mut outcome: $crate::rpc::Result<()> = Ok(());
		$(
			if outcome.is_ok() {
				outcome = params.insert($param);
			}
		)*
		outcome.map(|_| params)
	}};
}
