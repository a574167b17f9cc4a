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

use crate::rpc::{Error, Request, Result, RpcParams, Subscribe};
use async_trait::async_trait;
use jsonrpsee::{
	core::{
		client::{ClientT, Error as ClientError, SubscriptionClientT},
		traits::ToRpcParams,
	},
	ws_client::{WsClient, WsClientBuilder},
};
use log::*;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use std::sync::Arc;
use url::Url;

pub use http::JsonrpseeHttpClient;
pub use node_client::NodeClient;
pub use subscription::SubscriptionWrapper;

mod http;
mod node_client;
mod subscription;

/// Websocket rpc client. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct JsonrpseeClient {
	inner: Arc<WsClient>,
}

impl JsonrpseeClient {
	pub async fn new(url: &str) -> Result<Self> {
		let url = Url::parse(url)?;
		Self::with_url(&url).await
	}

	pub async fn with_default_url() -> Result<Self> {
		Self::new("ws://127.0.0.1:9944").await
	}

	pub async fn with_url(url: &Url) -> Result<Self> {
		debug!("connecting to {}", url);
		let client = WsClientBuilder::default()
			.max_buffer_capacity_per_subscription(4096)
			.build(url.as_str())
			.await
			.map_err(map_client_error)?;
		Ok(Self { inner: Arc::new(client) })
	}
}

#[async_trait]
impl Request for JsonrpseeClient {
	async fn request<R: DeserializeOwned + Send>(
		&self,
		method: &str,
		params: RpcParams,
	) -> Result<R> {
		debug!("rpc request {}", method);
		self.inner
			.request(method, RpcParamsWrapper(params))
			.await
			.map_err(map_client_error)
	}
}

#[async_trait]
impl Subscribe for JsonrpseeClient {
	type Subscription<Notification>
		= SubscriptionWrapper<Notification>
	where
		Notification: DeserializeOwned + Send;

	async fn subscribe<Notification: DeserializeOwned + Send>(
		&self,
		sub: &str,
		params: RpcParams,
		unsub: &str,
	) -> Result<Self::Subscription<Notification>> {
		debug!("rpc subscribe {}", sub);
		self.inner
			.subscribe(sub, RpcParamsWrapper(params), unsub)
			.await
			.map(|sub| sub.into())
			.map_err(map_client_error)
	}
}

/// Keep error objects sent by the node readable, box everything else.
pub(crate) fn map_client_error(error: ClientError) -> Error {
	match error {
		ClientError::Call(object) => match object.data() {
			Some(data) => Error::Node(format!("{}: {} {}", object.code(), object.message(), data)),
			None => Error::Node(format!("{}: {}", object.code(), object.message())),
		},
		other => Error::Client(Box::new(other)),
	}
}

struct RpcParamsWrapper(RpcParams);

impl ToRpcParams for RpcParamsWrapper {
	fn to_rpc_params(self) -> core::result::Result<Option<Box<RawValue>>, serde_json::Error> {
		if let Some(json) = self.0.build() {
			RawValue::from_string(json).map(Some)
		} else {
			Ok(None)
		}
	}
}
