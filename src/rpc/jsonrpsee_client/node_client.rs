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

//! A client for whatever transport the endpoint names.

use super::{JsonrpseeClient, JsonrpseeHttpClient, SubscriptionWrapper};
use crate::rpc::{Error, Request, Result, RpcParams, Subscribe};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

/// Websocket for `ws`/`wss` endpoints, HTTP for `http`/`https` ones.
/// Only the websocket variant can subscribe.
#[derive(Clone)]
pub enum NodeClient {
	Ws(JsonrpseeClient),
	Http(JsonrpseeHttpClient),
}

impl NodeClient {
	pub async fn connect(url: &Url) -> Result<Self> {
		match url.scheme() {
			"ws" | "wss" => Ok(NodeClient::Ws(JsonrpseeClient::with_url(url).await?)),
			"http" | "https" => Ok(NodeClient::Http(JsonrpseeHttpClient::with_url(url)?)),
			other => Err(Error::Url(format!("unsupported scheme `{other}`"))),
		}
	}

	pub fn supports_subscriptions(&self) -> bool {
		matches!(self, NodeClient::Ws(_))
	}
}

#[async_trait]
impl Request for NodeClient {
	async fn request<R: DeserializeOwned + Send>(
		&self,
		method: &str,
		params: RpcParams,
	) -> Result<R> {
		match self {
			NodeClient::Ws(client) => client.request(method, params).await,
			NodeClient::Http(client) => client.request(method, params).await,
		}
	}
}

#[async_trait]
impl Subscribe for NodeClient {
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
		match self {
			NodeClient::Ws(client) => client.subscribe(sub, params, unsub).await,
			NodeClient::Http(_) => Err(Error::SubscriptionUnsupported),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{Api, ErrorKind, SubmitAndWatch};
	use serde_json::Value;

	#[tokio::test]
	async fn http_endpoint_gets_a_client_that_cannot_subscribe() {
		let url = Url::parse("http://127.0.0.1:9933").unwrap();
		let client = NodeClient::connect(&url).await.unwrap();
		assert!(!client.supports_subscriptions());

		let result = client
			.subscribe::<Value>("chain_subscribeNewHeads", RpcParams::new(), "unsub")
			.await;
		assert!(matches!(result, Err(Error::SubscriptionUnsupported)));
	}

	#[tokio::test]
	async fn watching_over_http_fails_before_submission() {
		let url = Url::parse("https://rpc.example.org").unwrap();
		let api = Api::new(NodeClient::connect(&url).await.unwrap());

		let error = api.submit_and_watch_extrinsic(vec![4, 5, 0]).await.err().unwrap();
		assert_eq!(error.kind(), ErrorKind::InvalidInput);
	}

	#[tokio::test]
	async fn other_schemes_are_rejected() {
		let url = Url::parse("ftp://127.0.0.1").unwrap();
		assert!(matches!(NodeClient::connect(&url).await, Err(Error::Url(_))));
	}
}
