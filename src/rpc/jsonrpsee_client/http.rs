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

use super::{map_client_error, RpcParamsWrapper};
use crate::rpc::{Request, Result, RpcParams};
use async_trait::async_trait;
use jsonrpsee::{
	core::client::ClientT,
	http_client::{HttpClient, HttpClientBuilder},
};
use log::*;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Plain HTTP rpc client. Answers requests, but cannot subscribe.
#[derive(Clone)]
pub struct JsonrpseeHttpClient {
	inner: Arc<HttpClient>,
}

impl JsonrpseeHttpClient {
	/// No connection is made until the first request.
	pub fn with_url(url: &Url) -> Result<Self> {
		debug!("using http endpoint {}", url);
		let client = HttpClientBuilder::default().build(url.as_str()).map_err(map_client_error)?;
		Ok(Self { inner: Arc::new(client) })
	}
}

#[async_trait]
impl Request for JsonrpseeHttpClient {
	async fn request<R: DeserializeOwned + Send>(
		&self,
		method: &str,
		params: RpcParams,
	) -> Result<R> {
		debug!("rpc request {} over http", method);
		self.inner
			.request(method, RpcParamsWrapper(params))
			.await
			.map_err(map_client_error)
	}
}
