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

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Serde json error: {0}")]
	Serde(serde_json::error::Error),
	#[error("Could not convert to valid Url: {0}")]
	Url(String),
	/// The node answered with a JSON-RPC error object.
	#[error("Node responded with error: {0}")]
	Node(String),
	#[error("Subscription was closed unexpectedly")]
	ConnectionClosed,
	#[error("Subscriptions need a websocket endpoint")]
	SubscriptionUnsupported,
	#[error(transparent)]
	Client(#[from] Box<dyn core::error::Error + Send + Sync + 'static>),
}

impl From<serde_json::error::Error> for Error {
	fn from(error: serde_json::error::Error) -> Self {
		Self::Serde(error)
	}
}

impl From<url::ParseError> for Error {
	fn from(error: url::ParseError) -> Self {
		Self::Url(format!("{:?}", error))
	}
}
