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

//! Stage configuration. Every stage gets its config passed in explicitly.

use crate::api::{BlockSelection, Error, Result, XtStatus};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use url::Url;
use xt_node_api::{CallError, Value};
use xt_primitives::{parse_account, AccountId, Balance};
use zeroize::Zeroizing;

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9944";

/// Node to talk to. Websocket endpoints support everything, HTTP endpoints
/// everything but watching a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
	#[serde(alias = "wsEndpoint")]
	pub endpoint: Url,
}

impl NodeConfig {
	pub fn new(endpoint: &str) -> Result<Self> {
		let endpoint = Url::parse(endpoint)
			.map_err(|e| Error::InvalidInput(format!("endpoint `{endpoint}`: {e}")))?;
		let config = Self { endpoint };
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		match self.endpoint.scheme() {
			"ws" | "wss" | "http" | "https" => Ok(()),
			other => Err(Error::InvalidInput(format!(
				"endpoint scheme must be ws, wss, http or https, got `{other}`"
			))),
		}
	}

	pub fn supports_subscriptions(&self) -> bool {
		matches!(self.endpoint.scheme(), "ws" | "wss")
	}

	/// Refuse a watch request the endpoint cannot serve, before anything is sent.
	pub fn check_submit(&self, submit: &SubmitConfig) -> Result<()> {
		if submit.watch.is_some() && !self.supports_subscriptions() {
			return Err(Error::InvalidInput(format!(
				"watching needs a ws or wss endpoint, got `{}`",
				self.endpoint
			)))
		}
		Ok(())
	}
}

/// Everything the build stage needs besides the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
	/// SS58 address or `0x` hex account id of the signer.
	pub account: String,
	#[serde(alias = "section", alias = "pallet")]
	pub module: String,
	#[serde(alias = "call")]
	pub method: String,
	/// Positional call arguments as JSON values.
	#[serde(default)]
	pub args: Vec<serde_json::Value>,
	#[serde(default)]
	pub tip: Balance,
	/// Mortality period in blocks; `0` builds an immortal extrinsic.
	#[serde(default)]
	pub era_period: i64,
	#[serde(default)]
	pub block: BlockSelection,
	/// Embed the node metadata into the build bundle.
	#[serde(default)]
	pub include_metadata: bool,
}

impl BuildConfig {
	pub fn account_id(&self) -> Result<AccountId> {
		Ok(parse_account(&self.account)?)
	}

	/// Convert the JSON arguments into dynamic values for the call encoder.
	pub fn call_args(&self) -> Result<Vec<Value>> {
		self.args
			.iter()
			.enumerate()
			.map(|(index, arg)| {
				Value::try_from(arg.clone()).map_err(|source| {
					Error::from(CallError::ArgumentTypeMismatch {
						pallet: self.module.clone(),
						call: self.method.clone(),
						index,
						name: format!("#{index}"),
						source,
					})
				})
			})
			.collect()
	}
}

/// Signing input. Never serialized; the secret is wiped from memory on drop.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignConfig {
	/// `ed25519`, `sr25519` or `ecdsa`.
	pub scheme: String,
	/// Hex seed, mnemonic or secret URI.
	pub secret: Zeroizing<String>,
}

impl SignConfig {
	pub fn new(scheme: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { scheme: scheme.into(), secret: Zeroizing::new(secret.into()) }
	}
}

impl fmt::Debug for SignConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignConfig")
			.field("scheme", &self.scheme)
			.field("secret", &"<redacted>")
			.finish()
	}
}

/// Submission behavior. Without a watch target the extrinsic is only submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitConfig {
	#[serde(default)]
	pub watch: Option<XtStatus>,
	/// Give up watching after this many seconds. The outcome is then unknown.
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

impl SubmitConfig {
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_secs.map(Duration::from_secs)
	}
}

/// A build request file: the node plus the build config, as one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
	#[serde(flatten)]
	pub node: NodeConfig,
	#[serde(flatten)]
	pub build: BuildConfig,
}

impl BuildRequest {
	pub fn from_json(json: &str) -> Result<Self> {
		let request: Self = serde_json::from_str(json)
			.map_err(|e| Error::InvalidInput(format!("malformed build request: {e}")))?;
		request.node.validate()?;
		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::ErrorKind;
	use serde_json::json;
	use test_case::test_case;

	#[test_case("ws://127.0.0.1:9944", true)]
	#[test_case("wss://rpc.example.org", true)]
	#[test_case("http://127.0.0.1:9933", true)]
	#[test_case("https://rpc.example.org", true)]
	#[test_case("ftp://127.0.0.1", false)]
	#[test_case("not a url", false)]
	fn endpoint_must_be_websocket_or_http(endpoint: &str, valid: bool) {
		let result = NodeConfig::new(endpoint);
		assert_eq!(result.is_ok(), valid);
		if let Err(e) = result {
			assert_eq!(e.kind(), ErrorKind::InvalidInput);
		}
	}

	#[test_case("ws://127.0.0.1:9944", None, true)]
	#[test_case("wss://rpc.example.org", Some(XtStatus::Finalized), true)]
	#[test_case("http://127.0.0.1:9933", None, true)]
	#[test_case("https://rpc.example.org", Some(XtStatus::InBlock), false)]
	fn watching_needs_a_websocket(endpoint: &str, watch: Option<XtStatus>, allowed: bool) {
		let node = NodeConfig::new(endpoint).unwrap();
		let result = node.check_submit(&SubmitConfig { watch, timeout_secs: None });
		assert_eq!(result.is_ok(), allowed);
		if let Err(e) = result {
			assert_eq!(e.kind(), ErrorKind::InvalidInput);
		}
	}

	#[test]
	fn build_request_accepts_script_field_names() {
		let request = BuildRequest::from_json(
			r#"{
				"wsEndpoint": "ws://127.0.0.1:9944",
				"account": "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
				"section": "balances",
				"method": "transfer",
				"args": ["5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty", 1000],
				"tip": 0
			}"#,
		)
		.unwrap();

		assert_eq!(request.build.module, "balances");
		assert_eq!(request.build.era_period, 0);
		assert_eq!(request.build.block, BlockSelection::Finalized);
		assert!(!request.build.include_metadata);
		assert_eq!(request.build.call_args().unwrap().len(), 2);
	}

	#[test]
	fn float_argument_is_argument_type_mismatch() {
		let config = BuildConfig {
			account: "0x0101010101010101010101010101010101010101010101010101010101010101".into(),
			module: "Balances".into(),
			method: "transfer".into(),
			args: vec![json!(1.5)],
			tip: 0,
			era_period: 0,
			block: BlockSelection::Finalized,
			include_metadata: false,
		};
		assert_eq!(config.call_args().unwrap_err().kind(), ErrorKind::ArgumentTypeMismatch);
		assert_eq!(config.account_id().unwrap(), AccountId::new([1u8; 32]));
	}

	#[test]
	fn secret_is_not_printed() {
		let config = SignConfig::new("sr25519", "//Alice");
		let printed = format!("{config:?}");
		assert!(!printed.contains("Alice"));
		assert!(printed.contains("sr25519"));
	}

	#[test]
	fn submit_config_parses_watch_target() {
		let config: SubmitConfig =
			serde_json::from_value(json!({ "watch": "in-block", "timeoutSecs": 30 })).unwrap();
		assert_eq!(config.watch, Some(XtStatus::InBlock));
		assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
	}
}
