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

//! The four stages against a fake node.

use codec::{Compact, Encode};
use serde_json::json;
use sp_runtime::{AccountId32, MultiAddress};
use substrate_xt_pipeline::{
	bundle::{decode_bundle, encode_bundle, BuildBundle, BundleFormat, SignBundle},
	config::{BuildConfig, SignConfig, SubmitConfig},
	pipeline::{self, Stage, SubmitOutcome},
	xt_node_api::test_utils::{BalancesCall, SignedExtensions},
	Api, ErrorKind, WatchOutcome, XtStatus,
};
use test_case::test_case;
use xt_primitives::{parse_account, verify, Era, SignedExtensionLayout, SignedExtrinsic};
use xt_testing::*;

const IN_BLOCK_HASH: &str = "0x4444444444444444444444444444444444444444444444444444444444444444";

fn expected_transfer_call(amount: u128) -> Vec<u8> {
	let bob: AccountId32 = parse_account(BOB).unwrap();
	let mut call = vec![5u8];
	call.extend(BalancesCall::transfer { dest: MultiAddress::Id(bob), value: amount }.encode());
	call
}

fn alice() -> SignConfig {
	SignConfig::new("sr25519", "//Alice")
}

fn submitted_extrinsic(
	client: &substrate_xt_pipeline::rpc::RpcClientMock,
	method: &str,
) -> Vec<u8> {
	let params = client.params_of(method);
	assert_eq!(params.len(), 1);
	let params: Vec<String> = serde_json::from_str(params[0].as_deref().unwrap()).unwrap();
	hex::decode(params[0].trim_start_matches("0x")).unwrap()
}

#[tokio::test]
async fn balances_transfer_payload_has_the_fixed_layout() {
	let api = Api::new(MockNode::default().client());
	let bundle = pipeline::build(&api, &transfer_to_bob(1000)).await.unwrap();

	let call = expected_transfer_call(1000);
	assert_eq!(&call[..2], &[5, 0]);
	assert_eq!(bundle.unsigned_extrinsic.call, call);

	let genesis = hash(GENESIS_HASH);
	let mut expected = call.clone();
	expected.push(0); // immortal
	expected.extend(Compact(3u64).encode());
	expected.extend(Compact(0u128).encode());
	expected.extend(SPEC_VERSION.to_le_bytes());
	expected.extend(TRANSACTION_VERSION.to_le_bytes());
	expected.extend(genesis.as_bytes());
	// Immortal transactions use the genesis hash as mortality checkpoint.
	expected.extend(genesis.as_bytes());
	assert_eq!(bundle.to_sign, expected);
	assert_eq!(bundle.signature_payload.block_hash, genesis);
}

#[tokio::test]
async fn mortal_payload_is_anchored_at_the_finalized_block() {
	let api = Api::new(MockNode::default().client());
	let config = BuildConfig { era_period: 64, ..transfer_to_bob(1) };
	let bundle = pipeline::build(&api, &config).await.unwrap();

	let payload = &bundle.signature_payload;
	assert_eq!(payload.era, Era::mortal(64, FINALIZED_NUMBER));
	assert_eq!(payload.block_hash, hash(FINALIZED_HASH));
	assert_eq!(payload.genesis_hash, hash(GENESIS_HASH));
	// Only the genesis hash is looked up by number.
	assert_eq!(api.client().params_of("chain_getBlockHash"), vec![Some("[0]".to_string())]);
}

#[tokio::test]
async fn quantized_era_is_anchored_at_its_birth_block() {
	let client = MockNode { block_number: 1001, ..MockNode::default() }.client();
	client.update_entry_for("chain_getBlockHash", "[1000]", json!(BIRTH_HASH));
	let api = Api::new(client);
	let config = BuildConfig { era_period: 8192, ..transfer_to_bob(1) };

	let bundle = pipeline::build(&api, &config).await.unwrap();

	let payload = &bundle.signature_payload;
	assert_eq!(payload.era, Era::Mortal { period: 8192, phase: 1000 });
	assert_eq!(payload.era.birth(1001), 1000);
	assert_eq!(payload.block_hash, hash(BIRTH_HASH));
	assert_eq!(payload.genesis_hash, hash(GENESIS_HASH));
}

#[tokio::test]
async fn run_submits_a_decodable_signed_extrinsic() {
	let node = MockNode::default();
	let client = node.client();
	client.update_subscription(
		"author_submitAndWatchExtrinsic",
		vec![
			json!("ready"),
			json!({ "inBlock": IN_BLOCK_HASH }),
			json!({ "finalized": IN_BLOCK_HASH }),
		],
		false,
	);
	let api = Api::new(client);
	let submit = SubmitConfig { watch: Some(XtStatus::Finalized), timeout_secs: Some(10) };

	let outcome = pipeline::run(&api, &transfer_to_bob(1000), &alice(), &submit).await.unwrap();

	let SubmitOutcome::Watched(report) = outcome else { panic!("expected a watched outcome") };
	assert_eq!(report.outcome, WatchOutcome::Reached);
	assert_eq!(report.block_hash, Some(hash(IN_BLOCK_HASH)));

	let bytes = submitted_extrinsic(api.client(), "author_submitAndWatchExtrinsic");
	let extrinsic =
		SignedExtrinsic::decode_with_layout(&bytes, SignedExtensionLayout::default()).unwrap();
	assert_eq!(report.extrinsic_hash, extrinsic.hash());
	assert_eq!(extrinsic.nonce, 3);
	assert_eq!(extrinsic.tip, 0);
	assert_eq!(extrinsic.era, Era::Immortal);
	assert_eq!(extrinsic.call, expected_transfer_call(1000));

	// The signature covers the payload the build stage produces for the same chain state.
	let rebuilt = pipeline::build(&Api::new(node.client()), &transfer_to_bob(1000)).await.unwrap();
	assert!(verify(&extrinsic.signature, &rebuilt.to_sign, &parse_account(ALICE).unwrap()));
}

#[tokio::test]
async fn unsupported_scheme_fails_before_signing() {
	let api = Api::new(MockNode::default().client());
	let error = pipeline::run(
		&api,
		&transfer_to_bob(1),
		&SignConfig::new("x25519", "//Alice"),
		&SubmitConfig::default(),
	)
	.await
	.unwrap_err();

	assert_eq!(error.stage, Stage::Sign);
	assert_eq!(error.kind(), ErrorKind::UnsupportedScheme);
	assert!(api.client().params_of("author_submitExtrinsic").is_empty());
}

#[tokio::test]
async fn node_rejection_is_reported_at_the_submit_stage() {
	let client = MockNode::default().client();
	client.update_error(
		"author_submitExtrinsic",
		"1010: Invalid Transaction: Inability to pay some fees",
	);
	let api = Api::new(client);

	let error = pipeline::run(&api, &transfer_to_bob(1), &alice(), &SubmitConfig::default())
		.await
		.unwrap_err();

	assert_eq!(error.stage, Stage::Submit);
	assert_eq!(error.kind(), ErrorKind::SubmissionRejected);
	assert!(error.to_string().contains("Inability to pay some fees"));
}

#[tokio::test]
async fn watch_timeout_leaves_the_outcome_unknown() {
	let client = MockNode::default().client();
	client.update_subscription("author_submitAndWatchExtrinsic", vec![json!("ready")], true);
	let api = Api::new(client);
	let submit = SubmitConfig { watch: Some(XtStatus::InBlock), timeout_secs: Some(1) };

	let outcome = pipeline::run(&api, &transfer_to_bob(1), &alice(), &submit).await.unwrap();

	let SubmitOutcome::Watched(report) = outcome else { panic!("expected a watched outcome") };
	assert_eq!(report.outcome, WatchOutcome::Unknown);
	assert_eq!(report.block_hash, None);
}

#[tokio::test]
async fn unavailable_nonce_fails_the_build_stage() {
	let client = MockNode::default().client();
	client.update_error("state_call", "-32000: Client error: Execution failed");
	let api = Api::new(client);

	let error = pipeline::build(&api, &transfer_to_bob(1)).await.unwrap_err();
	assert_eq!(error.stage, Stage::Build);
	assert_eq!(error.kind(), ErrorKind::ChainStateUnavailable);
}

#[tokio::test]
async fn unknown_account_format_is_rejected_before_any_query() {
	let client = MockNode::default().client();
	let api = Api::new(client);
	let config = BuildConfig { account: "alice".into(), ..transfer_to_bob(1) };

	let error = pipeline::build(&api, &config).await.unwrap_err();
	assert_eq!(error.kind(), ErrorKind::InvalidInput);
	assert!(api.client().requests().is_empty());
}

#[test_case(BundleFormat::Json)]
#[test_case(BundleFormat::Hex)]
#[tokio::test]
async fn stages_can_run_on_separate_machines(format: BundleFormat) {
	let api = Api::new(MockNode::default().client());
	let config = BuildConfig { include_metadata: true, ..transfer_to_bob(5) };
	let written = encode_bundle(&pipeline::build(&api, &config).await.unwrap(), format).unwrap();

	// Offline machine.
	let build: BuildBundle = decode_bundle(&written).unwrap();
	assert!(build.metadata().unwrap().is_some());
	let signature = encode_bundle(&pipeline::sign(&build, &alice()).unwrap(), format).unwrap();

	// Back online.
	let sign: SignBundle = decode_bundle(&signature).unwrap();
	let extrinsic = pipeline::attach(&build, &sign).unwrap();
	let outcome = pipeline::submit(&api, &extrinsic, &SubmitConfig::default()).await;
	// The fake node has no answer for plain submission.
	assert_eq!(outcome.unwrap_err().kind(), ErrorKind::SubmissionRejected);
	assert_eq!(
		submitted_extrinsic(api.client(), "author_submitExtrinsic"),
		extrinsic.encode()
	);
}

#[tokio::test]
async fn asset_tip_runtime_gets_the_extended_layout() {
	let node = MockNode {
		nonce: 7,
		extensions: SignedExtensions::AssetTipAndMetadataHash,
		..MockNode::default()
	};
	let client = node.client();
	let extrinsic_hash = "0x5555555555555555555555555555555555555555555555555555555555555555";
	client.update_entry("author_submitExtrinsic", json!(extrinsic_hash));
	let api = Api::new(client);

	let build = pipeline::build(&api, &transfer_to_bob(1)).await.unwrap();
	let layout = build.signature_payload.extensions;
	assert!(layout.asset_tip && layout.metadata_hash_check);

	let call_len = build.signature_payload.method.len();
	// era, nonce, tip, no asset id, disabled metadata hash mode
	assert_eq!(&build.to_sign[call_len..call_len + 5], &[0, 7 << 2, 0, 0, 0]);
	// Additional signed data ends with `None` for the metadata hash.
	assert_eq!(build.to_sign.last(), Some(&0));

	let sign = pipeline::sign(&build, &alice()).unwrap();
	let extrinsic = pipeline::attach(&build, &sign).unwrap();
	let outcome = pipeline::submit(&api, &extrinsic, &SubmitConfig::default()).await.unwrap();
	assert_eq!(outcome, SubmitOutcome::Submitted { extrinsic_hash: hash(extrinsic_hash) });

	let bytes = submitted_extrinsic(api.client(), "author_submitExtrinsic");
	let decoded = SignedExtrinsic::decode_with_layout(&bytes, layout).unwrap();
	assert_eq!(decoded, extrinsic);
}

#[tokio::test]
async fn runtime_with_unencodable_extension_fails_the_build() {
	let node =
		MockNode { extensions: SignedExtensions::WithCustomExtension, ..MockNode::default() };
	let api = Api::new(node.client());

	let error = pipeline::build(&api, &transfer_to_bob(1)).await.unwrap_err();
	assert_eq!((error.stage, error.kind()), (Stage::Build, ErrorKind::InvalidInput));
	assert!(error.to_string().contains("CheckReferendumFee"));
}
