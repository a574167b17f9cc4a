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

//! The four stages: build, sign, attach and submit.
//!
//! Only build and submit talk to a node. Sign and attach are pure functions
//! of their bundles and can run on an offline machine.

use crate::{
	api::{
		Api, Error, ErrorKind, ExtrinsicReport, GetChainState, SubmitAndWatch, SubmitExtrinsic,
	},
	bundle::{BuildBundle, SignBundle},
	config::{BuildConfig, SignConfig, SubmitConfig},
	rpc::{Request, Subscribe},
};
use codec::Encode;
use core::fmt;
use log::*;
use serde::{Deserialize, Serialize};
use xt_node_api::{encode_call, Metadata};
use xt_primitives::{
	Era, Error as PrimitivesError, Hash, PartialChainState, SignatureScheme, SignaturePayload,
	SignedExtrinsic, UnsignedExtrinsic,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Build,
	Sign,
	Attach,
	Submit,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Stage::Build => "build",
			Stage::Sign => "sign",
			Stage::Attach => "attach",
			Stage::Submit => "submit",
		};
		f.write_str(name)
	}
}

/// A failure together with the stage it happened in.
#[derive(Debug)]
pub struct PipelineError {
	pub stage: Stage,
	pub error: Error,
}

impl PipelineError {
	pub fn kind(&self) -> ErrorKind {
		self.error.kind()
	}
}

impl fmt::Display for PipelineError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} stage failed ({}): {}", self.stage, self.kind(), self.error)
	}
}

impl core::error::Error for PipelineError {
	fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
		Some(&self.error)
	}
}

pub type Result<T> = core::result::Result<T, PipelineError>;

/// Tag a failure with the stage it happened in.
pub trait AtStage<T> {
	fn at(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<Error>> AtStage<T> for core::result::Result<T, E> {
	fn at(self, stage: Stage) -> Result<T> {
		self.map_err(|e| PipelineError { stage, error: e.into() })
	}
}

/// What the submit stage observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitOutcome {
	/// Submitted without watching.
	Submitted { extrinsic_hash: Hash },
	Watched(ExtrinsicReport),
}

/// Read a chain state snapshot and build the bundle to be signed.
pub async fn build<Client>(api: &Api<Client>, config: &BuildConfig) -> Result<BuildBundle>
where
	Client: Request + Send + Sync,
{
	// Reject malformed input before touching the node.
	let account = config.account_id().at(Stage::Build)?;
	config.call_args().at(Stage::Build)?;

	let snapshot = api.snapshot(&account, config.block).await.at(Stage::Build)?;
	let mut chain_state = snapshot.chain_state(account);

	// The mortality checkpoint is the era's birth block, which quantized eras
	// place before the snapshot block.
	let era = Era::from_request(snapshot.block_number, config.era_period).at(Stage::Build)?;
	let birth = era.birth(snapshot.block_number);
	if !era.is_immortal() && birth != snapshot.block_number {
		let birth_hash = api.block_hash(birth).await.at(Stage::Build)?;
		debug!("era {:?} starts at #{} ({:?})", era, birth, birth_hash);
		chain_state.block_hash = Some(birth_hash);
		chain_state.block_number = Some(birth);
	}
	build_offline(&snapshot.metadata, chain_state, config)
}

/// Build from a chain state obtained elsewhere. Fields missing in `chain_state`
/// fail with [`ErrorKind::MissingField`], and so does a mortal era whose birth block
/// is not the chain state block.
pub fn build_offline(
	metadata: &Metadata,
	chain_state: PartialChainState,
	config: &BuildConfig,
) -> Result<BuildBundle> {
	let args = config.call_args().at(Stage::Build)?;
	let call = encode_call(metadata, &config.module, &config.method, &args).at(Stage::Build)?;

	let current = chain_state.block_number.unwrap_or_default();
	let era = Era::from_request(current, config.era_period).at(Stage::Build)?;
	if !era.is_immortal() && chain_state.block_number.is_none() {
		return Err(PrimitivesError::MissingField("blockNumber")).at(Stage::Build)
	}

	let extensions = metadata.signed_extension_layout().at(Stage::Build)?;
	let payload = SignaturePayload::build(call.encode(), era, chain_state, config.tip, extensions)
		.at(Stage::Build)?;
	let unsigned = UnsignedExtrinsic::new(payload.version, call.encode());

	let bundle = BuildBundle::new(payload, unsigned, config.include_metadata.then_some(metadata));
	info!(
		"built {}.{} for {} (nonce {}, era {:?})",
		config.module,
		config.method,
		bundle.signature_payload.address,
		bundle.signature_payload.nonce,
		bundle.signature_payload.era
	);
	Ok(bundle)
}

/// Sign the payload of a build bundle. Needs no node.
pub fn sign(bundle: &BuildBundle, config: &SignConfig) -> Result<SignBundle> {
	let scheme: SignatureScheme = config.scheme.parse().at(Stage::Sign)?;
	bundle.verify_consistency().at(Stage::Sign)?;

	let output = xt_primitives::sign(&config.secret, scheme, &bundle.to_sign).at(Stage::Sign)?;
	info!("signed payload with {} key 0x{}", scheme, hex::encode(&output.public));
	Ok(output.into())
}

/// Combine a build bundle and its signature into the final extrinsic.
pub fn attach(build: &BuildBundle, sign: &SignBundle) -> Result<SignedExtrinsic> {
	build.verify_consistency().at(Stage::Attach)?;
	let signature = sign.tagged_signature().at(Stage::Attach)?;
	xt_primitives::attach(
		&build.unsigned_extrinsic,
		&sign.public,
		signature,
		&build.signature_payload,
	)
	.at(Stage::Attach)
}

pub async fn submit<Client>(
	api: &Api<Client>,
	extrinsic: &SignedExtrinsic,
	config: &SubmitConfig,
) -> Result<SubmitOutcome>
where
	Client: Request + Subscribe + Send + Sync,
{
	submit_encoded(api, extrinsic.encode(), config).await
}

/// Submit an already encoded signed extrinsic.
pub async fn submit_encoded<Client>(
	api: &Api<Client>,
	encoded_extrinsic: Vec<u8>,
	config: &SubmitConfig,
) -> Result<SubmitOutcome>
where
	Client: Request + Subscribe + Send + Sync,
{
	if encoded_extrinsic.is_empty() {
		return Err(Error::InvalidInput("empty extrinsic".into())).at(Stage::Submit)
	}
	match config.watch {
		None => {
			let extrinsic_hash = api.submit_extrinsic(encoded_extrinsic).await.at(Stage::Submit)?;
			Ok(SubmitOutcome::Submitted { extrinsic_hash })
		},
		Some(target) => {
			let report = api
				.submit_and_watch_extrinsic_until(encoded_extrinsic, target, config.timeout())
				.await
				.at(Stage::Submit)?;
			info!("extrinsic {:?} watch ended: {:?}", report.extrinsic_hash, report.outcome);
			Ok(SubmitOutcome::Watched(report))
		},
	}
}

/// Build, sign, attach and submit in one go.
pub async fn run<Client>(
	api: &Api<Client>,
	build_config: &BuildConfig,
	sign_config: &SignConfig,
	submit_config: &SubmitConfig,
) -> Result<SubmitOutcome>
where
	Client: Request + Subscribe + Send + Sync,
{
	let build_bundle = build(api, build_config).await?;
	let sign_bundle = sign(&build_bundle, sign_config)?;
	let extrinsic = attach(&build_bundle, &sign_bundle)?;
	submit(api, &extrinsic, submit_config).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{api::BlockSelection, bundle::BundleFormat};
	use test_case::test_case;
	use xt_node_api::test_utils::{test_metadata, SignedExtensions};
	use xt_primitives::{AccountId, ChainState};

	const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
	const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

	fn build_config(era_period: i64) -> BuildConfig {
		BuildConfig {
			account: ALICE.into(),
			module: "Balances".into(),
			method: "transfer".into(),
			args: vec![serde_json::json!(BOB), serde_json::json!(1000)],
			tip: 0,
			era_period,
			block: BlockSelection::Finalized,
			include_metadata: false,
		}
	}

	fn chain_state() -> PartialChainState {
		ChainState {
			address: xt_primitives::parse_account(ALICE).unwrap(),
			block_hash: Hash::repeat_byte(2),
			block_number: 1000,
			genesis_hash: Hash::repeat_byte(1),
			nonce: 3,
			version: 4,
			spec_version: 100,
			transaction_version: 1,
		}
		.into()
	}

	fn offline_bundle(era_period: i64) -> BuildBundle {
		let metadata = test_metadata(SignedExtensions::Default);
		build_offline(&metadata, chain_state(), &build_config(era_period)).unwrap()
	}

	#[test]
	fn offline_stages_produce_a_verifiable_extrinsic() {
		let build_bundle = offline_bundle(64);
		let sign_bundle = sign(&build_bundle, &SignConfig::new("sr25519", "//Alice")).unwrap();
		let extrinsic = attach(&build_bundle, &sign_bundle).unwrap();

		assert_eq!(&extrinsic.call[..2], &[5, 0]);
		assert_eq!(extrinsic.nonce, 3);
		assert_eq!(extrinsic.era, Era::mortal(64, 1000));
		let decoded =
			SignedExtrinsic::decode_with_layout(&extrinsic.encode(), extrinsic.extensions).unwrap();
		assert_eq!(decoded, extrinsic);
	}

	#[test_case("x25519", ErrorKind::UnsupportedScheme ; "unknown scheme")]
	#[test_case("ed25519", ErrorKind::InvalidSecret ; "garbage secret")]
	fn sign_failures_name_the_sign_stage(scheme: &str, kind: ErrorKind) {
		let build_bundle = offline_bundle(0);
		let error = sign(&build_bundle, &SignConfig::new(scheme, "not a secret")).unwrap_err();
		assert_eq!(error.stage, Stage::Sign);
		assert_eq!(error.kind(), kind);
	}

	#[test]
	fn signature_of_another_key_is_rejected_at_attach() {
		let build_bundle = offline_bundle(0);
		let sign_bundle = sign(&build_bundle, &SignConfig::new("sr25519", "//Bob")).unwrap();
		let error = attach(&build_bundle, &sign_bundle).unwrap_err();
		assert_eq!(error.stage, Stage::Attach);
		assert_eq!(error.kind(), ErrorKind::SignerMismatch);
	}

	#[test]
	fn missing_nonce_is_missing_field() {
		let metadata = test_metadata(SignedExtensions::Default);
		let state = PartialChainState { nonce: None, ..chain_state() };
		let error = build_offline(&metadata, state, &build_config(0)).unwrap_err();
		assert_eq!(error.stage, Stage::Build);
		assert_eq!(error.kind(), ErrorKind::MissingField);
	}

	#[test]
	fn mortal_era_needs_a_block_number() {
		let metadata = test_metadata(SignedExtensions::Default);
		let state = PartialChainState { block_number: None, ..chain_state() };
		assert!(build_offline(&metadata, state.clone(), &build_config(0)).is_ok());
		assert_eq!(
			build_offline(&metadata, state, &build_config(64)).unwrap_err().kind(),
			ErrorKind::MissingField
		);
	}

	#[test]
	fn quantized_era_must_be_anchored_at_its_birth_block() {
		let metadata = test_metadata(SignedExtensions::Default);
		let current = PartialChainState { block_number: Some(1001), ..chain_state() };
		let error = build_offline(&metadata, current, &build_config(8192)).unwrap_err();
		assert_eq!((error.stage, error.kind()), (Stage::Build, ErrorKind::MissingField));

		let bundle = build_offline(&metadata, chain_state(), &build_config(8192)).unwrap();
		assert_eq!(bundle.signature_payload.era, Era::from_request(1001, 8192).unwrap());
		assert_eq!(bundle.signature_payload.block_hash, Hash::repeat_byte(2));
	}

	#[test]
	fn unknown_extension_with_data_fails_the_build() {
		let metadata = test_metadata(SignedExtensions::WithCustomExtension);
		let error = build_offline(&metadata, chain_state(), &build_config(0)).unwrap_err();
		assert_eq!((error.stage, error.kind()), (Stage::Build, ErrorKind::InvalidInput));
		assert!(error.to_string().contains("CheckReferendumFee"));

		let metadata = test_metadata(SignedExtensions::WithMarkerExtension);
		assert!(build_offline(&metadata, chain_state(), &build_config(0)).is_ok());
	}

	#[test]
	fn negative_era_period_is_invalid_era() {
		let metadata = test_metadata(SignedExtensions::Default);
		let error = build_offline(&metadata, chain_state(), &build_config(-1)).unwrap_err();
		assert_eq!(error.kind(), ErrorKind::InvalidEra);
	}

	#[test]
	fn unknown_call_fails_the_build_stage() {
		let metadata = test_metadata(SignedExtensions::Default);
		let config = BuildConfig { method: "burn".into(), ..build_config(0) };
		let error = build_offline(&metadata, chain_state(), &config).unwrap_err();
		assert_eq!((error.stage, error.kind()), (Stage::Build, ErrorKind::UnknownCall));
	}

	#[test]
	fn metadata_extensions_shape_the_payload() {
		let metadata = test_metadata(SignedExtensions::AssetTipAndMetadataHash);
		let bundle = build_offline(&metadata, chain_state(), &build_config(0)).unwrap();
		assert!(bundle.signature_payload.extensions.asset_tip);
		assert!(bundle.signature_payload.extensions.metadata_hash_check);

		let sign_bundle = sign(&bundle, &SignConfig::new("sr25519", "//Alice")).unwrap();
		let extrinsic = attach(&bundle, &sign_bundle).unwrap();
		let layout = bundle.signature_payload.extensions;
		let decoded = SignedExtrinsic::decode_with_layout(&extrinsic.encode(), layout).unwrap();
		assert_eq!(decoded.call, bundle.signature_payload.method);
	}

	#[test]
	fn ed25519_key_of_alice_is_another_account() {
		let bundle = offline_bundle(0);
		let sign_bundle = sign(&bundle, &SignConfig::new("ed25519", "//Alice")).unwrap();
		let error = attach(&bundle, &sign_bundle).unwrap_err();
		assert_eq!(error.kind(), ErrorKind::SignerMismatch);
	}

	#[test]
	fn bundles_survive_both_formats_between_stages() {
		use crate::bundle::{decode_bundle, encode_bundle};

		for format in [BundleFormat::Json, BundleFormat::Hex] {
			let build_bundle: BuildBundle =
				decode_bundle(&encode_bundle(&offline_bundle(64), format).unwrap()).unwrap();
			let sign_bundle = sign(&build_bundle, &SignConfig::new("sr25519", "//Alice")).unwrap();
			let sign_bundle: SignBundle =
				decode_bundle(&encode_bundle(&sign_bundle, format).unwrap()).unwrap();
			attach(&build_bundle, &sign_bundle).unwrap();
		}
	}

	#[test]
	fn account_of_alice_matches_signer() {
		let account: AccountId = xt_primitives::parse_account(ALICE).unwrap();
		let public = xt_primitives::sign("//Alice", SignatureScheme::Sr25519, b"").unwrap().public;
		assert_eq!(xt_primitives::account_of(SignatureScheme::Sr25519, &public).unwrap(), account);
	}
}
