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

//! Command line front end of the extrinsic pipeline.
//!
//! Bundles are read from a file or stdin and written to stdout, so the
//! stages can be chained with pipes or run on different machines:
//!
//! ```text
//! xt build --account 5Grw.. --module balances --method transfer \
//!     --args '["5FHn..", 1000]' > build.json
//! XT_SECRET=//Alice xt sign --scheme sr25519 build.json > sign.json
//! xt attach --build build.json --signature sign.json | xt submit --watch finalized
//! ```

use clap::{Args, Parser, Subcommand};
use log::*;
use std::{path::PathBuf, process::ExitCode};
use substrate_xt_pipeline::{
	bundle::{decode_bundle, encode_bundle, BuildBundle, BundleFormat, SignBundle},
	config::{BuildConfig, BuildRequest, NodeConfig, SignConfig, SubmitConfig, DEFAULT_ENDPOINT},
	pipeline::{self, AtStage, PipelineError, Stage, SubmitOutcome},
	rpc::NodeClient,
	Api, BlockSelection, Error, ErrorKind, WatchOutcome, XtStatus,
};
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(author, version, about)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Read the chain state and write a build bundle.
	Build(BuildCmd),
	/// Sign a build bundle. Needs no node.
	Sign(SignCmd),
	/// Combine a build bundle and a sign bundle into a signed extrinsic (hex).
	Attach(AttachCmd),
	/// Submit a hex encoded signed extrinsic.
	Submit(SubmitCmd),
	/// All four stages in one go.
	Run(RunCmd),
}

#[derive(Args)]
struct NodeArgs {
	/// Node endpoint. `ws`/`wss`, or `http`/`https` when not watching.
	#[arg(long, default_value = DEFAULT_ENDPOINT)]
	endpoint: String,
}

#[derive(Args)]
struct BuildArgs {
	/// JSON build request file. Replaces the other build options.
	#[arg(long, conflicts_with_all = ["account", "module", "method"])]
	request: Option<PathBuf>,
	/// SS58 address or 0x hex account id of the signer.
	#[arg(long)]
	account: Option<String>,
	#[arg(long)]
	module: Option<String>,
	#[arg(long)]
	method: Option<String>,
	/// Call arguments as JSON array.
	#[arg(long, default_value = "[]")]
	args: String,
	#[arg(long, default_value_t = 0)]
	tip: u128,
	/// Mortality period in blocks, 0 for immortal.
	#[arg(long, default_value_t = 0, allow_negative_numbers = true)]
	era_period: i64,
	#[arg(long, value_enum, default_value_t = BlockSelection::Finalized)]
	block: BlockSelection,
	/// Embed the node metadata into the build bundle.
	#[arg(long)]
	include_metadata: bool,
}

#[derive(Args)]
struct SignArgs {
	/// ed25519, sr25519 or ecdsa.
	#[arg(long)]
	scheme: String,
	/// Environment variable holding the secret. Secrets are never taken as arguments.
	#[arg(long, default_value = "XT_SECRET")]
	secret_env: String,
}

#[derive(Args)]
struct WatchArgs {
	/// Watch the extrinsic until it reaches this status.
	#[arg(long)]
	watch: Option<XtStatus>,
	/// Stop watching after this many seconds.
	#[arg(long)]
	timeout: Option<u64>,
}

#[derive(Args)]
struct BuildCmd {
	#[command(flatten)]
	node: NodeArgs,
	#[command(flatten)]
	build: BuildArgs,
	#[arg(long, value_enum, default_value_t = BundleFormat::Json)]
	format: BundleFormat,
}

#[derive(Args)]
struct SignCmd {
	#[command(flatten)]
	sign: SignArgs,
	/// Build bundle file, stdin if omitted.
	bundle: Option<PathBuf>,
	#[arg(long, value_enum, default_value_t = BundleFormat::Json)]
	format: BundleFormat,
}

#[derive(Args)]
struct AttachCmd {
	#[arg(long)]
	build: PathBuf,
	#[arg(long)]
	signature: PathBuf,
}

#[derive(Args)]
struct SubmitCmd {
	#[command(flatten)]
	node: NodeArgs,
	#[command(flatten)]
	watch: WatchArgs,
	/// File with the 0x hex signed extrinsic, stdin if omitted.
	extrinsic: Option<PathBuf>,
}

#[derive(Args)]
struct RunCmd {
	#[command(flatten)]
	node: NodeArgs,
	#[command(flatten)]
	build: BuildArgs,
	#[command(flatten)]
	sign: SignArgs,
	#[command(flatten)]
	watch: WatchArgs,
}

/// Exit codes, one per failure class an operator acts on differently.
mod exit {
	pub const INVALID_INPUT: u8 = 2;
	/// Submitted, but the final status is unknown.
	pub const OUTCOME_UNKNOWN: u8 = 3;
	pub const NODE_UNAVAILABLE: u8 = 4;
	/// Rejected, dropped, invalid or usurped.
	pub const NOT_INCLUDED: u8 = 5;
	pub const SIGNING: u8 = 6;
}

#[tokio::main]
async fn main() -> ExitCode {
	env_logger::init();

	let cli = Cli::parse();
	match execute(cli.command).await {
		Ok(code) => ExitCode::from(code),
		Err(e) => {
			error!("{e}");
			eprintln!("error: {e}");
			ExitCode::from(exit_code(e.kind()))
		},
	}
}

async fn execute(command: Command) -> Result<u8, PipelineError> {
	match command {
		Command::Build(cmd) => {
			let (node, config) = cmd.build.into_config(cmd.node).await.at(Stage::Build)?;
			let api = connect(&node).await.at(Stage::Build)?;
			let bundle = pipeline::build(&api, &config).await?;
			println!("{}", encode_bundle(&bundle, cmd.format).at(Stage::Build)?);
		},
		Command::Sign(cmd) => {
			let input = read_input(cmd.bundle.as_ref()).await.at(Stage::Sign)?;
			let bundle: BuildBundle = decode_bundle(&input).at(Stage::Sign)?;
			let sign_bundle = pipeline::sign(&bundle, &cmd.sign.into_config().at(Stage::Sign)?)?;
			println!("{}", encode_bundle(&sign_bundle, cmd.format).at(Stage::Sign)?);
		},
		Command::Attach(cmd) => {
			let build: BuildBundle =
				decode_bundle(&read_input(Some(&cmd.build)).await.at(Stage::Attach)?)
					.at(Stage::Attach)?;
			let sign: SignBundle =
				decode_bundle(&read_input(Some(&cmd.signature)).await.at(Stage::Attach)?)
					.at(Stage::Attach)?;
			let extrinsic = pipeline::attach(&build, &sign)?;
			info!("extrinsic hash {:?}", extrinsic.hash());
			println!("{}", extrinsic.to_hex());
		},
		Command::Submit(cmd) => {
			let input = read_input(cmd.extrinsic.as_ref()).await.at(Stage::Submit)?;
			let bytes = decode_hex(&input).at(Stage::Submit)?;
			let node = NodeConfig::new(&cmd.node.endpoint).at(Stage::Submit)?;
			let submit_config = cmd.watch.into_config();
			node.check_submit(&submit_config).at(Stage::Submit)?;
			let api = connect(&node).await.at(Stage::Submit)?;
			let outcome = pipeline::submit_encoded(&api, bytes, &submit_config).await?;
			return print_outcome(&outcome).at(Stage::Submit)
		},
		Command::Run(cmd) => {
			let (node, build_config) = cmd.build.into_config(cmd.node).await.at(Stage::Build)?;
			let sign_config = cmd.sign.into_config().at(Stage::Sign)?;
			let submit_config = cmd.watch.into_config();
			node.check_submit(&submit_config).at(Stage::Submit)?;
			let api = connect(&node).await.at(Stage::Build)?;
			let outcome = pipeline::run(&api, &build_config, &sign_config, &submit_config).await?;
			return print_outcome(&outcome).at(Stage::Submit)
		},
	}
	Ok(0)
}

impl BuildArgs {
	async fn into_config(self, node: NodeArgs) -> Result<(NodeConfig, BuildConfig), Error> {
		if let Some(path) = self.request {
			let request = BuildRequest::from_json(&read_input(Some(&path)).await?)?;
			return Ok((request.node, request.build))
		}
		let missing =
			|name: &str| Error::InvalidInput(format!("--{name} is required without --request"));
		let args = serde_json::from_str(&self.args)
			.map_err(|e| Error::InvalidInput(format!("--args must be a JSON array: {e}")))?;
		let config = BuildConfig {
			account: self.account.ok_or_else(|| missing("account"))?,
			module: self.module.ok_or_else(|| missing("module"))?,
			method: self.method.ok_or_else(|| missing("method"))?,
			args,
			tip: self.tip,
			era_period: self.era_period,
			block: self.block,
			include_metadata: self.include_metadata,
		};
		Ok((NodeConfig::new(&node.endpoint)?, config))
	}
}

impl SignArgs {
	fn into_config(self) -> Result<SignConfig, Error> {
		let secret = std::env::var(&self.secret_env).map_err(|_| {
			let variable = &self.secret_env;
			Error::InvalidInput(format!("secret expected in environment variable {variable}"))
		})?;
		Ok(SignConfig::new(self.scheme, secret))
	}
}

impl WatchArgs {
	fn into_config(self) -> SubmitConfig {
		SubmitConfig { watch: self.watch, timeout_secs: self.timeout }
	}
}

async fn connect(node: &NodeConfig) -> Result<Api<NodeClient>, Error> {
	let client = NodeClient::connect(&node.endpoint)
		.await
		.map_err(|source| Error::ChainStateUnavailable { query: "connect", source })?;
	Ok(Api::new(client))
}

async fn read_input(path: Option<&PathBuf>) -> Result<String, Error> {
	let read_error = |e: std::io::Error| Error::InvalidInput(format!("cannot read input: {e}"));
	match path {
		Some(path) => tokio::fs::read_to_string(path).await.map_err(read_error),
		None => {
			let mut input = String::new();
			tokio::io::stdin().read_to_string(&mut input).await.map_err(read_error)?;
			Ok(input)
		},
	}
}

fn decode_hex(input: &str) -> Result<Vec<u8>, Error> {
	impl_serde::serialize::from_hex(input.trim())
		.map_err(|e| Error::InvalidInput(format!("signed extrinsic is not hex: {e}")))
}

fn print_outcome(outcome: &SubmitOutcome) -> Result<u8, Error> {
	let json = serde_json::to_string_pretty(outcome)
		.map_err(|e| Error::InvalidInput(format!("cannot serialize outcome: {e}")))?;
	println!("{json}");
	Ok(match outcome {
		SubmitOutcome::Submitted { .. } => 0,
		SubmitOutcome::Watched(report) => match report.outcome {
			WatchOutcome::Reached => 0,
			WatchOutcome::Unknown => exit::OUTCOME_UNKNOWN,
			WatchOutcome::Dropped | WatchOutcome::Invalid | WatchOutcome::Usurped =>
				exit::NOT_INCLUDED,
		},
	})
}

fn exit_code(kind: ErrorKind) -> u8 {
	match kind {
		ErrorKind::UnknownCall |
		ErrorKind::ArgumentTypeMismatch |
		ErrorKind::InvalidEra |
		ErrorKind::MissingField |
		ErrorKind::ExtrinsicVersionMismatch |
		ErrorKind::InvalidInput => exit::INVALID_INPUT,
		ErrorKind::ChainStateUnavailable => exit::NODE_UNAVAILABLE,
		ErrorKind::SubmissionRejected => exit::NOT_INCLUDED,
		ErrorKind::InvalidSecret |
		ErrorKind::UnsupportedScheme |
		ErrorKind::SignerMismatch |
		ErrorKind::BadSignature => exit::SIGNING,
	}
}
