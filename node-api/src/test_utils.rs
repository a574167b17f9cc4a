// This file bases on subxt (Parity Technologies (UK))
// https://github.com/paritytech/subxt/
// And was adapted by Supercomputing Systems AG and Integritee AG.
//
// Copyright 2019-2022 Parity Technologies (UK) Ltd, Supercomputing Systems AG and Integritee AG.
// This file is licensed as Apache-2.0
// see LICENSE for license details.

//! Metadata fixtures used by tests inside and outside of this crate.
//!
//! The fixture runtime has `System` (index 0), `Timestamp` (index 3, no calls)
//! and `Balances` (index 5) pallets.

use crate::Metadata;
use codec::Encode;
use frame_metadata::{
	v14::{
		ExtrinsicMetadata as ExtrinsicMetadataV14, PalletCallMetadata as PalletCallMetadataV14,
		PalletMetadata as PalletMetadataV14, RuntimeMetadataV14,
		SignedExtensionMetadata as SignedExtensionMetadataV14,
	},
	v15::{
		CustomMetadata, ExtrinsicMetadata as ExtrinsicMetadataV15, OuterEnums,
		PalletCallMetadata as PalletCallMetadataV15, PalletMetadata as PalletMetadataV15,
		RuntimeMetadataV15, SignedExtensionMetadata as SignedExtensionMetadataV15,
	},
	RuntimeMetadataPrefixed,
};
use scale_info::{form::MetaForm, meta_type, MetaType, TypeInfo};
use sp_runtime::{AccountId32, MultiAddress};

#[derive(Encode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum SystemCall {
	#[codec(index = 0)]
	remark { remark: Vec<u8> },
}

#[derive(Encode, TypeInfo, Clone, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BalancesCall {
	#[codec(index = 0)]
	transfer {
		dest: MultiAddress<AccountId32, ()>,
		#[codec(compact)]
		value: u128,
	},
	#[codec(index = 3)]
	transfer_keep_alive {
		dest: MultiAddress<AccountId32, ()>,
		#[codec(compact)]
		value: u128,
	},
}

/// Extra data of a signed extension that adds nothing to the extrinsic.
#[derive(Encode, TypeInfo, Clone, Debug, PartialEq, Eq)]
pub struct MarkerExtension;

pub enum SupportedMetadataVersions {
	V14,
	V15,
}

/// Signed extensions the fixture runtime declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignedExtensions {
	/// The usual `frame_system` checks plus `ChargeTransactionPayment`.
	Default,
	/// `ChargeAssetTxPayment` instead of `ChargeTransactionPayment`, plus `CheckMetadataHash`.
	AssetTipAndMetadataHash,
	/// `Default` plus a chain specific `PrevalidateAttests` that carries no data.
	WithMarkerExtension,
	/// `Default` plus a chain specific `CheckReferendumFee` with a `u32` in the extra.
	WithCustomExtension,
}

impl SignedExtensions {
	pub fn identifiers(self) -> Vec<&'static str> {
		let mut identifiers = vec![
			"CheckNonZeroSender",
			"CheckSpecVersion",
			"CheckTxVersion",
			"CheckGenesis",
			"CheckMortality",
			"CheckNonce",
			"CheckWeight",
		];
		match self {
			SignedExtensions::Default => identifiers.push("ChargeTransactionPayment"),
			SignedExtensions::AssetTipAndMetadataHash =>
				identifiers.extend(["ChargeAssetTxPayment", "CheckMetadataHash"]),
			SignedExtensions::WithMarkerExtension =>
				identifiers.extend(["ChargeTransactionPayment", "PrevalidateAttests"]),
			SignedExtensions::WithCustomExtension =>
				identifiers.extend(["ChargeTransactionPayment", "CheckReferendumFee"]),
		}
		identifiers
	}

	/// Type of the extra data `identifier` adds to the extrinsic. The additional
	/// signed data is `()` for all of them.
	fn extra_ty(identifier: &str) -> MetaType {
		match identifier {
			"CheckReferendumFee" => meta_type::<u32>(),
			"PrevalidateAttests" => meta_type::<MarkerExtension>(),
			_ => meta_type::<()>(),
		}
	}
}

/// Build fake V14 metadata of the fixture runtime.
pub fn test_metadata(extensions: SignedExtensions) -> Metadata {
	test_metadata_with_version(extensions, SupportedMetadataVersions::V14)
}

pub fn test_metadata_with_version(
	extensions: SignedExtensions,
	version: SupportedMetadataVersions,
) -> Metadata {
	Metadata::try_from(runtime_metadata(extensions, version))
		.expect("fixture metadata is a supported version")
}

pub fn runtime_metadata(
	extensions: SignedExtensions,
	version: SupportedMetadataVersions,
) -> RuntimeMetadataPrefixed {
	match version {
		SupportedMetadataVersions::V14 => {
			let pallet = |name: &'static str, index: u8, calls: Option<PalletCallMetadataV14>| {
				PalletMetadataV14::<MetaForm> {
					name,
					storage: None,
					calls,
					event: None,
					constants: vec![],
					error: None,
					index,
				}
			};
			let pallets = vec![
				pallet("System", 0, Some(PalletCallMetadataV14 { ty: meta_type::<SystemCall>() })),
				pallet("Timestamp", 3, None),
				pallet(
					"Balances",
					5,
					Some(PalletCallMetadataV14 { ty: meta_type::<BalancesCall>() }),
				),
			];
			let extrinsic = ExtrinsicMetadataV14 {
				ty: meta_type::<()>(),
				version: 4,
				signed_extensions: extensions
					.identifiers()
					.into_iter()
					.map(|identifier| SignedExtensionMetadataV14::<MetaForm> {
						identifier,
						ty: SignedExtensions::extra_ty(identifier),
						additional_signed: meta_type::<()>(),
					})
					.collect(),
			};
			RuntimeMetadataV14::new(pallets, extrinsic, meta_type::<()>()).into()
		},
		SupportedMetadataVersions::V15 => {
			let pallet = |name: &'static str, index: u8, calls: Option<PalletCallMetadataV15>| {
				PalletMetadataV15::<MetaForm> {
					name,
					storage: None,
					calls,
					event: None,
					constants: vec![],
					error: None,
					index,
					docs: vec![],
				}
			};
			let pallets = vec![
				pallet("System", 0, Some(PalletCallMetadataV15 { ty: meta_type::<SystemCall>() })),
				pallet("Timestamp", 3, None),
				pallet(
					"Balances",
					5,
					Some(PalletCallMetadataV15 { ty: meta_type::<BalancesCall>() }),
				),
			];
			let extrinsic = ExtrinsicMetadataV15 {
				version: 4,
				address_ty: meta_type::<MultiAddress<AccountId32, ()>>(),
				call_ty: meta_type::<()>(),
				signature_ty: meta_type::<sp_runtime::MultiSignature>(),
				extra_ty: meta_type::<()>(),
				signed_extensions: extensions
					.identifiers()
					.into_iter()
					.map(|identifier| SignedExtensionMetadataV15::<MetaForm> {
						identifier,
						ty: SignedExtensions::extra_ty(identifier),
						additional_signed: meta_type::<()>(),
					})
					.collect(),
			};
			let outer_enums = OuterEnums {
				call_enum_ty: meta_type::<()>(),
				event_enum_ty: meta_type::<()>(),
				error_enum_ty: meta_type::<()>(),
			};
			RuntimeMetadataV15::new(
				pallets,
				extrinsic,
				meta_type::<()>(),
				vec![],
				outer_enums,
				CustomMetadata { map: Default::default() },
			)
			.into()
		},
	}
}
