// This file bases on subxt (Parity Technologies (UK))
// https://github.com/paritytech/subxt/
// And was adapted by Supercomputing Systems AG.
//
// Copyright 2019-2023 Parity Technologies (UK) Ltd and Supercomputing Systems AG.
// This file is licensed as Apache-2.0
// see LICENSE for license details.

//! Handle substrate chain metadata.

use crate::metadata::{InvalidMetadataError, MetadataError};
use codec::{Decode, Encode, Input, Output};
use frame_metadata::{RuntimeMetadata, RuntimeMetadataPrefixed, META_RESERVED};
use scale_info::{form::PortableForm, PortableRegistry, Type, TypeDef, Variant};
use std::{collections::BTreeMap, sync::Arc};
use xt_primitives::SignedExtensionLayout;

/// Nesting depth after which a type is no longer considered zero sized.
const MAX_TYPE_DEPTH: usize = 16;

/// Metadata wrapper around the runtime metadata. Offers direct pallet and call access
/// independent of the metadata version the node serves.
#[derive(Clone, Debug)]
pub struct Metadata {
	runtime_metadata: Arc<RuntimeMetadataPrefixed>,
	types: PortableRegistry,
	pallets: BTreeMap<String, PalletMetadataInner>,
	/// Find the location in the pallet map by pallet index.
	pallets_by_index: BTreeMap<u8, String>,
	extrinsic_version: u8,
	signed_extensions: Vec<SignedExtensionMetadata>,
}

/// A signed extension declared by the runtime, with the types it adds to the
/// extrinsic (`ty`) and to the signed payload (`additional_signed`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedExtensionMetadata {
	pub identifier: String,
	pub extra_ty: u32,
	pub additional_signed_ty: u32,
}

impl Metadata {
	/// An iterator over all of the available pallets.
	pub fn pallets(&self) -> impl Iterator<Item = PalletMetadata<'_>> {
		self.pallets.values().map(|inner| PalletMetadata { inner, types: &self.types })
	}

	/// Access a pallet given its encoded variant index.
	pub fn pallet_by_index(&self, variant_index: u8) -> Option<PalletMetadata<'_>> {
		let name = self.pallets_by_index.get(&variant_index)?;
		self.pallet_by_name(name)
	}

	/// Access a pallet given its name. Besides the exact name, the lower camel case
	/// and snake case spellings (`balances`, `transaction_payment`) are accepted.
	pub fn pallet_by_name(&self, pallet_name: &str) -> Option<PalletMetadata<'_>> {
		let inner = self.pallets.get(pallet_name).or_else(|| {
			let wanted = normalize_name(pallet_name);
			self.pallets.values().find(|p| normalize_name(&p.name) == wanted)
		})?;
		Some(PalletMetadata { inner, types: &self.types })
	}

	/// Return the type registry embedded within the metadata.
	pub fn types(&self) -> &PortableRegistry {
		&self.types
	}

	/// Resolve a type definition.
	pub fn resolve_type(&self, id: u32) -> Option<&Type<PortableForm>> {
		self.types.resolve(id)
	}

	/// Extrinsic format version the runtime expects.
	pub fn extrinsic_version(&self) -> u8 {
		self.extrinsic_version
	}

	/// Identifiers of the signed extensions, in the order the runtime checks them.
	pub fn signed_extensions(&self) -> impl Iterator<Item = &str> {
		self.signed_extensions.iter().map(|e| e.identifier.as_str())
	}

	pub fn signed_extension_metadata(&self) -> &[SignedExtensionMetadata] {
		&self.signed_extensions
	}

	/// The payload layout for this runtime's signed extensions.
	///
	/// Extensions the payload does not know are only accepted if they add no bytes,
	/// neither to the extrinsic nor to the signed payload.
	pub fn signed_extension_layout(&self) -> Result<SignedExtensionLayout, InvalidMetadataError> {
		let unsupported = self.signed_extensions.iter().find(|e| {
			!SignedExtensionLayout::is_known(&e.identifier) &&
				!(self.is_zero_sized(e.extra_ty) && self.is_zero_sized(e.additional_signed_ty))
		});
		if let Some(extension) = unsupported {
			return Err(InvalidMetadataError::UnsupportedSignedExtension(
				extension.identifier.clone(),
			))
		}
		Ok(SignedExtensionLayout::from_identifiers(self.signed_extensions()))
	}

	/// Whether values of type `id` always encode to zero bytes, like `()` or empty structs.
	pub fn is_zero_sized(&self, id: u32) -> bool {
		self.is_zero_sized_at(id, 0)
	}

	fn is_zero_sized_at(&self, id: u32, depth: usize) -> bool {
		if depth > MAX_TYPE_DEPTH {
			return false
		}
		match self.types.resolve(id).map(|ty| &ty.type_def) {
			Some(TypeDef::Tuple(tuple)) =>
				tuple.fields.iter().all(|field| self.is_zero_sized_at(field.id, depth + 1)),
			Some(TypeDef::Composite(composite)) =>
				composite.fields.iter().all(|field| self.is_zero_sized_at(field.ty.id, depth + 1)),
			Some(TypeDef::Array(array)) =>
				array.len == 0 || self.is_zero_sized_at(array.type_param.id, depth + 1),
			_ => false,
		}
	}

	/// Exposes the runtime metadata.
	pub fn runtime_metadata(&self) -> &RuntimeMetadataPrefixed {
		&self.runtime_metadata
	}
}

/// Err wrappers around option.
impl Metadata {
	/// Identical to `metadata.pallet_by_name()`, but returns an error if the pallet is not found.
	pub fn pallet_by_name_err(&self, name: &str) -> Result<PalletMetadata<'_>, MetadataError> {
		self.pallet_by_name(name)
			.ok_or_else(|| MetadataError::PalletNameNotFound(name.to_string()))
	}

	/// Identical to `metadata.pallet_by_index()`, but returns an error if the pallet is not found.
	pub fn pallet_by_index_err(&self, index: u8) -> Result<PalletMetadata<'_>, MetadataError> {
		self.pallet_by_index(index).ok_or(MetadataError::PalletIndexNotFound(index))
	}
}

/// Metadata for a specific pallet.
#[derive(Debug, Clone, Copy)]
pub struct PalletMetadata<'a> {
	inner: &'a PalletMetadataInner,
	types: &'a PortableRegistry,
}

impl<'a> PalletMetadata<'a> {
	/// The pallet name.
	pub fn name(&self) -> &'a str {
		&self.inner.name
	}

	/// The pallet index.
	pub fn index(&self) -> u8 {
		self.inner.index
	}

	/// Type of the pallet's call enum, if the pallet has calls.
	pub fn call_ty_id(&self) -> Option<u32> {
		self.inner.call_ty
	}

	/// All call variants of the pallet.
	pub fn call_variants(&self) -> Option<&'a [Variant<PortableForm>]> {
		let ty = self.types.resolve(self.inner.call_ty?)?;
		match &ty.type_def {
			TypeDef::Variant(variant) => Some(&variant.variants),
			_ => None,
		}
	}

	/// Return a call variant given its name. Lower camel case spellings
	/// (`transferKeepAlive`) are accepted as well.
	pub fn call_variant_by_name(&self, call_name: &str) -> Option<&'a Variant<PortableForm>> {
		let variants = self.call_variants()?;
		variants.iter().find(|v| v.name == call_name).or_else(|| {
			let wanted = normalize_name(call_name);
			variants.iter().find(|v| normalize_name(&v.name) == wanted)
		})
	}

	/// Identical to `call_variant_by_name()`, but returns an error if the call is not found.
	pub fn call_variant_by_name_err(
		&self,
		call_name: &str,
	) -> Result<&'a Variant<PortableForm>, MetadataError> {
		if self.inner.call_ty.is_none() {
			return Err(MetadataError::PalletHasNoCalls(self.inner.name.clone()))
		}
		self.call_variant_by_name(call_name).ok_or_else(|| MetadataError::CallNotFound {
			pallet: self.inner.name.clone(),
			call: call_name.to_string(),
		})
	}
}

#[derive(Debug, Clone)]
struct PalletMetadataInner {
	name: String,
	index: u8,
	call_ty: Option<u32>,
}

fn normalize_name(name: &str) -> String {
	name.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect()
}

impl TryFrom<RuntimeMetadataPrefixed> for Metadata {
	type Error = InvalidMetadataError;

	fn try_from(metadata: RuntimeMetadataPrefixed) -> Result<Self, Self::Error> {
		if metadata.0 != META_RESERVED {
			return Err(InvalidMetadataError::InvalidPrefix)
		}
		let (types, pallets, extrinsic_version, signed_extensions) = match &metadata.1 {
			RuntimeMetadata::V14(m) => (
				m.types.clone(),
				m.pallets
					.iter()
					.map(|p| PalletMetadataInner {
						name: p.name.clone(),
						index: p.index,
						call_ty: p.calls.as_ref().map(|c| c.ty.id),
					})
					.collect::<Vec<_>>(),
				m.extrinsic.version,
				m.extrinsic
					.signed_extensions
					.iter()
					.map(|e| SignedExtensionMetadata {
						identifier: e.identifier.clone(),
						extra_ty: e.ty.id,
						additional_signed_ty: e.additional_signed.id,
					})
					.collect(),
			),
			RuntimeMetadata::V15(m) => (
				m.types.clone(),
				m.pallets
					.iter()
					.map(|p| PalletMetadataInner {
						name: p.name.clone(),
						index: p.index,
						call_ty: p.calls.as_ref().map(|c| c.ty.id),
					})
					.collect::<Vec<_>>(),
				m.extrinsic.version,
				m.extrinsic
					.signed_extensions
					.iter()
					.map(|e| SignedExtensionMetadata {
						identifier: e.identifier.clone(),
						extra_ty: e.ty.id,
						additional_signed_ty: e.additional_signed.id,
					})
					.collect(),
			),
			_ => return Err(InvalidMetadataError::InvalidVersion),
		};

		let pallets_by_index = pallets.iter().map(|p| (p.index, p.name.clone())).collect();
		let pallets = pallets.into_iter().map(|p| (p.name.clone(), p)).collect();

		Ok(Metadata {
			runtime_metadata: Arc::new(metadata),
			types,
			pallets,
			pallets_by_index,
			extrinsic_version,
			signed_extensions,
		})
	}
}

impl Decode for Metadata {
	fn decode<I: Input>(input: &mut I) -> Result<Self, codec::Error> {
		let metadata = RuntimeMetadataPrefixed::decode(input)?;
		Metadata::try_from(metadata)
			.map_err(|e| codec::Error::from("invalid metadata").chain(e.to_string()))
	}
}

impl Encode for Metadata {
	fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
		self.runtime_metadata.encode_to(dest)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{
		test_metadata, test_metadata_with_version, SignedExtensions, SupportedMetadataVersions,
	};
	use test_case::test_case;

	#[test]
	fn pallets_are_found_by_name_and_index() {
		let metadata = test_metadata(SignedExtensions::Default);

		let balances = metadata.pallet_by_name("Balances").unwrap();
		assert_eq!(balances.index(), 5);
		assert_eq!(metadata.pallet_by_index(5).unwrap().name(), "Balances");
		assert_eq!(metadata.pallet_by_name("balances").unwrap().index(), 5);
		assert!(metadata.pallet_by_name("Staking").is_none());
		assert!(matches!(
			metadata.pallet_by_index_err(42),
			Err(MetadataError::PalletIndexNotFound(42))
		));
	}

	#[test]
	fn call_variants_accept_camel_case() {
		let metadata = test_metadata(SignedExtensions::Default);
		let balances = metadata.pallet_by_name("Balances").unwrap();

		assert_eq!(balances.call_variant_by_name("transfer").unwrap().index, 0);
		assert_eq!(balances.call_variant_by_name("transferKeepAlive").unwrap().index, 3);
		assert!(matches!(
			balances.call_variant_by_name_err("burn"),
			Err(MetadataError::CallNotFound { .. })
		));
	}

	#[test]
	fn pallet_without_calls_is_reported() {
		let metadata = test_metadata(SignedExtensions::Default);
		let timestamp = metadata.pallet_by_name("Timestamp").unwrap();
		assert!(matches!(
			timestamp.call_variant_by_name_err("set"),
			Err(MetadataError::PalletHasNoCalls(name)) if name == "Timestamp"
		));
	}

	#[test]
	fn metadata_survives_scale_roundtrip() {
		let metadata = test_metadata(SignedExtensions::AssetTipAndMetadataHash);
		let decoded = Metadata::decode(&mut &metadata.encode()[..]).unwrap();

		assert_eq!(decoded.extrinsic_version(), 4);
		assert_eq!(
			decoded.signed_extensions().collect::<Vec<_>>(),
			metadata.signed_extensions().collect::<Vec<_>>()
		);
		assert_eq!(decoded.pallets().count(), metadata.pallets().count());
	}

	#[test]
	fn v15_metadata_is_supported() {
		let metadata = test_metadata_with_version(
			SignedExtensions::AssetTipAndMetadataHash,
			SupportedMetadataVersions::V15,
		);
		let balances = metadata.pallet_by_name("Balances").unwrap();
		assert_eq!(balances.call_variant_by_name("transfer_keep_alive").unwrap().index, 3);
		assert!(metadata.signed_extensions().any(|e| e == "CheckMetadataHash"));
	}

	#[test]
	fn known_extensions_give_the_layout() {
		let metadata = test_metadata(SignedExtensions::AssetTipAndMetadataHash);
		let layout = metadata.signed_extension_layout().unwrap();
		assert!(layout.asset_tip && layout.metadata_hash_check);
	}

	#[test]
	fn zero_sized_unknown_extension_is_skipped() {
		let metadata = test_metadata(SignedExtensions::WithMarkerExtension);
		assert!(metadata.signed_extensions().any(|e| e == "PrevalidateAttests"));
		assert_eq!(metadata.signed_extension_layout().unwrap(), Default::default());
	}

	#[test_case(SupportedMetadataVersions::V14)]
	#[test_case(SupportedMetadataVersions::V15)]
	fn unknown_extension_with_data_is_rejected(version: SupportedMetadataVersions) {
		let metadata = test_metadata_with_version(SignedExtensions::WithCustomExtension, version);
		let extension = metadata
			.signed_extension_metadata()
			.iter()
			.find(|e| e.identifier == "CheckReferendumFee")
			.unwrap();
		assert!(!metadata.is_zero_sized(extension.extra_ty));
		assert!(metadata.is_zero_sized(extension.additional_signed_ty));

		assert_eq!(
			metadata.signed_extension_layout().unwrap_err(),
			InvalidMetadataError::UnsupportedSignedExtension("CheckReferendumFee".into())
		);
	}

	#[test]
	fn wrong_prefix_is_rejected() {
		let mut metadata =
			crate::test_utils::runtime_metadata(SignedExtensions::Default, SupportedMetadataVersions::V14);
		metadata.0 = 0;
		assert_eq!(Metadata::try_from(metadata).unwrap_err(), InvalidMetadataError::InvalidPrefix);
	}
}
