// This file bases on scale-value (Parity Technologies (UK))
// https://github.com/paritytech/scale-value/
// And was adapted by Supercomputing Systems AG and Integritee AG.
//
// Copyright 2019-2022 Parity Technologies (UK) Ltd, Supercomputing Systems AG and Integritee AG.
// This file is licensed as Apache-2.0
// see LICENSE for license details.

//! Type directed SCALE encoding of [`Value`]s.
//!
//! Besides the plain shapes, a few conveniences for json arguments are understood:
//! decimal strings for integers, `0x` hex strings for byte sequences and arrays,
//! SS58 strings for 32 byte account ids, a bare account where a `MultiAddress`
//! is expected, and unit / any value for `Option::None` / `Option::Some`.

use crate::value::{Composite, Primitive, Value, Variant};
use codec::{Compact, Encode};
use log::trace;
use scale_info::{
	form::PortableForm, Field, PortableRegistry, TypeDef, TypeDefArray, TypeDefCompact,
	TypeDefComposite, TypeDefPrimitive, TypeDefSequence, TypeDefTuple, TypeDefVariant,
};
use sp_core::crypto::{AccountId32, Ss58Codec};

pub type TypeId = u32;

/// An error encoding a [`Value`] into SCALE bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
	/// The composite type we're trying to encode is the wrong length for the type we're
	/// trying to encode it into.
	#[error(
		"composite of {actual_len} values does not fit type {expected} with {expected_len} fields"
	)]
	CompositeIsWrongLength { actual_len: usize, expected: TypeId, expected_len: usize },
	/// The composite is expected to contain named or unnamed values to encode properly,
	/// and the opposite is true.
	#[error("composite has named fields, type {expected} has unnamed ones")]
	CompositeIsWrongShape { expected: TypeId },
	/// The variant we're trying to encode was not found in the type we're encoding into.
	#[error("variant `{name}` not found in type {expected}")]
	VariantNotFound { name: String, expected: TypeId },
	/// The variant or composite field we're trying to encode is not present in the type
	/// we're encoding into.
	#[error("field `{missing_field_name}` of type {expected} is missing")]
	CompositeFieldIsMissing { missing_field_name: String, expected: TypeId },
	/// The type we're trying to encode into cannot be found in the type registry provided.
	#[error("type {0} not found in registry")]
	TypeIdNotFound(TypeId),
	/// The [`Value`] type we're trying to encode is not the correct shape for the type
	/// we're trying to encode it into.
	#[error("{actual} cannot be encoded as type {expected}")]
	WrongShape { actual: String, expected: TypeId },
	/// The type ID given is supposed to be compact encoded, but this is not possible to
	/// do automatically.
	#[error("type {0} cannot be compact encoded")]
	CannotCompactEncode(TypeId),
	#[error("bit sequences are not supported (type {0})")]
	BitSequenceUnsupported(TypeId),
	/// The input could not be turned into a [`Value`] in the first place.
	#[error("invalid value: {0}")]
	InvalidValue(String),
}

fn wrong_shape(value: &Value, expected: TypeId) -> EncodeError {
	EncodeError::WrongShape { actual: format!("{value:?}"), expected }
}

/// Attempt to SCALE Encode a Value according to the [`TypeId`] and
/// [`PortableRegistry`] provided.
pub fn encode_value_as_type(
	value: &Value,
	type_id: TypeId,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	let ty = types.resolve(type_id).ok_or(EncodeError::TypeIdNotFound(type_id))?;
	trace!("encoding {:?} as type {} ({})", value, type_id, ty.path.segments.join("::"));

	match &ty.type_def {
		TypeDef::Composite(inner) => encode_composite_value(value, type_id, inner, types, bytes),
		TypeDef::Sequence(inner) => encode_sequence_value(value, type_id, inner, types, bytes),
		TypeDef::Array(inner) => encode_array_value(value, type_id, inner, types, bytes),
		TypeDef::Tuple(inner) => encode_tuple_value(value, type_id, inner, types, bytes),
		TypeDef::Variant(inner) => encode_variant_value(value, type_id, inner, types, bytes),
		TypeDef::Primitive(inner) => encode_primitive_value(value, type_id, inner, bytes),
		TypeDef::Compact(inner) => encode_compact_value(value, type_id, inner, types, bytes),
		TypeDef::BitSequence(_) => Err(EncodeError::BitSequenceUnsupported(type_id)),
	}
}

fn encode_composite_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefComposite<PortableForm>,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	match value {
		Value::Composite(composite) if composite.len() == ty.fields.len() || ty.fields.len() != 1 =>
			encode_composite_fields(composite, &ty.fields, type_id, types, bytes),
		// A 1-field composite type? try encoding inner content then.
		_ if ty.fields.len() == 1 => encode_value_as_type(value, ty.fields[0].ty.id, types, bytes),
		_ => Err(wrong_shape(value, type_id)),
	}
}

fn encode_sequence_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefSequence<PortableForm>,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	let inner_ty = ty.type_param.id;
	match value {
		// Let's see whether our composite type is the right length,
		// and try to encode each inner value into what the sequence wants.
		Value::Composite(c) => {
			// Compact encoded length comes first
			Compact(c.len() as u64).encode_to(bytes);
			for value in c.values() {
				encode_value_as_type(value, inner_ty, types, bytes)?;
			}
		},
		// Byte sequences may be given as hex or, for things like remarks, as plain text.
		Value::Primitive(Primitive::String(s)) if is_u8(inner_ty, types) => {
			let raw = match s.strip_prefix("0x") {
				Some(_) => decode_hex(s, value, type_id)?,
				None => s.as_bytes().to_vec(),
			};
			raw.encode_to(bytes);
		},
		// As a special case, primitive U256/I256s are arrays, and may be compatible
		// with the sequence type being asked for, too.
		Value::Primitive(Primitive::I256(a) | Primitive::U256(a)) => {
			Compact(a.len() as u64).encode_to(bytes);
			for val in a {
				encode_value_as_type(&Value::uint(*val), inner_ty, types, bytes)
					.map_err(|_| wrong_shape(value, type_id))?;
			}
		},
		_ => return Err(wrong_shape(value, type_id)),
	};
	Ok(())
}

fn encode_array_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefArray<PortableForm>,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	let arr_len = ty.len as usize;
	let inner_ty = ty.type_param.id;
	match value {
		// Let's see whether our composite type is the right length,
		// and try to encode each inner value into what the array wants.
		Value::Composite(c) => {
			if c.len() != arr_len {
				return Err(EncodeError::CompositeIsWrongLength {
					actual_len: c.len(),
					expected: type_id,
					expected_len: arr_len,
				})
			}
			for value in c.values() {
				encode_value_as_type(value, inner_ty, types, bytes)?;
			}
		},
		// Byte arrays: `0x` hex, or an SS58 address for 32 byte account ids.
		Value::Primitive(Primitive::String(s)) if is_u8(inner_ty, types) => {
			let raw = if s.starts_with("0x") {
				decode_hex(s, value, type_id)?
			} else if arr_len == 32 {
				let account = AccountId32::from_ss58check(s).map_err(|e| {
					EncodeError::InvalidValue(format!("`{s}` is not an SS58 address: {e:?}"))
				})?;
				<[u8; 32]>::from(account).to_vec()
			} else {
				return Err(wrong_shape(value, type_id))
			};
			if raw.len() != arr_len {
				return Err(EncodeError::CompositeIsWrongLength {
					actual_len: raw.len(),
					expected: type_id,
					expected_len: arr_len,
				})
			}
			bytes.extend_from_slice(&raw);
		},
		// As a special case, primitive U256/I256s are arrays, and may be compatible
		// with the array type being asked for, too.
		Value::Primitive(Primitive::I256(a) | Primitive::U256(a)) => {
			if a.len() != arr_len {
				return Err(wrong_shape(value, type_id))
			}
			for val in a {
				encode_value_as_type(&Value::uint(*val), inner_ty, types, bytes)
					.map_err(|_| wrong_shape(value, type_id))?;
			}
		},
		_ => return Err(wrong_shape(value, type_id)),
	};
	Ok(())
}

fn encode_tuple_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefTuple<PortableForm>,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	match value {
		Value::Composite(composite) => {
			if composite.len() != ty.fields.len() {
				return Err(EncodeError::CompositeIsWrongLength {
					actual_len: composite.len(),
					expected: type_id,
					expected_len: ty.fields.len(),
				})
			}
			// We don't care whether the fields are named or unnamed
			// as long as we have the number of them that we expect..
			for (field_ty, value) in ty.fields.iter().zip(composite.values()) {
				encode_value_as_type(value, field_ty.id, types, bytes)?;
			}
			Ok(())
		},
		// A 1-field tuple? try encoding inner content then.
		_ if ty.fields.len() == 1 => encode_value_as_type(value, ty.fields[0].id, types, bytes),
		_ => Err(wrong_shape(value, type_id)),
	}
}

fn encode_variant_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefVariant<PortableForm>,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	let find = |name: &str| ty.variants.iter().find(|v| v.name == name);

	let Value::Variant(variant) = value else {
		// `Option<T>`: unit is `None`, anything else is `Some(value)`.
		if let (Some(none), Some(some)) = (find("None"), find("Some")) {
			return if value.is_unit() {
				none.index.encode_to(bytes);
				Ok(())
			} else {
				some.index.encode_to(bytes);
				encode_fields_of(value, &some.fields, type_id, types, bytes)
			}
		}
		// `MultiAddress`-like: a bare account is the `Id` variant.
		if let Some(id) = find("Id").filter(|v| v.fields.len() == 1) {
			id.index.encode_to(bytes);
			return encode_value_as_type(value, id.fields[0].ty.id, types, bytes)
		}
		return Err(wrong_shape(value, type_id))
	};

	let Variant { name, values } = variant;
	let variant_type = find(name)
		.ok_or_else(|| EncodeError::VariantNotFound { name: name.clone(), expected: type_id })?;

	variant_type.index.encode_to(bytes);
	encode_composite_fields(values, &variant_type.fields, type_id, types, bytes)
}

/// Encode a single value into the fields of a variant, unwrapping it if there is exactly one field.
fn encode_fields_of(
	value: &Value,
	fields: &[Field<PortableForm>],
	type_id: TypeId,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	match (value, fields) {
		(_, [field]) => encode_value_as_type(value, field.ty.id, types, bytes),
		(Value::Composite(composite), _) =>
			encode_composite_fields(composite, fields, type_id, types, bytes),
		_ => Err(wrong_shape(value, type_id)),
	}
}

fn encode_composite_fields(
	composite: &Composite,
	fields: &[Field<PortableForm>],
	type_id: TypeId,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	if fields.len() != composite.len() {
		return Err(EncodeError::CompositeIsWrongLength {
			actual_len: composite.len(),
			expected: type_id,
			expected_len: fields.len(),
		})
	}

	match composite {
		Composite::Named(values) => {
			// Match up named values with those of the type we're encoding to.
			for field in fields {
				let Some(field_name) = field.name.as_ref() else {
					return Err(EncodeError::CompositeIsWrongShape { expected: type_id })
				};
				let value = values.iter().find(|(n, _)| n == field_name).map(|(_, v)| v).ok_or_else(
					|| EncodeError::CompositeFieldIsMissing {
						expected: type_id,
						missing_field_name: field_name.clone(),
					},
				)?;
				encode_value_as_type(value, field.ty.id, types, bytes)?;
			}
			Ok(())
		},
		// Unnamed values are taken in field order, whether the fields are named or not.
		Composite::Unnamed(values) => {
			for (field, value) in fields.iter().zip(values) {
				encode_value_as_type(value, field.ty.id, types, bytes)?;
			}
			Ok(())
		},
	}
}

// Attempt to convert a given primitive value into the integer type
// required, failing with an appropriate EncodeError if not successful.
macro_rules! primitive_to_integer {
	($id:ident, $value:ident, $prim:ident => $ty:ident) => {{
		let err = || wrong_shape($value, $id);
		let out: Result<$ty, _> = match $prim {
			Primitive::U128(v) => (*v).try_into().map_err(|_| err()),
			Primitive::I128(v) => (*v).try_into().map_err(|_| err()),
			// Treat chars as u32s to mirror what we do for decoding:
			Primitive::Char(v) => (*v as u32).try_into().map_err(|_| err()),
			// Integers beyond json's number range arrive as decimal strings.
			Primitive::String(s) => s.trim().parse::<$ty>().map_err(|_| err()),
			_ => Err(err()),
		};
		out
	}};
}

fn encode_primitive_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefPrimitive,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	let Value::Primitive(primitive) = value else { return Err(wrong_shape(value, type_id)) };

	// Attempt to encode our value type into the expected shape.
	match (ty, primitive) {
		(TypeDefPrimitive::Bool, Primitive::Bool(bool)) => {
			bool.encode_to(bytes);
		},
		(TypeDefPrimitive::Char, Primitive::Char(c)) => {
			// Treat chars as u32's
			(*c as u32).encode_to(bytes);
		},
		(TypeDefPrimitive::Str, Primitive::String(s)) => {
			s.encode_to(bytes);
		},
		(TypeDefPrimitive::I256, Primitive::I256(a)) => {
			a.encode_to(bytes);
		},
		(TypeDefPrimitive::U256, Primitive::U256(a)) => {
			a.encode_to(bytes);
		},
		(TypeDefPrimitive::U8, primitive) => {
			primitive_to_integer!(type_id, value, primitive => u8)?.encode_to(bytes);
		},
		(TypeDefPrimitive::U16, primitive) => {
			primitive_to_integer!(type_id, value, primitive => u16)?.encode_to(bytes);
		},
		(TypeDefPrimitive::U32, primitive) => {
			primitive_to_integer!(type_id, value, primitive => u32)?.encode_to(bytes);
		},
		(TypeDefPrimitive::U64, primitive) => {
			primitive_to_integer!(type_id, value, primitive => u64)?.encode_to(bytes);
		},
		(TypeDefPrimitive::U128, primitive) => {
			primitive_to_integer!(type_id, value, primitive => u128)?.encode_to(bytes);
		},
		(TypeDefPrimitive::I8, primitive) => {
			primitive_to_integer!(type_id, value, primitive => i8)?.encode_to(bytes);
		},
		(TypeDefPrimitive::I16, primitive) => {
			primitive_to_integer!(type_id, value, primitive => i16)?.encode_to(bytes);
		},
		(TypeDefPrimitive::I32, primitive) => {
			primitive_to_integer!(type_id, value, primitive => i32)?.encode_to(bytes);
		},
		(TypeDefPrimitive::I64, primitive) => {
			primitive_to_integer!(type_id, value, primitive => i64)?.encode_to(bytes);
		},
		(TypeDefPrimitive::I128, primitive) => {
			primitive_to_integer!(type_id, value, primitive => i128)?.encode_to(bytes);
		},
		_ => return Err(wrong_shape(value, type_id)),
	}
	Ok(())
}

fn encode_compact_value(
	value: &Value,
	type_id: TypeId,
	ty: &TypeDefCompact<PortableForm>,
	types: &PortableRegistry,
	bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
	// Types that are compact encodable will always
	// eventually be an integer type. Step through single field
	// composites and tuples to find it.
	let mut inner_ty_id = ty.type_param.id;
	let mut value = value;
	let inner_ty = loop {
		let inner_ty = types
			.resolve(inner_ty_id)
			.ok_or(EncodeError::TypeIdNotFound(inner_ty_id))?;

		match &inner_ty.type_def {
			TypeDef::Composite(c) if c.fields.len() == 1 => {
				inner_ty_id = c.fields[0].ty.id;
				value = unwrap_single(value);
			},
			TypeDef::Tuple(t) if t.fields.len() == 1 => {
				inner_ty_id = t.fields[0].id;
				value = unwrap_single(value);
			},
			TypeDef::Primitive(primitive) => break primitive,
			// If we get here, we have a type that can't be compact encoded:
			_ => return Err(EncodeError::CannotCompactEncode(inner_ty_id)),
		}
	};

	let Value::Primitive(primitive) = value else { return Err(wrong_shape(value, type_id)) };

	// Try to compact encode the primitive type we have into the type asked for:
	match inner_ty {
		TypeDefPrimitive::U8 => {
			let v = primitive_to_integer!(type_id, value, primitive => u8)?;
			Compact(v).encode_to(bytes);
		},
		TypeDefPrimitive::U16 => {
			let v = primitive_to_integer!(type_id, value, primitive => u16)?;
			Compact(v).encode_to(bytes);
		},
		TypeDefPrimitive::U32 => {
			let v = primitive_to_integer!(type_id, value, primitive => u32)?;
			Compact(v).encode_to(bytes);
		},
		TypeDefPrimitive::U64 => {
			let v = primitive_to_integer!(type_id, value, primitive => u64)?;
			Compact(v).encode_to(bytes);
		},
		TypeDefPrimitive::U128 => {
			let v = primitive_to_integer!(type_id, value, primitive => u128)?;
			Compact(v).encode_to(bytes);
		},
		_ => return Err(EncodeError::CannotCompactEncode(inner_ty_id)),
	};

	Ok(())
}

/// Single field wrappers may be given with or without the wrapping composite.
fn unwrap_single(value: &Value) -> &Value {
	match value {
		Value::Composite(Composite::Unnamed(values)) if values.len() == 1 => &values[0],
		Value::Composite(Composite::Named(values)) if values.len() == 1 => &values[0].1,
		other => other,
	}
}

fn is_u8(type_id: TypeId, types: &PortableRegistry) -> bool {
	matches!(
		types.resolve(type_id).map(|ty| &ty.type_def),
		Some(TypeDef::Primitive(TypeDefPrimitive::U8))
	)
}

fn decode_hex(s: &str, value: &Value, type_id: TypeId) -> Result<Vec<u8>, EncodeError> {
	hex::decode(s.trim_start_matches("0x")).map_err(|e| {
		let value = describe(value);
		EncodeError::InvalidValue(format!("{value} is not valid hex for type {type_id}: {e}"))
	})
}

fn describe(value: &Value) -> String {
	match value {
		Value::Primitive(Primitive::String(s)) => format!("`{s}`"),
		other => format!("{other:?}"),
	}
}
