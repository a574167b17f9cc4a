// This file bases on scale-value (Parity Technologies (UK))
// https://github.com/paritytech/scale-value/
// And was adapted by Supercomputing Systems AG.
//
// Copyright (C) 2022-2023 Parity Technologies (UK) Ltd. (admin@parity.io)
// This file is a part of the scale-value crate.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//         http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Dynamic call argument values.
//!
//! A [`Value`] carries just enough shape to be encoded against a type from the
//! metadata registry. Values are usually created from json call arguments.

use crate::encode::EncodeError;

/// A dynamic call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	/// A named or unnamed struct-like, array-like or tuple-like set of values.
	Composite(Composite),
	/// An enum variant.
	Variant(Variant),
	/// A value with no internal structure.
	Primitive(Primitive),
}

impl Value {
	pub fn named_composite<S, Vals>(vals: Vals) -> Self
	where
		S: Into<String>,
		Vals: IntoIterator<Item = (S, Value)>,
	{
		Value::Composite(Composite::Named(vals.into_iter().map(|(n, v)| (n.into(), v)).collect()))
	}

	pub fn unnamed_composite<Vals: IntoIterator<Item = Value>>(vals: Vals) -> Self {
		Value::Composite(Composite::Unnamed(vals.into_iter().collect()))
	}

	pub fn variant<S: Into<String>>(name: S, values: Composite) -> Self {
		Value::Variant(Variant { name: name.into(), values })
	}

	pub fn unnamed_variant<S: Into<String>, Vals: IntoIterator<Item = Value>>(
		name: S,
		vals: Vals,
	) -> Self {
		Value::variant(name, Composite::Unnamed(vals.into_iter().collect()))
	}

	pub fn bool(b: bool) -> Self {
		Value::Primitive(Primitive::Bool(b))
	}

	pub fn char(c: char) -> Self {
		Value::Primitive(Primitive::Char(c))
	}

	pub fn uint<N: Into<u128>>(n: N) -> Self {
		Value::Primitive(Primitive::U128(n.into()))
	}

	pub fn int<N: Into<i128>>(n: N) -> Self {
		Value::Primitive(Primitive::I128(n.into()))
	}

	pub fn string<S: Into<String>>(s: S) -> Self {
		Value::Primitive(Primitive::String(s.into()))
	}

	/// A sequence of `u8` values.
	pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
		Value::unnamed_composite(bytes.as_ref().iter().map(|b| Value::uint(*b)))
	}

	/// The empty composite, which also stands for `()` and `None`.
	pub fn unit() -> Self {
		Value::Composite(Composite::Unnamed(Vec::new()))
	}

	pub fn is_unit(&self) -> bool {
		matches!(self, Value::Composite(c) if c.is_empty())
	}
}

/// A named or unnamed set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composite {
	/// Eg `{ foo: 2, bar: false }`
	Named(Vec<(String, Value)>),
	/// Eg `(2, false)`
	Unnamed(Vec<Value>),
}

impl Composite {
	pub fn len(&self) -> usize {
		match self {
			Composite::Named(values) => values.len(),
			Composite::Unnamed(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The values in order, ignoring any names.
	pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
		match self {
			Composite::Named(values) => Box::new(values.iter().map(|(_, v)| v)),
			Composite::Unnamed(values) => Box::new(values.iter()),
		}
	}
}

/// An enum variant, identified by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
	pub name: String,
	pub values: Composite,
}

/// A value with no internal structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
	Bool(bool),
	Char(char),
	String(String),
	U128(u128),
	I128(i128),
	U256([u8; 32]),
	I256([u8; 32]),
}

/// Json call arguments are mapped as follows:
///
/// * `null` is the unit value, which also encodes as `None` for options.
/// * numbers become integers. Floats are rejected. Larger integers can be given as decimal strings.
/// * arrays become unnamed composites.
/// * an object with a single key that starts upper case is an enum variant, eg `{"Id": "5Grw..."}`.
///   An array value holds the unnamed fields, an object the named fields, `null` means no fields
///   and anything else is the single unnamed field.
/// * any other object is a named composite.
impl TryFrom<serde_json::Value> for Value {
	type Error = EncodeError;

	fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
		use serde_json::Value as Json;

		Ok(match json {
			Json::Null => Value::unit(),
			Json::Bool(b) => Value::bool(b),
			Json::Number(n) =>
				if let Some(n) = n.as_u64() {
					Value::uint(n)
				} else if let Some(n) = n.as_i64() {
					Value::int(n)
				} else {
					return Err(EncodeError::InvalidValue(format!("{n} is not an integer")))
				},
			Json::String(s) => Value::string(s),
			Json::Array(items) => Value::Composite(Composite::Unnamed(
				items.into_iter().map(Value::try_from).collect::<Result<_, _>>()?,
			)),
			Json::Object(map) => {
				let is_variant = map.len() == 1 &&
					map.keys().all(|k| k.chars().next().is_some_and(char::is_uppercase));
				let mut fields = map
					.into_iter()
					.map(|(name, value)| Ok((name, Value::try_from(value)?)))
					.collect::<Result<Vec<_>, EncodeError>>()?;
				match fields.pop() {
					Some((name, inner)) if is_variant => Value::variant(name, into_fields(inner)),
					Some(last) => {
						fields.push(last);
						Value::Composite(Composite::Named(fields))
					},
					None => Value::unit(),
				}
			},
		})
	}
}

fn into_fields(value: Value) -> Composite {
	match value {
		Value::Composite(composite) => composite,
		other => Composite::Unnamed(vec![other]),
	}
}
