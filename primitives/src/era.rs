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

//! Transaction mortality.
//!
//! A mortal era is only valid within a window of `period` blocks starting at the
//! checkpoint block the signature commits to. The wire form is the one the node's
//! `CheckMortality` signed extension expects.

use crate::{BlockNumber, Error, Result};
use codec::{Decode, Encode, Input, Output};

const MIN_PERIOD: u64 = 4;
const MAX_PERIOD: u64 = 1 << 16;

/// An era to describe the longevity of a transaction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Era {
	/// The transaction is valid forever.
	#[default]
	Immortal,
	/// Build through [`Era::mortal`] or [`Era::from_bytes`]. `period` must be a power
	/// of two in `[4, 65536]` and `phase` a quantized value below it, otherwise the
	/// era does not survive encoding. See [`Era::is_normalized`].
	Mortal { period: u64, phase: u64 },
}

impl Era {
	/// Create a mortal era valid for (roughly) `period` blocks from `current` on.
	///
	/// The period is rounded up to the next power of two and clamped to `[4, 65536]`.
	/// For periods above 4096 the phase is quantized, so the era may start a few
	/// blocks before `current`.
	pub fn mortal(period: u64, current: BlockNumber) -> Self {
		let period = period
			.checked_next_power_of_two()
			.unwrap_or(MAX_PERIOD)
			.clamp(MIN_PERIOD, MAX_PERIOD);
		let phase = current % period;
		let quantize_factor = quantize_factor(period);
		let quantized_phase = phase / quantize_factor * quantize_factor;

		Era::Mortal { period, phase: quantized_phase }
	}

	/// Era for a user request. A period of `0` means immortal.
	///
	/// The period comes from signed configuration input, so negative values are rejected here.
	pub fn from_request(current: BlockNumber, period: i64) -> Result<Self> {
		match period {
			0 => Ok(Era::Immortal),
			p if p < 0 => Err(Error::InvalidEra(format!("negative period {p}"))),
			p => Ok(Era::mortal(p as u64, current)),
		}
	}

	/// Decode an era from its wire bytes. All bytes must be consumed.
	pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
		let era = Era::decode(&mut bytes).map_err(|e| Error::InvalidEra(e.to_string()))?;
		if !bytes.is_empty() {
			return Err(Error::InvalidEra(format!("{} trailing bytes", bytes.len())))
		}
		Ok(era)
	}

	/// Whether the era is one [`Era::mortal`] can produce.
	pub fn is_normalized(&self) -> bool {
		match *self {
			Era::Immortal => true,
			Era::Mortal { period, phase } =>
				period.is_power_of_two() &&
					(MIN_PERIOD..=MAX_PERIOD).contains(&period) &&
					phase < period && phase % quantize_factor(period) == 0,
		}
	}

	pub fn is_immortal(&self) -> bool {
		matches!(self, Era::Immortal)
	}

	pub fn period(&self) -> Option<u64> {
		match self {
			Era::Immortal => None,
			Era::Mortal { period, .. } => Some(*period),
		}
	}

	/// Get the block number of the start of the era whose properties this object
	/// describes that `current` belongs to.
	pub fn birth(self, current: BlockNumber) -> BlockNumber {
		match self {
			Era::Immortal => 0,
			Era::Mortal { period, phase } => (current.max(phase) - phase) / period * period + phase,
		}
	}

	/// Get the block number of the first block at which the era has ended.
	pub fn death(self, current: BlockNumber) -> BlockNumber {
		match self {
			Era::Immortal => BlockNumber::MAX,
			Era::Mortal { period, .. } => self.birth(current).saturating_add(period),
		}
	}

	/// Whether a transaction signed against `checkpoint` is still valid at `block`.
	pub fn is_valid_at(self, checkpoint: BlockNumber, block: BlockNumber) -> bool {
		match self {
			Era::Immortal => true,
			Era::Mortal { .. } => block >= checkpoint && self.birth(block) == checkpoint,
		}
	}
}

fn quantize_factor(period: u64) -> u64 {
	(period >> 12).max(1)
}

impl Encode for Era {
	fn size_hint(&self) -> usize {
		match self {
			Era::Immortal => 1,
			Era::Mortal { .. } => 2,
		}
	}

	fn encode_to<T: Output + ?Sized>(&self, output: &mut T) {
		match self {
			Era::Immortal => output.push_byte(0),
			Era::Mortal { period, phase } => {
				let quantize_factor = quantize_factor(*period);
				let low = (period.trailing_zeros().saturating_sub(1)).clamp(1, 15) as u16;
				let high = ((phase / quantize_factor) << 4) as u16;
				(low | high).encode_to(output);
			},
		}
	}
}

impl Decode for Era {
	fn decode<I: Input>(input: &mut I) -> core::result::Result<Self, codec::Error> {
		let first = input.read_byte()?;
		if first == 0 {
			return Ok(Era::Immortal)
		}
		let encoded = first as u64 + ((input.read_byte()? as u64) << 8);
		let period = 2 << (encoded % (1 << 4));
		let quantize_factor = quantize_factor(period);
		let phase = (encoded >> 4) * quantize_factor;
		if period >= MIN_PERIOD && phase < period {
			Ok(Era::Mortal { period, phase })
		} else {
			Err("Invalid period and phase".into())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sp_runtime::generic::Era as RuntimeEra;
	use test_case::test_case;

	#[test]
	fn immortal_encodes_as_single_zero_byte() {
		assert_eq!(Era::Immortal.encode(), vec![0u8]);
		assert_eq!(Era::from_bytes(&[0]).unwrap(), Era::Immortal);
	}

	#[test_case(64, 42 ; "small period")]
	#[test_case(32768, 20000 ; "quantized phase")]
	#[test_case(3, 1 ; "period below minimum")]
	#[test_case(100, 1000 ; "non power of two period")]
	#[test_case(1 << 20, 77 ; "period above maximum")]
	#[test_case(u64::MAX, 5 ; "period overflowing next power of two")]
	fn mortal_matches_runtime_encoding(period: u64, current: u64) {
		let era = Era::mortal(period, current);
		let expected = RuntimeEra::mortal(period, current);

		assert_eq!(era.encode(), expected.encode());
		assert_eq!(era.birth(current), expected.birth(current));
		assert_eq!(era.death(current), expected.death(current));
	}

	#[test]
	fn mortal_roundtrips_through_bytes() {
		let era = Era::mortal(64, 1000);
		assert_eq!(era, Era::Mortal { period: 64, phase: 40 });
		assert_eq!(Era::from_bytes(&era.encode()).unwrap(), era);
	}

	#[test]
	fn validity_window_spans_one_period_from_checkpoint() {
		let current = 1000;
		let era = Era::from_bytes(&Era::mortal(64, current).encode()).unwrap();
		let checkpoint = era.birth(current);
		assert_eq!(checkpoint, current);

		assert!(!era.is_valid_at(checkpoint, checkpoint - 1));
		for block in checkpoint..checkpoint + 64 {
			assert!(era.is_valid_at(checkpoint, block), "block {block} must be valid");
		}
		assert!(!era.is_valid_at(checkpoint, checkpoint + 64));
		assert!(!era.is_valid_at(checkpoint, checkpoint + 1000));
	}

	#[test]
	fn quantized_era_is_born_before_current() {
		let era = Era::from_request(1001, 8192).unwrap();
		assert_eq!(era, Era::Mortal { period: 8192, phase: 1000 });
		assert_eq!(era.birth(1001), 1000);
		assert!(era.is_valid_at(1000, 1001));
		assert!(!era.is_valid_at(1001, 1001));
		// Anchoring at the birth block yields the same era.
		assert_eq!(Era::mortal(8192, 1000), era);
	}

	#[test_case(Era::Immortal, true ; "immortal")]
	#[test_case(Era::mortal(100, 1000), true ; "built by mortal")]
	#[test_case(Era::Mortal { period: 100, phase: 3 }, false ; "period not a power of two")]
	#[test_case(Era::Mortal { period: 2, phase: 1 }, false ; "period below minimum")]
	#[test_case(Era::Mortal { period: 64, phase: 64 }, false ; "phase beyond period")]
	#[test_case(Era::Mortal { period: 8192, phase: 1001 }, false ; "unquantized phase")]
	fn normalized_eras_survive_encoding(era: Era, normalized: bool) {
		assert_eq!(era.is_normalized(), normalized);
		if normalized {
			assert_eq!(Era::from_bytes(&era.encode()).unwrap(), era);
		}
	}

	#[test]
	fn immortal_is_always_valid() {
		assert!(Era::Immortal.is_valid_at(0, 0));
		assert!(Era::Immortal.is_valid_at(0, BlockNumber::MAX));
		assert_eq!(Era::Immortal.death(12), BlockNumber::MAX);
	}

	#[test]
	fn from_request_handles_immortal_and_negative_periods() {
		assert_eq!(Era::from_request(10, 0).unwrap(), Era::Immortal);
		assert_eq!(Era::from_request(1000, 64).unwrap(), Era::mortal(64, 1000));
		assert!(matches!(Era::from_request(10, -1), Err(Error::InvalidEra(_))));
	}

	#[test_case(&[] ; "empty")]
	#[test_case(&[0x05] ; "truncated mortal")]
	#[test_case(&[0x00, 0x01] ; "trailing byte")]
	#[test_case(&[0x41, 0x00] ; "phase beyond period")]
	#[test_case(&[0x10, 0x00] ; "period below minimum")]
	fn malformed_bytes_are_invalid_era(bytes: &[u8]) {
		assert!(matches!(Era::from_bytes(bytes), Err(Error::InvalidEra(_))));
	}
}
