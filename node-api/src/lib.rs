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

//! Node metadata handling and metadata driven call encoding.

pub use call::{encode_call, CallError, EncodedCall};
pub use encode::{encode_value_as_type, EncodeError};
pub use metadata::{InvalidMetadataError, Metadata, MetadataError, PalletMetadata};
pub use value::{Composite, Primitive, Value, Variant};

pub mod call;
pub mod encode;
pub mod metadata;
pub mod value;

#[cfg(any(feature = "mocks", test))]
pub mod test_utils;
