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

//! Offline primitives of the extrinsic pipeline: mortality eras, the signature
//! payload, signing and the final extrinsic assembly. Nothing in here talks to a node.

pub use era::*;
pub use error::*;
pub use extrinsic::*;
pub use payload::*;
pub use signer::*;
pub use types::*;

pub mod era;
pub mod error;
pub mod extrinsic;
pub mod payload;
pub mod serde_impls;
pub mod signer;
pub mod types;
