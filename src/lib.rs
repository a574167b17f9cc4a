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

//! Build, sign, attach and submit Substrate extrinsics as separate stages.
//!
//! The build stage reads a chain state snapshot from a node and produces a
//! [`bundle::BuildBundle`]. Signing needs nothing but that bundle and a secret,
//! so it can happen offline. Attaching combines both bundles into a signed
//! extrinsic that the submit stage hands to the node.

pub use api::*;
pub use xt_node_api;
pub use xt_primitives;

pub mod api;
pub mod bundle;
pub mod config;
pub mod pipeline;
pub mod rpc;
