// Copyright 2025 PRAGMA
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lookups against a Koios indexer: scripts by hash, and the outputs currently holding given
//! assets.

pub mod client;
pub use client::{KoiosClient, LookupError};

pub mod registry;
pub use registry::{InMemoryRegistry, ScriptRegistry, resolve_scripts};

pub mod types;
pub use types::{AssetInfo, InlineDatum, ScriptInfo, UtxoInfo};
