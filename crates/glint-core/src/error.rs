// Copyright 2025 eraflo
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

//! Error types surfaced by the asset system.

use crate::asset::{AssetUUID, TypeHash};
use crate::stream::StreamError;
use std::path::PathBuf;
use thiserror::Error;

/// An error raised while resolving or loading an asset.
///
/// Public entry points of the asset manager log these and report failure as
/// an absent value; the type is used on the internal load path and by callers
/// that want the detailed reason.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The identifier is unknown to the asset database.
    #[error("asset {0} is not present in the asset database")]
    NotFound(AssetUUID),
    /// No asset in the database is stored at this path.
    #[error("no asset is registered for path '{0}'")]
    PathNotFound(String),
    /// The file could not be read.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// No loader is registered for the file extension.
    #[error("no loader registered for extension '{0}'")]
    ExtensionUnsupported(String),
    /// The resource type was never registered.
    #[error("resource type {0} is not registered")]
    UnregisteredType(TypeHash),
    /// The root resource exists but does not contain the requested subresource.
    #[error("subresource '{subresource}' not found in '{path}'")]
    SubresourceMissing {
        /// The path of the root resource.
        path: String,
        /// The requested subresource path.
        subresource: String,
    },
    /// A loader reported a failure.
    #[error("failed to load asset {uuid} from '{path}': {message}")]
    LoadFailed {
        /// The identifier of the asset being loaded.
        uuid: AssetUUID,
        /// The file the loader was reading.
        path: String,
        /// The loader's error message.
        message: String,
    },
    /// A binary stream was malformed.
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// The resource exists but is not of the requested type.
    #[error("asset {uuid} is not a {expected}")]
    TypeMismatch {
        /// The identifier of the asset.
        uuid: AssetUUID,
        /// The name of the requested type.
        expected: &'static str,
    },
}
