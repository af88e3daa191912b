// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("field '{}' is required and must not be empty", field))]
    RequiredField { field: String },

    #[snafu(display(
        "field '{}' must be at least {} characters (got {} characters)",
        field,
        min,
        actual
    ))]
    FieldTooShort {
        field: String,
        min: usize,
        actual: usize,
    },

    #[snafu(display(
        "field '{}' must be at most {} characters (got {} characters)",
        field,
        max,
        actual
    ))]
    FieldTooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[snafu(display("field '{}' has unsupported taint effect '{}'", field, effect))]
    InvalidTaintEffect { field: String, effect: String },

    #[snafu(display(
        "cluster '{}' was modified concurrently: expected resource version {}, found {}",
        name,
        expected,
        actual
    ))]
    Conflict {
        name: String,
        expected: String,
        actual: String,
    },

    #[snafu(display("cluster '{}' not found", name))]
    NotFound { name: String },

    #[snafu(display("cluster '{}' already exists", name))]
    AlreadyExists { name: String },

    #[snafu(display("serde_json error: {}", source))]
    SerdeJson { source: serde_json::Error },

    #[snafu(display("serde_yaml error: {}", source))]
    SerdeYaml { source: serde_yaml_ng::Error },
}

impl Error {
    /// Malformed input, rejected before anything is written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::RequiredField { .. }
                | Error::FieldTooShort { .. }
                | Error::FieldTooLong { .. }
                | Error::InvalidTaintEffect { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// The field path the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::RequiredField { field }
            | Error::FieldTooShort { field, .. }
            | Error::FieldTooLong { field, .. }
            | Error::InvalidTaintEffect { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::SerdeJson { source }
    }
}

impl From<serde_yaml_ng::Error> for Error {
    fn from(source: serde_yaml_ng::Error) -> Self {
        Error::SerdeYaml { source }
    }
}
