// Copyright 2025 RustFS Team
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

//! `inventory.multicluster.io/v1alpha1` API types

pub mod access;
pub mod cluster;
pub mod health_probe;
pub mod list;
pub mod status;
pub mod taint;

use crate::types::error::{Error, FieldTooLongSnafu, FieldTooShortSnafu, RequiredFieldSnafu};
use snafu::ensure;

pub const GROUP: &str = "inventory.multicluster.io";
pub const VERSION: &str = "v1alpha1";

pub(crate) fn require_non_empty(field: impl Into<String>, value: &str) -> Result<(), Error> {
    ensure!(!value.is_empty(), RequiredFieldSnafu { field });
    Ok(())
}

/// Length bounds are counted in characters, matching `minLength`/`maxLength`
/// of the generated CRD schema.
pub(crate) fn check_length(
    field: impl Into<String>,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), Error> {
    let actual = value.chars().count();
    if actual < min {
        return FieldTooShortSnafu {
            field,
            min,
            actual,
        }
        .fail();
    }
    if actual > max {
        return FieldTooLongSnafu {
            field,
            max,
            actual,
        }
        .fail();
    }
    Ok(())
}
