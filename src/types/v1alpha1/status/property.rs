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

use crate::types::error::Error;
use crate::types::v1alpha1::check_length;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const PROPERTY_NAME_MAX_LENGTH: usize = 253;
pub const PROPERTY_VALUE_MAX_LENGTH: usize = 1024;

/// Well known property carrying a unique cluster identifier.
pub const PROPERTY_CLUSTER_ID: &str = "id.k8s.io";

/// A property collected from a cluster. The set of properties is not uniform
/// across a fleet; some are vendor or version specific.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
pub struct Property {
    #[schemars(length(min = 1, max = PROPERTY_NAME_MAX_LENGTH))]
    pub name: String,

    #[schemars(length(min = 1, max = PROPERTY_VALUE_MAX_LENGTH))]
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self, path: &str) -> Result<(), Error> {
        check_length(
            format!("{path}.name"),
            &self.name,
            1,
            PROPERTY_NAME_MAX_LENGTH,
        )?;
        check_length(
            format!("{path}.value"),
            &self.value,
            1,
            PROPERTY_VALUE_MAX_LENGTH,
        )
    }
}

/// Looks up `name`; when the name repeats, the last entry wins.
pub fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().rev().find(|p| p.name == name)
}

/// Replaces the value of the first entry named like `property`, dropping any
/// later duplicates, or appends it.
pub fn upsert_property(properties: &mut Vec<Property>, property: Property) {
    match properties.iter().position(|p| p.name == property.name) {
        Some(first) => {
            let mut index = 0;
            properties.retain(|p| {
                let keep = index <= first || p.name != property.name;
                index += 1;
                keep
            });
            properties[first] = property;
        }
        None => properties.push(property),
    }
}
