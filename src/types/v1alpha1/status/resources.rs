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

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version information reported by the cluster.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterVersion {
    /// Kubernetes version of the cluster, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<String>,
}

impl ClusterVersion {
    pub fn kubernetes(version: impl Into<String>) -> Self {
        Self {
            kubernetes: Some(version.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kubernetes.is_none()
    }
}

/// Resource totals aggregated over the cluster's nodes.
///
/// A resource missing from a map was not reported; it is not zero.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<BTreeMap<String, Quantity>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocatable: Option<BTreeMap<String, Quantity>>,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.capacity.is_none() && self.allocatable.is_none()
    }

    pub fn capacity_of(&self, resource: &str) -> Option<&Quantity> {
        self.capacity.as_ref()?.get(resource)
    }

    pub fn allocatable_of(&self, resource: &str) -> Option<&Quantity> {
        self.allocatable.as_ref()?.get(resource)
    }

    pub fn with_capacity(mut self, resource: &str, quantity: &str) -> Self {
        self.capacity
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.to_owned(), Quantity(quantity.to_owned()));
        self
    }

    pub fn with_allocatable(mut self, resource: &str, quantity: &str) -> Self {
        self.allocatable
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.to_owned(), Quantity(quantity.to_owned()));
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unreported_resource_is_none() {
        let resources = Resources::default().with_capacity("cpu", "16");
        assert_eq!(resources.capacity_of("cpu"), Some(&Quantity("16".to_string())));
        assert_eq!(resources.capacity_of("memory"), None);
        assert_eq!(resources.allocatable_of("cpu"), None);
        assert!(resources.allocatable.is_none());
    }

    #[test]
    fn test_empty_maps_are_distinct_from_absent() {
        let resources = Resources {
            capacity: Some(BTreeMap::new()),
            allocatable: None,
        };
        assert!(!resources.is_empty());
        let value = serde_json::to_value(&resources).unwrap();
        assert_eq!(value, serde_json::json!({ "capacity": {} }));
    }

    #[test]
    fn test_version_optional() {
        assert!(ClusterVersion::default().is_empty());
        let value = serde_json::to_value(ClusterVersion::kubernetes("v1.30.2")).unwrap();
        assert_eq!(value, serde_json::json!({ "kubernetes": "v1.30.2" }));
    }
}
