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

use crate::types::v1alpha1::cluster::Cluster;
use crate::types::v1alpha1::{GROUP, VERSION};
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::api::ObjectList;
use serde::{Deserialize, Deserializer, Serialize};

pub const LIST_KIND: &str = "ClusterList";

/// A page of clusters as returned by a list call. Read only.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterList {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default)]
    pub metadata: metav1::ListMeta,

    /// `null` on the wire reads as an empty page.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Cluster>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Cluster>, D::Error> {
    Ok(Option::<Vec<Cluster>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ClusterList {
    pub fn new(metadata: metav1::ListMeta, items: Vec<Cluster>) -> Self {
        Self {
            api_version: format!("{GROUP}/{VERSION}"),
            kind: LIST_KIND.to_string(),
            metadata,
            items,
        }
    }

    /// Token for the next page; `None` on the last page.
    pub fn continue_token(&self) -> Option<&str> {
        self.metadata
            .continue_
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    pub fn resource_version(&self) -> Option<&str> {
        self.metadata.resource_version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.items.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Cluster> {
        self.items
            .iter()
            .find(|c| c.metadata.name.as_deref() == Some(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(Cluster::name).collect()
    }

    pub fn joined(&self) -> impl Iterator<Item = &Cluster> {
        self.items.iter().filter(|c| c.is_joined())
    }

    pub fn healthy(&self) -> impl Iterator<Item = &Cluster> {
        self.items.iter().filter(|c| c.is_healthy())
    }

    /// Appends the next page, taking over its list metadata.
    pub fn extend_page(&mut self, page: ClusterList) {
        self.items.extend(page.items);
        self.metadata = page.metadata;
    }
}

impl From<ObjectList<Cluster>> for ClusterList {
    fn from(list: ObjectList<Cluster>) -> Self {
        Self::new(list.metadata, list.items)
    }
}

impl<'a> IntoIterator for &'a ClusterList {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
