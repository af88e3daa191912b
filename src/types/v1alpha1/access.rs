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
use crate::types::v1alpha1::require_non_empty;
use kube::KubeSchema;
use serde::{Deserialize, Serialize};

/// Access type whose referenced object must expose a parseable kubeconfig,
/// e.g. a Secret carrying a `kubeconfig` key.
pub const ACCESS_TYPE_KUBECONFIG: &str = "KUBECONFIG";

/// Reference to an object supplying connection or credential material for
/// a cluster.
///
/// Only the reference is stored; resolving it into a live client is up to
/// the consumer.
#[derive(Deserialize, Serialize, Clone, Debug, KubeSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessObjectRef {
    /// Type of the access info. `KUBECONFIG` is reserved; other values are
    /// implementation defined.
    #[serde(rename = "type")]
    #[x_kube(validation = Rule::new("self != ''").message("type must not be empty"))]
    pub type_: String,

    /// API group of the referenced resource. Absent or empty is the core group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Resource name of the referenced object, e.g. `secrets`.
    #[x_kube(validation = Rule::new("self != ''").message("resource must not be empty"))]
    pub resource: String,

    /// Name of the referenced object.
    #[x_kube(validation = Rule::new("self != ''").message("name must not be empty"))]
    pub name: String,

    /// Namespace of the referenced object. Absent or empty means the object
    /// is cluster scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl AccessObjectRef {
    pub fn new(
        type_: impl Into<String>,
        resource: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            resource: resource.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// A `KUBECONFIG` reference to a core-group Secret.
    pub fn kubeconfig_secret(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::new(ACCESS_TYPE_KUBECONFIG, "secrets", name)
        }
    }

    pub fn is_kubeconfig(&self) -> bool {
        self.type_ == ACCESS_TYPE_KUBECONFIG
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.as_deref().is_none_or(str::is_empty)
    }

    pub fn is_core_group(&self) -> bool {
        self.group.as_deref().is_none_or(str::is_empty)
    }

    /// Validates the reference found at `path`, e.g. `spec.accessObjectRef[0]`.
    pub fn validate(&self, path: &str) -> Result<(), Error> {
        require_non_empty(format!("{path}.type"), &self.type_)?;
        require_non_empty(format!("{path}.resource"), &self.resource)?;
        require_non_empty(format!("{path}.name"), &self.name)?;
        Ok(())
    }
}
