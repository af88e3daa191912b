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

use crate::types::error::{Error, RequiredFieldSnafu};
use crate::types::v1alpha1::access::AccessObjectRef;
use crate::types::v1alpha1::health_probe::HealthProbe;
use crate::types::v1alpha1::status::condition::{
    CONDITION_HEALTHY, CONDITION_JOINED, Condition, ConditionStatus, ConditionUpdate,
};
use crate::types::v1alpha1::status::property::PROPERTY_CLUSTER_ID;
use crate::types::v1alpha1::status::{ClusterStatus, StatusReport};
use crate::types::v1alpha1::taint::validate_taint;
use chrono::{DateTime, SubsecRound, Utc};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::{CustomResource, KubeSchema, ResourceExt};
use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use std::time::Duration;

/// Declared configuration of a cluster, written only by the registrar.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, KubeSchema, Default, PartialEq)]
#[kube(
    group = "inventory.multicluster.io",
    version = "v1alpha1",
    kind = "Cluster",
    status = "ClusterStatus",
    derive = "PartialEq",
    shortname = "icluster",
    plural = "clusters",
    singular = "cluster",
    printcolumn = r#"{"name":"Joined", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Joined\")].status"}"#,
    printcolumn = r#"{"name":"Healthy", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Healthy\")].status"}"#,
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".status.version.kubernetes"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#,
    crates(serde_json = "k8s_openapi::serde_json")
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// References to objects providing access to the cluster, e.g. a
    /// kubeconfig stored in a Secret. Empty while registration is pending.
    #[serde(
        rename = "accessObjectRef",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub access_object_refs: Vec<AccessObjectRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_probe: Option<HealthProbe>,

    /// Taints repelling workloads from the cluster during placement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<corev1::Taint>,
}

impl ClusterSpec {
    pub fn validate(&self) -> Result<(), Error> {
        for (i, access_ref) in self.access_object_refs.iter().enumerate() {
            access_ref.validate(&format!("spec.accessObjectRef[{i}]"))?;
        }
        for (i, taint) in self.taints.iter().enumerate() {
            validate_taint(taint, &format!("spec.taints[{i}]"))?;
        }
        Ok(())
    }

    /// Merges `patch` field by field. The merged spec is validated before it
    /// replaces `self`; on error `self` is untouched.
    pub fn merge(&mut self, patch: ClusterSpecPatch) -> Result<(), Error> {
        let mut next = self.clone();
        if let Some(refs) = patch.access_object_refs {
            next.access_object_refs = refs;
        }
        if let Some(probe) = patch.health_probe {
            next.health_probe = probe;
        }
        if let Some(taints) = patch.taints {
            next.taints = taints;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.health_probe
            .as_ref()
            .map(HealthProbe::heartbeat_interval)
            .unwrap_or_else(|| HealthProbe::default().heartbeat_interval())
    }

    /// First `KUBECONFIG` access reference, if any.
    pub fn kubeconfig_ref(&self) -> Option<&AccessObjectRef> {
        self.access_object_refs.iter().find(|r| r.is_kubeconfig())
    }
}

/// Field-level patch of a [`ClusterSpec`]: `None` leaves a field untouched.
///
/// `health_probe: Some(None)` clears the probe configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterSpecPatch {
    pub access_object_refs: Option<Vec<AccessObjectRef>>,
    pub health_probe: Option<Option<HealthProbe>>,
    pub taints: Option<Vec<corev1::Taint>>,
}

impl ClusterSpecPatch {
    pub fn access_object_refs(mut self, refs: Vec<AccessObjectRef>) -> Self {
        self.access_object_refs = Some(refs);
        self
    }

    pub fn health_probe(mut self, probe: Option<HealthProbe>) -> Self {
        self.health_probe = Some(probe);
        self
    }

    pub fn taints(mut self, taints: Vec<corev1::Taint>) -> Self {
        self.taints = Some(taints);
        self
    }
}

/// Timestamps on conditions carry second precision, as `metav1.Time` does.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

impl Cluster {
    /// A new registration: validated spec, empty status.
    pub fn register(name: &str, spec: ClusterSpec) -> Result<Self, Error> {
        let cluster = Cluster {
            metadata: metav1::ObjectMeta {
                name: Some(name.to_owned()),
                ..Default::default()
            },
            spec,
            status: None,
        };
        cluster.validate()?;
        Ok(cluster)
    }

    pub fn name(&self) -> String {
        ResourceExt::name_any(self)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.required_name()?;
        self.spec.validate()?;
        if let Some(status) = &self.status {
            status.validate()?;
        }
        Ok(())
    }

    /// Name carried by the storage layer, required by every write.
    pub(crate) fn required_name(&self) -> Result<&str, Error> {
        self.metadata
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .context(RequiredFieldSnafu {
                field: "metadata.name",
            })
    }

    pub fn apply_spec_patch(&mut self, patch: ClusterSpecPatch) -> Result<(), Error> {
        self.spec.merge(patch)
    }

    /// Applies a status report atomically, creating the status if absent.
    pub fn report_status(&mut self, report: StatusReport, now: DateTime<Utc>) -> Result<(), Error> {
        let mut status = self.status.clone().unwrap_or_default();
        status.apply(report, now)?;
        self.status = Some(status);
        Ok(())
    }

    pub fn set_condition(&mut self, update: ConditionUpdate, now: DateTime<Utc>) -> Result<bool, Error> {
        let mut status = self.status.clone().unwrap_or_default();
        let transitioned = status.set_condition(update, now)?;
        self.status = Some(status);
        Ok(transitioned)
    }

    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.status.as_ref()?.conditions.get(type_)
    }

    pub fn condition_status(&self, type_: &str) -> ConditionStatus {
        self.condition(type_)
            .map(|c| c.status)
            .unwrap_or(ConditionStatus::Unknown)
    }

    pub fn is_joined(&self) -> bool {
        self.condition_status(CONDITION_JOINED) == ConditionStatus::True
    }

    pub fn is_healthy(&self) -> bool {
        self.condition_status(CONDITION_HEALTHY) == ConditionStatus::True
    }

    pub fn kubernetes_version(&self) -> Option<&str> {
        self.status.as_ref()?.version.kubernetes.as_deref()
    }

    /// Unique identifier reported through the `id.k8s.io` property.
    pub fn cluster_id(&self) -> Option<&str> {
        self.status.as_ref()?.property(PROPERTY_CLUSTER_ID)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.spec.heartbeat_interval()
    }

    pub fn from_yaml(document: &str) -> Result<Self, Error> {
        Ok(serde_yaml_ng::from_str(document)?)
    }
}
