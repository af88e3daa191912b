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

pub mod condition;
pub mod property;
pub mod resources;

use crate::types::error::Error;
use chrono::{DateTime, Utc};
use condition::{ConditionUpdate, Conditions};
use property::Property;
use resources::{ClusterVersion, Resources};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Observed state of a cluster, written only by the status reporter.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(default)]
    pub conditions: Conditions,

    #[serde(default, skip_serializing_if = "ClusterVersion::is_empty")]
    pub version: ClusterVersion,

    #[serde(default, skip_serializing_if = "Resources::is_empty")]
    pub resources: Resources,

    /// Properties collected from the cluster, for example a unique cluster
    /// identifier (`id.k8s.io`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

impl ClusterStatus {
    pub fn validate(&self) -> Result<(), Error> {
        for (i, condition) in self.conditions.iter().enumerate() {
            condition.validate(&format!("status.conditions[{i}]"))?;
        }
        validate_properties(&self.properties)
    }

    /// Upserts one condition. Returns whether its status transitioned.
    pub fn set_condition(
        &mut self,
        update: ConditionUpdate,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        update.validate("status.conditions")?;
        Ok(self.conditions.set(update, now))
    }

    /// Value of property `name`; the last entry wins when the name repeats.
    pub fn property(&self, name: &str) -> Option<&str> {
        property::find_property(&self.properties, name).map(|p| p.value.as_str())
    }

    pub fn set_property(&mut self, property: Property) -> Result<(), Error> {
        property.validate("status.properties")?;
        property::upsert_property(&mut self.properties, property);
        Ok(())
    }

    /// Applies a whole report. Nothing is changed unless every part of the
    /// report is valid.
    pub fn apply(&mut self, report: StatusReport, now: DateTime<Utc>) -> Result<(), Error> {
        report.validate()?;

        let StatusReport {
            conditions,
            version,
            resources,
            properties,
        } = report;

        let mut next = self.clone();
        for update in conditions {
            next.conditions.set(update, now);
        }
        if let Some(version) = version {
            next.version = version;
        }
        if let Some(resources) = resources {
            next.resources = resources;
        }
        if let Some(properties) = properties {
            next.properties = properties;
        }

        *self = next;
        Ok(())
    }
}

fn validate_properties(properties: &[Property]) -> Result<(), Error> {
    for (i, property) in properties.iter().enumerate() {
        property.validate(&format!("status.properties[{i}]"))?;
    }
    Ok(())
}

/// One status write from a health or status controller: condition updates
/// plus optional replacements of version, resources and properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusReport {
    pub conditions: Vec<ConditionUpdate>,
    pub version: Option<ClusterVersion>,
    pub resources: Option<Resources>,
    pub properties: Option<Vec<Property>>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, update: ConditionUpdate) -> Self {
        self.conditions.push(update);
        self
    }

    pub fn version(mut self, version: ClusterVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn properties(mut self, properties: Vec<Property>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (i, update) in self.conditions.iter().enumerate() {
            update.validate(&format!("status.conditions[{i}]"))?;
        }
        if let Some(properties) = &self.properties {
            validate_properties(properties)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::condition::{CONDITION_HEALTHY, CONDITION_JOINED, ConditionStatus};
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_apply_full_report() {
        let mut status = ClusterStatus::default();
        let report = StatusReport::new()
            .condition(ConditionUpdate::joined(true, "Registered", ""))
            .condition(ConditionUpdate::healthy(true, "ProbeOK", ""))
            .version(ClusterVersion::kubernetes("v1.30.2"))
            .resources(Resources::default().with_capacity("cpu", "32"))
            .properties(vec![Property::new("id.k8s.io", "c1")]);

        status.apply(report, at(0)).unwrap();

        assert_eq!(status.conditions.len(), 2);
        assert!(status.conditions.is_true(CONDITION_JOINED));
        assert!(status.conditions.is_true(CONDITION_HEALTHY));
        assert_eq!(status.version.kubernetes.as_deref(), Some("v1.30.2"));
        assert!(status.resources.capacity_of("cpu").is_some());
        assert_eq!(status.property("id.k8s.io"), Some("c1"));
    }

    #[test]
    fn test_invalid_report_changes_nothing() {
        let mut status = ClusterStatus::default();
        status
            .apply(
                StatusReport::new().condition(ConditionUpdate::joined(true, "Registered", "")),
                at(0),
            )
            .unwrap();
        let before = status.clone();

        let report = StatusReport::new()
            .condition(ConditionUpdate::healthy(false, "ProbeFailed", ""))
            .properties(vec![Property::new("ok", "v"), Property::new("bad", "")]);
        let err = status.apply(report, at(10)).unwrap_err();

        assert_eq!(err.field(), Some("status.properties[1].value"));
        assert_eq!(status, before);
        assert_eq!(status.conditions.status(CONDITION_HEALTHY), ConditionStatus::Unknown);
    }

    #[test]
    fn test_partial_report_keeps_other_fields() {
        let mut status = ClusterStatus {
            version: ClusterVersion::kubernetes("v1.29.0"),
            properties: vec![Property::new("vendor", "acme")],
            ..Default::default()
        };

        status
            .apply(
                StatusReport::new().condition(ConditionUpdate::healthy(true, "ProbeOK", "")),
                at(0),
            )
            .unwrap();

        assert_eq!(status.version.kubernetes.as_deref(), Some("v1.29.0"));
        assert_eq!(status.property("vendor"), Some("acme"));
    }

    #[test]
    fn test_set_property_validates() {
        let mut status = ClusterStatus::default();
        status.set_property(Property::new("vendor", "acme")).unwrap();
        status.set_property(Property::new("vendor", "globex")).unwrap();
        assert_eq!(status.properties.len(), 1);
        assert_eq!(status.property("vendor"), Some("globex"));

        assert!(
            status
                .set_property(Property::new("n".repeat(254), "v"))
                .is_err()
        );
        assert_eq!(status.properties.len(), 1);
    }

    #[test]
    fn test_status_wire_shape() {
        let mut status = ClusterStatus::default();
        status
            .set_condition(ConditionUpdate::joined(true, "Registered", "joined"), at(0))
            .unwrap();

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "conditions": [{
                    "type": "Joined",
                    "status": "True",
                    "lastTransitionTime": "2023-11-14T22:13:20Z",
                    "reason": "Registered",
                    "message": "joined",
                }],
            })
        );

        let empty: ClusterStatus = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.conditions.is_empty());
    }
}
