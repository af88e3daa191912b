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

//! Cluster conditions
//!
//! Conditions are keyed by type: the set holds at most one entry per type and
//! is serialized as a sequence, the way `metav1.Condition` lists are.

use crate::types::error::Error;
use crate::types::v1alpha1::check_length;
use chrono::{DateTime, Utc};
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use strum::{Display, EnumString};

/// The cluster has successfully joined the control plane.
pub const CONDITION_JOINED: &str = "Joined";

/// The latest heartbeat succeeded within the configured interval.
pub const CONDITION_HEALTHY: &str = "Healthy";

const TYPE_MAX_LENGTH: usize = 316;
const REASON_MAX_LENGTH: usize = 1024;
const MESSAGE_MAX_LENGTH: usize = 32768;

/// Identifier of a condition type.
///
/// `Joined` and `Healthy` are well known; controllers may report any other
/// type alongside them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionType(Cow<'static, str>);

impl ConditionType {
    pub const JOINED: ConditionType = ConditionType(Cow::Borrowed(CONDITION_JOINED));
    pub const HEALTHY: ConditionType = ConditionType(Cow::Borrowed(CONDITION_HEALTHY));

    pub fn new(type_: impl Into<String>) -> Self {
        Self(Cow::Owned(type_.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_well_known(&self) -> bool {
        *self == Self::JOINED || *self == Self::HEALTHY
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ConditionType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for ConditionType {
    fn from(type_: &str) -> Self {
        Self::new(type_)
    }
}

impl From<String> for ConditionType {
    fn from(type_: String) -> Self {
        Self::new(type_)
    }
}

/// Status of a condition.
#[derive(
    Default, Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, Display, EnumString, PartialEq, Eq,
)]
pub enum ConditionStatus {
    #[strum(serialize = "True")]
    True,

    #[strum(serialize = "False")]
    False,

    #[default]
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

/// One observed aspect of the cluster, wire compatible with `metav1.Condition`.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the status changed.
    pub last_transition_time: DateTime<Utc>,

    pub reason: String,

    #[serde(default)]
    pub message: String,
}

impl Condition {
    pub fn validate(&self, path: &str) -> Result<(), Error> {
        check_length(format!("{path}.type"), &self.type_, 1, TYPE_MAX_LENGTH)?;
        check_length(format!("{path}.reason"), &self.reason, 1, REASON_MAX_LENGTH)?;
        check_length(format!("{path}.message"), &self.message, 0, MESSAGE_MAX_LENGTH)
    }
}

/// A write to the condition set, as reported by a health or status controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionUpdate {
    pub type_: ConditionType,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub observed_generation: Option<i64>,
}

impl ConditionUpdate {
    pub fn new(
        type_: impl Into<ConditionType>,
        status: impl Into<ConditionStatus>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status: status.into(),
            reason: reason.into(),
            message: message.into(),
            observed_generation: None,
        }
    }

    pub fn joined(
        status: impl Into<ConditionStatus>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ConditionType::JOINED, status, reason, message)
    }

    pub fn healthy(
        status: impl Into<ConditionStatus>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ConditionType::HEALTHY, status, reason, message)
    }

    pub fn with_observed_generation(mut self, generation: i64) -> Self {
        self.observed_generation = Some(generation);
        self
    }

    pub fn validate(&self, path: &str) -> Result<(), Error> {
        check_length(
            format!("{path}.type"),
            self.type_.as_str(),
            1,
            TYPE_MAX_LENGTH,
        )?;
        check_length(format!("{path}.reason"), &self.reason, 1, REASON_MAX_LENGTH)?;
        check_length(format!("{path}.message"), &self.message, 0, MESSAGE_MAX_LENGTH)
    }
}

/// Condition set with one entry per type, in first-write order.
#[derive(Clone, Debug, Default)]
pub struct Conditions {
    entries: Vec<Condition>,
    index: HashMap<String, usize>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.entries.iter()
    }

    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.index.get(type_).and_then(|i| self.entries.get(*i))
    }

    /// Status of `type_`; a missing condition is `Unknown`, never `False`.
    pub fn status(&self, type_: &str) -> ConditionStatus {
        self.get(type_)
            .map(|c| c.status)
            .unwrap_or(ConditionStatus::Unknown)
    }

    pub fn is_true(&self, type_: &str) -> bool {
        self.status(type_) == ConditionStatus::True
    }

    /// Upserts the condition named by `update`.
    ///
    /// `lastTransitionTime` moves to `now` only when the entry is new or its
    /// status changed; otherwise reason, message and observed generation are
    /// refreshed in place. Returns whether a transition happened.
    pub fn set(&mut self, update: ConditionUpdate, now: DateTime<Utc>) -> bool {
        let ConditionUpdate {
            type_,
            status,
            reason,
            message,
            observed_generation,
        } = update;

        if let Some(current) = self
            .index
            .get(type_.as_str())
            .and_then(|i| self.entries.get_mut(*i))
        {
            let transitioned = current.status != status;
            if transitioned {
                current.status = status;
                current.last_transition_time = now;
            }
            current.reason = reason;
            current.message = message;
            current.observed_generation = observed_generation;
            return transitioned;
        }

        self.insert(Condition {
            type_: type_.to_string(),
            status,
            observed_generation,
            last_transition_time: now,
            reason,
            message,
        });
        true
    }

    pub fn remove(&mut self, type_: &str) -> Option<Condition> {
        let i = self.index.remove(type_)?;
        let removed = self.entries.remove(i);
        self.reindex();
        Some(removed)
    }

    /// Stores `condition` as is; a later entry for the same type replaces
    /// the earlier one at its original position.
    fn insert(&mut self, condition: Condition) {
        match self
            .index
            .get(&condition.type_)
            .and_then(|i| self.entries.get_mut(*i))
        {
            Some(current) => *current = condition,
            None => {
                self.index
                    .insert(condition.type_.clone(), self.entries.len());
                self.entries.push(condition);
            }
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.type_.clone(), i))
            .collect();
    }
}

impl PartialEq for Conditions {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<Condition> for Conditions {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for condition in iter {
            conditions.insert(condition);
        }
        conditions
    }
}

impl<'a> IntoIterator for &'a Conditions {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

/// `null` reads as no conditions.
impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<Vec<Condition>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .collect())
    }
}

impl JsonSchema for Conditions {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("Conditions")
    }
    fn schema_id() -> Cow<'static, str> {
        Cow::Borrowed(concat!(module_path!(), "::", "Conditions"))
    }
    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "array",
            "x-kubernetes-list-type": "map",
            "x-kubernetes-list-map-keys": ["type"],
            "items": {
                "type": "object",
                "properties": {
                    "lastTransitionTime": { "format": "date-time", "type": "string" },
                    "message": { "type": "string", "maxLength": MESSAGE_MAX_LENGTH },
                    "observedGeneration": { "type": "integer", "format": "int64", "minimum": 0 },
                    "reason": { "type": "string", "minLength": 1, "maxLength": REASON_MAX_LENGTH },
                    "status": { "type": "string", "enum": ["True", "False", "Unknown"] },
                    "type": { "type": "string", "minLength": 1, "maxLength": TYPE_MAX_LENGTH }
                },
                "required": ["lastTransitionTime", "reason", "status", "type"],
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_well_known_condition_types() {
        assert_eq!(ConditionType::JOINED.to_string(), "Joined");
        assert_eq!(ConditionType::HEALTHY.as_str(), "Healthy");
        assert!(ConditionType::from("Healthy").is_well_known());
        assert!(!ConditionType::from("AddonsReady").is_well_known());
    }

    #[test]
    fn test_condition_status_strings() {
        assert_eq!(ConditionStatus::True.to_string(), "True");
        assert_eq!(
            "Unknown".parse::<ConditionStatus>().unwrap(),
            ConditionStatus::Unknown
        );
        assert_eq!(ConditionStatus::from(false), ConditionStatus::False);
        assert!("maybe".parse::<ConditionStatus>().is_err());
    }

    #[test]
    fn test_same_status_keeps_transition_time() {
        let mut conditions = Conditions::new();
        let update = ConditionUpdate::healthy(true, "ProbeOK", "");

        assert!(conditions.set(update.clone(), at(0)));
        assert!(!conditions.set(update, at(30)));

        let healthy = conditions.get(CONDITION_HEALTHY).unwrap();
        assert_eq!(healthy.last_transition_time, at(0));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn test_status_change_bumps_transition_time() {
        let mut conditions = Conditions::new();
        conditions.set(ConditionUpdate::healthy(true, "ProbeOK", ""), at(0));
        let transitioned = conditions.set(
            ConditionUpdate::healthy(false, "ProbeFailed", "connection refused"),
            at(30),
        );

        assert!(transitioned);
        assert_eq!(conditions.len(), 1);
        let healthy = conditions.get(CONDITION_HEALTHY).unwrap();
        assert_eq!(healthy.status, ConditionStatus::False);
        assert_eq!(healthy.reason, "ProbeFailed");
        assert_eq!(healthy.message, "connection refused");
        assert_eq!(healthy.last_transition_time, at(30));
    }

    #[test]
    fn test_same_status_refreshes_reason_and_message() {
        let mut conditions = Conditions::new();
        conditions.set(ConditionUpdate::healthy(false, "ProbeFailed", "timeout"), at(0));
        conditions.set(
            ConditionUpdate::healthy(false, "ProbeFailed", "connection refused")
                .with_observed_generation(4),
            at(10),
        );

        let healthy = conditions.get(CONDITION_HEALTHY).unwrap();
        assert_eq!(healthy.message, "connection refused");
        assert_eq!(healthy.observed_generation, Some(4));
        assert_eq!(healthy.last_transition_time, at(0));
    }

    #[test]
    fn test_missing_condition_is_unknown() {
        let conditions = Conditions::new();
        assert_eq!(conditions.status(CONDITION_JOINED), ConditionStatus::Unknown);
        assert!(!conditions.is_true(CONDITION_JOINED));
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut conditions = Conditions::new();
        conditions.set(ConditionUpdate::joined(true, "Registered", ""), at(0));
        conditions.set(ConditionUpdate::healthy(true, "ProbeOK", ""), at(1));
        conditions.set(ConditionUpdate::new("AddonsReady", true, "Installed", ""), at(2));

        let removed = conditions.remove(CONDITION_JOINED).unwrap();
        assert_eq!(removed.type_, CONDITION_JOINED);
        assert!(conditions.remove(CONDITION_JOINED).is_none());

        assert_eq!(conditions.get("AddonsReady").unwrap().reason, "Installed");
        conditions.set(ConditionUpdate::healthy(false, "ProbeFailed", ""), at(3));
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions.status(CONDITION_HEALTHY), ConditionStatus::False);
    }

    #[test]
    fn test_serializes_as_sequence_in_write_order() {
        let mut conditions = Conditions::new();
        conditions.set(ConditionUpdate::joined(true, "Registered", ""), at(0));
        conditions.set(ConditionUpdate::healthy(true, "ProbeOK", ""), at(1));

        let value = serde_json::to_value(&conditions).unwrap();
        let types: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["Joined", "Healthy"]);
        assert_eq!(value[0]["lastTransitionTime"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_duplicate_types_on_the_wire_collapse_to_last() {
        let value = serde_json::json!([
            { "type": "Healthy", "status": "True", "reason": "ProbeOK", "lastTransitionTime": "2024-01-01T00:00:00Z" },
            { "type": "Joined", "status": "True", "reason": "Registered", "lastTransitionTime": "2024-01-01T00:00:00Z" },
            { "type": "Healthy", "status": "False", "reason": "ProbeFailed", "lastTransitionTime": "2024-01-02T00:00:00Z" },
        ]);

        let conditions: Conditions = serde_json::from_value(value).unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions.iter().next().unwrap().type_, "Healthy");
        assert_eq!(conditions.status(CONDITION_HEALTHY), ConditionStatus::False);
    }

    #[test]
    fn test_update_validation() {
        assert!(
            ConditionUpdate::healthy(true, "ProbeOK", "")
                .validate("status.conditions[0]")
                .is_ok()
        );

        let err = ConditionUpdate::new("", true, "ProbeOK", "")
            .validate("status.conditions[0]")
            .unwrap_err();
        assert_eq!(err.field(), Some("status.conditions[0].type"));

        let err = ConditionUpdate::healthy(true, "", "")
            .validate("status.conditions[1]")
            .unwrap_err();
        assert_eq!(err.field(), Some("status.conditions[1].reason"));
    }
}
