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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Heartbeat interval used when none is configured.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECONDS: i32 = 60;

/// How often the cluster should be checked for health.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq)]
pub struct HealthProbe {
    /// Interval between heartbeats, in seconds.
    ///
    /// Absent, zero or negative selects the default interval; the probe is
    /// never disabled through this field.
    // The wire name keeps the spelling of the published API.
    #[serde(
        rename = "heatbeatIntervalSeconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub heartbeat_interval_seconds: Option<i32>,
}

impl HealthProbe {
    pub fn every(seconds: i32) -> Self {
        Self {
            heartbeat_interval_seconds: Some(seconds),
        }
    }

    /// The configured interval in seconds, or `None` if the default applies.
    pub fn configured_seconds(&self) -> Option<i32> {
        self.heartbeat_interval_seconds.filter(|s| *s > 0)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        let seconds = self
            .configured_seconds()
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_SECONDS);
        Duration::from_secs(u64::from(seconds.unsigned_abs()))
    }
}
