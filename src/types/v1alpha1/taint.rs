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

//! Scheduling taints on a cluster

use crate::types::error::{Error, InvalidTaintEffectSnafu};
use crate::types::v1alpha1::require_non_empty;
use k8s_openapi::api::core::v1 as corev1;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Effect of a taint on workloads that do not tolerate it.
///
/// https://kubernetes.io/docs/concepts/scheduling-eviction/taint-and-toleration/
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
pub enum TaintEffect {
    #[strum(serialize = "NoSchedule")]
    NoSchedule,

    #[strum(serialize = "PreferNoSchedule")]
    PreferNoSchedule,

    #[strum(serialize = "NoExecute")]
    NoExecute,
}

pub fn new_taint(key: &str, value: Option<&str>, effect: TaintEffect) -> corev1::Taint {
    corev1::Taint {
        key: key.to_owned(),
        value: value.map(str::to_owned),
        effect: effect.to_string(),
        ..Default::default()
    }
}

pub fn validate_taint(taint: &corev1::Taint, path: &str) -> Result<TaintEffect, Error> {
    require_non_empty(format!("{path}.key"), &taint.key)?;
    TaintEffect::from_str(&taint.effect).map_err(|_| {
        InvalidTaintEffectSnafu {
            field: format!("{path}.effect"),
            effect: taint.effect.clone(),
        }
        .build()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_taint() {
        let taint = new_taint("dedicated", Some("gpu"), TaintEffect::NoSchedule);
        assert_eq!(taint.effect, "NoSchedule");
        assert_eq!(
            validate_taint(&taint, "spec.taints[0]").unwrap(),
            TaintEffect::NoSchedule
        );
    }

    #[test]
    fn test_taint_without_value_is_valid() {
        let taint = new_taint("maintenance", None, TaintEffect::NoExecute);
        assert!(validate_taint(&taint, "spec.taints[0]").is_ok());
    }

    #[test]
    fn test_taint_requires_key() {
        let taint = new_taint("", None, TaintEffect::NoSchedule);
        let err = validate_taint(&taint, "spec.taints[1]").unwrap_err();
        assert_eq!(err.field(), Some("spec.taints[1].key"));
    }

    #[test]
    fn test_unknown_effect_is_rejected() {
        let mut taint = new_taint("dedicated", None, TaintEffect::NoSchedule);
        taint.effect = "Evict".to_string();
        let err = validate_taint(&taint, "spec.taints[0]").unwrap_err();
        assert!(matches!(err, Error::InvalidTaintEffect { .. }));
        assert_eq!(err.field(), Some("spec.taints[0].effect"));
    }
}
