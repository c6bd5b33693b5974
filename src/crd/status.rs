//! # RDSInstance Status
//!
//! Status types for tracking provisioning state and conditions.

use super::condition::{Condition, Conditions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of the RDSInstance resource
///
/// Owned exclusively by the controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDSInstanceStatus {
    /// Name of the external DB instance
    /// Empty until creation succeeds; once set the controller only syncs
    #[serde(default)]
    pub instance_name: String,
    /// Last observed provider state
    #[serde(default)]
    pub state: Option<RDSInstanceState>,
    /// Endpoint address, populated once available
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Provider identifier (ARN)
    #[serde(default, rename = "providerID")]
    pub provider_id: Option<String>,
    /// Whether the resource may be consumed by dependents
    #[serde(default)]
    pub binding_phase: Option<BindingPhase>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    #[schemars(with = "Vec<Condition>")]
    pub conditions: Conditions,
}

impl RDSInstanceStatus {
    /// Mark the resource as eligible for binding unless it is already bound
    pub fn set_bindable(&mut self) {
        if self.binding_phase != Some(BindingPhase::Bound) {
            self.binding_phase = Some(BindingPhase::Unbound);
        }
    }
}

/// Binding lifecycle of a managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum BindingPhase {
    Unbindable,
    Unbound,
    Bound,
    Released,
}

/// DB instance state as reported by RDS
///
/// Only these states are understood; anything else is rejected when the
/// provider response is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RDSInstanceState {
    Creating,
    Available,
    Failed,
}

impl RDSInstanceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Available => "available",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RDSInstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider reported a state outside the known set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected resource status: {0}")]
pub struct UnknownInstanceState(pub String);

impl FromStr for RDSInstanceState {
    type Err = UnknownInstanceState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creating" => Ok(Self::Creating),
            "available" => Ok(Self::Available),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownInstanceState(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_states() {
        assert_eq!("creating".parse(), Ok(RDSInstanceState::Creating));
        assert_eq!("available".parse(), Ok(RDSInstanceState::Available));
        assert_eq!("failed".parse(), Ok(RDSInstanceState::Failed));
    }

    #[test]
    fn test_parse_unknown_state() {
        let err = "backing-up".parse::<RDSInstanceState>().unwrap_err();
        assert_eq!(err.to_string(), "unexpected resource status: backing-up");
    }

    #[test]
    fn test_set_bindable_does_not_unbind() {
        let mut status = RDSInstanceStatus {
            binding_phase: Some(BindingPhase::Bound),
            ..Default::default()
        };
        status.set_bindable();
        assert_eq!(status.binding_phase, Some(BindingPhase::Bound));

        let mut fresh = RDSInstanceStatus::default();
        fresh.set_bindable();
        assert_eq!(fresh.binding_phase, Some(BindingPhase::Unbound));
    }
}
