//! # Conditions
//!
//! Typed status conditions reported on managed resources.
//!
//! Conditions are keyed by [`ConditionType`]: setting a condition replaces the
//! entry for its type, so a status never carries two entries of the same type.
//! On the wire they are a plain list, as Kubernetes tooling expects.
//! Entries of types this controller does not own are kept as-is.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Aspect of reconciliation health a condition describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// Whether the external resource is usable
    Ready,
    /// Whether the last reconcile succeeded
    Synced,
    /// Whether references to other records have been resolved
    ReferencesResolved,
}

/// Status of a condition (True, False, Unknown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Condition represents one observation of a managed resource
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    #[schemars(with = "String")]
    pub r#type: ConditionType,
    /// Status of the condition
    pub status: ConditionStatus,
    /// Last transition time (RFC3339)
    pub last_transition_time: String,
    /// Machine-readable reason for the condition
    pub reason: String,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    fn new(
        r#type: ConditionType,
        status: ConditionStatus,
        reason: &str,
        message: Option<String>,
    ) -> Self {
        Self {
            r#type,
            status,
            last_transition_time: chrono::Utc::now().to_rfc3339(),
            reason: reason.to_string(),
            message,
        }
    }

    /// The managed resource is being created
    pub fn creating() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            "Creating",
            Some("Managed resource is being created".to_string()),
        )
    }

    /// The managed resource is being deleted
    pub fn deleting() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            "Deleting",
            Some("Managed resource is being deleted".to_string()),
        )
    }

    /// The managed resource is available for use
    pub fn available() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::True,
            "Available",
            Some("Managed resource is available for use".to_string()),
        )
    }

    /// The managed resource exists but is not usable
    pub fn unavailable() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            "Unavailable",
            Some("Managed resource is not available for use".to_string()),
        )
    }

    /// The last reconcile completed without error
    pub fn reconcile_success() -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::True,
            "ReconcileSuccess",
            Some("Successfully reconciled managed resource".to_string()),
        )
    }

    /// The last reconcile failed with `err`
    pub fn reconcile_error(err: &dyn fmt::Display) -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::False,
            "ReconcileError",
            Some(err.to_string()),
        )
    }

    /// All references were resolved
    pub fn reference_resolution_success() -> Self {
        Self::new(
            ConditionType::ReferencesResolved,
            ConditionStatus::True,
            "ReferenceResolutionSuccess",
            Some("Successfully resolved references to other resources".to_string()),
        )
    }

    /// A referenced resource is missing or not ready yet
    pub fn reference_resolution_blocked(err: &dyn fmt::Display) -> Self {
        Self::new(
            ConditionType::ReferencesResolved,
            ConditionStatus::False,
            "ReferenceResolutionBlocked",
            Some(err.to_string()),
        )
    }

    /// Equal in everything but transition time
    pub fn equivalent(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Conditions keyed by type
///
/// Entries written by other tooling with an unknown `type` are carried
/// through untouched instead of failing deserialization of the record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(from = "Vec<serde_json::Value>", into = "Vec<serde_json::Value>")]
pub struct Conditions {
    owned: BTreeMap<ConditionType, Condition>,
    foreign: Vec<serde_json::Value>,
}

impl Conditions {
    /// Set a condition, replacing any entry of the same type
    ///
    /// An equivalent existing entry is kept so its transition time is preserved.
    pub fn set(&mut self, condition: Condition) {
        match self.owned.get(&condition.r#type) {
            Some(existing) if existing.equivalent(&condition) => {}
            _ => {
                self.owned.insert(condition.r#type, condition);
            }
        }
    }

    pub fn get(&self, r#type: ConditionType) -> Option<&Condition> {
        self.owned.get(&r#type)
    }

    /// Whether the condition of this type is present and True
    pub fn is_true(&self, r#type: ConditionType) -> bool {
        self.get(r#type).is_some_and(Condition::is_true)
    }

    /// Number of conditions of known types
    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.owned.values()
    }

    /// Entries of types this controller does not manage
    pub fn foreign(&self) -> &[serde_json::Value] {
        &self.foreign
    }
}

fn has_known_type(entry: &serde_json::Value) -> bool {
    entry
        .get("type")
        .is_some_and(|t| serde_json::from_value::<ConditionType>(t.clone()).is_ok())
}

impl From<Vec<serde_json::Value>> for Conditions {
    fn from(list: Vec<serde_json::Value>) -> Self {
        let mut conditions = Self::default();
        for entry in list {
            match serde_json::from_value::<Condition>(entry.clone()) {
                // Last entry wins when a stored list carries duplicates
                Ok(condition) => {
                    conditions.owned.insert(condition.r#type, condition);
                }
                // A malformed entry of our own type is rewritten on the next set
                Err(_) if has_known_type(&entry) => {}
                Err(_) => conditions.foreign.push(entry),
            }
        }
        conditions
    }
}

impl From<Conditions> for Vec<serde_json::Value> {
    fn from(conditions: Conditions) -> Self {
        conditions
            .owned
            .into_values()
            .filter_map(|condition| serde_json::to_value(condition).ok())
            .chain(conditions.foreign)
            .collect()
    }
}
