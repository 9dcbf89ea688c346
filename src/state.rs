//! Persisted Module State
//!
//! The sequencer saves its menu settings and playback position as a small
//! JSON object alongside the host's parameter values. Loading is tolerant:
//! any key that is missing, or present with the wrong type, is skipped and
//! the module keeps whatever value it already had.

use crate::steps::StepSlot;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("module state must be a JSON object")]
    NotAnObject,

    #[error("invalid module state: {0}")]
    Json(#[from] serde_json::Error),
}

/// Deserialize a field, turning a type mismatch into "absent"
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            warn!("ignoring malformed state field {}: {}", value, err);
            Ok(None)
        }
    }
}

/// Saved sequencer settings; each field is optional on load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub current_step_number: Option<i64>,

    #[serde(
        rename = "Number of Steps",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub steps_per_measure: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub number_of_measures: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub chord_mode: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub detune_mode: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub quantization_mode: Option<i64>,

    /// All shadow step slots, measure by measure
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepSlot>>,
}

impl PersistedState {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, StateError> {
        if !value.is_object() {
            return Err(StateError::NotAnObject);
        }
        Ok(Self::deserialize(value)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, StateError> {
        Ok(serde_json::to_value(self)?)
    }
}
