//! Argument serialization.
//!
//! The same session state has two serializations: the structured form, a list
//! of `(flag, value)` pairs, and the flat form, the literal tokens passed to a
//! command. Only enabled switches and options appear in either.

use crate::definition::SerializationMode;
use crate::session::{Event, EventState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Switch(bool),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgPair {
    pub flag: String,
    pub value: ArgValue,
}

/// Contents of a persisted variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistedValue {
    Flat(Vec<String>),
    Structured(Vec<ArgPair>),
}

impl PersistedValue {
    /// Whether a switch with `flag` is on.
    pub fn switch_enabled(&self, flag: &str) -> bool {
        match self {
            PersistedValue::Flat(tokens) => tokens.iter().any(|t| t == flag),
            PersistedValue::Structured(pairs) => pairs
                .iter()
                .any(|p| p.flag == flag && p.value == ArgValue::Switch(true)),
        }
    }

    /// Value of the option with `flag`, if it is set.
    pub fn option_value(&self, flag: &str) -> Option<String> {
        match self {
            PersistedValue::Flat(tokens) => tokens
                .iter()
                .find_map(|t| t.strip_prefix(flag))
                .map(str::to_string),
            PersistedValue::Structured(pairs) => pairs.iter().find_map(|p| match &p.value {
                ArgValue::Value(v) if p.flag == flag => Some(v.clone()),
                _ => None,
            }),
        }
    }

    pub fn to_flat(&self) -> Vec<String> {
        match self {
            PersistedValue::Flat(tokens) => tokens.clone(),
            PersistedValue::Structured(pairs) => flatten(pairs),
        }
    }
}

/// Structured form of the enabled events.
pub fn to_structured<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<ArgPair> {
    events
        .into_iter()
        .filter_map(|event| match &event.state {
            EventState::Switch { flag, enabled: true } => Some(ArgPair {
                flag: flag.clone(),
                value: ArgValue::Switch(true),
            }),
            EventState::Option {
                flag,
                enabled: true,
                value,
                ..
            } => Some(ArgPair {
                flag: flag.clone(),
                value: ArgValue::Value(value.clone()),
            }),
            _ => None,
        })
        .collect()
}

/// Flat form of the enabled events.
pub fn to_flat<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<String> {
    flatten(&to_structured(events))
}

pub fn flatten(pairs: &[ArgPair]) -> Vec<String> {
    pairs
        .iter()
        .filter_map(|pair| match &pair.value {
            ArgValue::Switch(true) => Some(pair.flag.clone()),
            ArgValue::Switch(false) => None,
            ArgValue::Value(v) => Some(format!("{}{}", pair.flag, v)),
        })
        .collect()
}

/// Serialize `events` the way `mode` asks for.
pub fn persist<'a>(events: impl IntoIterator<Item = &'a Event>, mode: SerializationMode) -> PersistedValue {
    match mode {
        SerializationMode::Flat => PersistedValue::Flat(to_flat(events)),
        SerializationMode::Structured => PersistedValue::Structured(to_structured(events)),
    }
}
