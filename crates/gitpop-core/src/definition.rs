//! Declarative popup definitions.
//!
//! A [`PopupDefinition`] is the immutable template a session is built from.
//! Its three entry lists are [`KeyedList`]s: ordered, keyed by chord, and
//! edited in place so that replacing an entry never moves it unless an
//! explicit [`Placement`] says so.

use crate::chord::{self, Chord};
use crate::error::PopupError;
use crate::policy::UsePrefix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Anything stored in a [`KeyedList`].
pub trait Keyed {
    fn key(&self) -> Chord;
    fn set_key(&mut self, key: Chord);
}

/// Where [`KeyedList::upsert`] puts an entry.
///
/// With `at` naming an existing key the entry is moved right before
/// (`prepend`) or right after it. Otherwise an existing entry keeps its
/// position and a new one goes to the front (`prepend`) or the back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub at: Option<Chord>,
    pub prepend: bool,
}

impl Placement {
    pub fn before(at: Chord) -> Self {
        Self { at: Some(at), prepend: true }
    }

    pub fn after(at: Chord) -> Self {
        Self { at: Some(at), prepend: false }
    }
}

/// Ordered entries with stable, unique keys.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedList<T> {
    order: Vec<Chord>,
    entries: HashMap<Chord, T>,
}

impl<T> Default for KeyedList<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T: Keyed> KeyedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries in order. Fails with the first repeated key.
    pub fn from_entries(items: impl IntoIterator<Item = T>) -> Result<Self, Chord> {
        let mut list = Self::new();
        for item in items {
            let key = item.key();
            if list.entries.insert(key, item).is_some() {
                return Err(key);
            }
            list.order.push(key);
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, key: &Chord) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &Chord) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> &[Chord] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(|k| self.entries.get(k))
    }

    /// Insert or replace `entry` by key.
    pub fn upsert(&mut self, entry: T, placement: &Placement) {
        let key = entry.key();
        let existed = self.entries.insert(key, entry).is_some();

        if let Some(at) = placement.at.filter(|at| *at != key && self.contains(at)) {
            self.order.retain(|k| *k != key);
            if let Some(pos) = self.order.iter().position(|k| *k == at) {
                let pos = if placement.prepend { pos } else { pos + 1 };
                self.order.insert(pos, key);
            }
            return;
        }

        if !existed {
            if placement.prepend {
                self.order.insert(0, key);
            } else {
                self.order.push(key);
            }
        }
    }

    pub fn remove(&mut self, key: &Chord) -> Option<T> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    /// Rename `from` to `to` without reordering. Returns false when `from`
    /// is absent or `to` is already taken.
    pub fn rebind(&mut self, from: &Chord, to: Chord) -> bool {
        if from == &to {
            return self.contains(from);
        }
        if self.contains(&to) {
            return false;
        }
        let Some(mut entry) = self.entries.remove(from) else {
            return false;
        };
        entry.set_key(to);
        self.entries.insert(to, entry);
        if let Some(slot) = self.order.iter_mut().find(|k| *k == from) {
            *slot = to;
        }
        true
    }
}

/// How an option collects its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    #[default]
    Text,
    Number,
    Path,
    Choice(Vec<String>),
}

impl ReaderKind {
    /// Check a raw answer. `Ok(None)` means the answer was blank.
    ///
    /// Free-form answers are kept verbatim; numbers and choices are trimmed.
    pub fn accept(&self, raw: &str) -> Result<Option<String>, String> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(None);
        }
        match self {
            ReaderKind::Text | ReaderKind::Path => Ok(Some(raw.to_string())),
            ReaderKind::Number => value
                .parse::<i64>()
                .map(|_| Some(value.to_string()))
                .map_err(|_| format!("'{value}' is not a number")),
            ReaderKind::Choice(choices) => {
                if choices.iter().any(|c| c == value) {
                    Ok(Some(value.to_string()))
                } else {
                    Err(format!("'{value}' is not one of {}", choices.join(", ")))
                }
            }
        }
    }

    /// Prompt text for `flag`.
    pub fn prompt(&self, flag: &str) -> String {
        match self {
            ReaderKind::Choice(choices) => format!("{flag} ({}) ", choices.join("|")),
            _ => format!("{flag} "),
        }
    }
}

/// What an action does when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionHandler {
    /// Run `program args...` with the session's arguments appended.
    Command(Vec<String>),
    /// Open another popup.
    Popup(String),
}

impl fmt::Display for ActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionHandler::Command(argv) => write!(f, "runs `{}`", argv.join(" ")),
            ActionHandler::Popup(name) => write!(f, "opens the {name} popup"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchDef {
    pub key: Chord,
    pub description: String,
    pub flag: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDef {
    pub key: Chord,
    pub description: String,
    pub flag: String,
    #[serde(default)]
    pub reader: ReaderKind,
    /// Pre-fill for the reader until a value has been entered.
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    pub key: Chord,
    pub description: String,
    pub run: ActionHandler,
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {$(
        impl Keyed for $ty {
            fn key(&self) -> Chord {
                self.key
            }

            fn set_key(&mut self, key: Chord) {
                self.key = key;
            }
        }
    )*};
}

impl_keyed!(SwitchDef, OptionDef, ActionDef);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    Switches,
    Options,
    Actions,
}

impl EventClass {
    pub const ALL: [EventClass; 3] = [EventClass::Switches, EventClass::Options, EventClass::Actions];

    pub fn heading(self) -> &'static str {
        match self {
            EventClass::Switches => "Switches",
            EventClass::Options => "Options",
            EventClass::Actions => "Actions",
        }
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventClass::Switches => "switches",
            EventClass::Options => "options",
            EventClass::Actions => "actions",
        })
    }
}

impl FromStr for EventClass {
    type Err = PopupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "switches" | "switch" => Ok(EventClass::Switches),
            "options" | "option" => Ok(EventClass::Options),
            "actions" | "action" => Ok(EventClass::Actions),
            other => Err(PopupError::invalid(format!(
                "'{other}' is not an event class (switches, options, actions)"
            ))),
        }
    }
}

/// One entry of any class, for registry edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDef {
    Switch(SwitchDef),
    Option(OptionDef),
    Action(ActionDef),
}

impl EventDef {
    pub fn class(&self) -> EventClass {
        match self {
            EventDef::Switch(_) => EventClass::Switches,
            EventDef::Option(_) => EventClass::Options,
            EventDef::Action(_) => EventClass::Actions,
        }
    }

    pub fn key(&self) -> Chord {
        match self {
            EventDef::Switch(d) => d.key,
            EventDef::Option(d) => d.key,
            EventDef::Action(d) => d.key,
        }
    }
}

/// Which form a persist transition writes to the bound variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationMode {
    #[default]
    Flat,
    Structured,
}

/// Popup shape as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupSpec {
    pub switches: Vec<SwitchDef>,
    pub options: Vec<OptionDef>,
    pub actions: Vec<ActionDef>,
    pub default_action: Option<ActionHandler>,
    pub use_prefix: Option<UsePrefix>,
    pub variable: Option<String>,
    pub man_page: Option<String>,
    pub max_action_columns: Option<usize>,
    pub serialization: SerializationMode,
}

impl PopupSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn man_page(mut self, topic: &str) -> Self {
        self.man_page = Some(topic.into());
        self
    }

    pub fn switch(mut self, key: char, description: &str, flag: &str) -> Self {
        self.switches.push(SwitchDef {
            key: Chord::Char(key),
            description: description.into(),
            flag: flag.into(),
            default: false,
        });
        self
    }

    pub fn switch_on(mut self, key: char, description: &str, flag: &str) -> Self {
        self = self.switch(key, description, flag);
        if let Some(last) = self.switches.last_mut() {
            last.default = true;
        }
        self
    }

    pub fn option(mut self, key: char, description: &str, flag: &str, reader: ReaderKind) -> Self {
        self.options.push(OptionDef {
            key: Chord::Char(key),
            description: description.into(),
            flag: flag.into(),
            reader,
            default: None,
        });
        self
    }

    pub fn action(mut self, key: char, description: &str, argv: &[&str]) -> Self {
        self.actions.push(ActionDef {
            key: Chord::Char(key),
            description: description.into(),
            run: ActionHandler::Command(argv.iter().map(|s| s.to_string()).collect()),
        });
        self
    }

    pub fn popup_action(mut self, key: char, description: &str, popup: &str) -> Self {
        self.actions.push(ActionDef {
            key: Chord::Char(key),
            description: description.into(),
            run: ActionHandler::Popup(popup.into()),
        });
        self
    }

    pub fn default_action(mut self, argv: &[&str]) -> Self {
        self.default_action = Some(ActionHandler::Command(argv.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub fn max_action_columns(mut self, columns: usize) -> Self {
        self.max_action_columns = Some(columns);
        self
    }
}

/// Validated, immutable popup template.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupDefinition {
    pub name: String,
    pub switches: KeyedList<SwitchDef>,
    pub options: KeyedList<OptionDef>,
    pub actions: KeyedList<ActionDef>,
    pub default_action: Option<ActionHandler>,
    pub use_prefix: Option<UsePrefix>,
    /// Name of the persisted variable holding this popup's arguments.
    pub variable: String,
    pub man_page: Option<String>,
    pub max_action_columns: Option<usize>,
    pub serialization: SerializationMode,
}

impl PopupDefinition {
    pub fn from_spec(name: &str, spec: PopupSpec) -> Result<Self, PopupError> {
        if name.trim().is_empty() {
            return Err(PopupError::invalid("popup name is empty"));
        }
        let duplicate = |class: EventClass| {
            move |key: Chord| PopupError::invalid(format!("{name}: {key} bound twice in {class}"))
        };
        let definition = Self {
            name: name.to_string(),
            switches: KeyedList::from_entries(spec.switches).map_err(duplicate(EventClass::Switches))?,
            options: KeyedList::from_entries(spec.options).map_err(duplicate(EventClass::Options))?,
            actions: KeyedList::from_entries(spec.actions).map_err(duplicate(EventClass::Actions))?,
            default_action: spec.default_action,
            use_prefix: spec.use_prefix,
            variable: spec.variable.unwrap_or_else(|| format!("{name}-arguments")),
            man_page: spec.man_page,
            max_action_columns: spec.max_action_columns,
            serialization: spec.serialization,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Check cross-class key collisions, reserved chords and empty flags.
    pub fn validate(&self) -> Result<(), PopupError> {
        let mut seen: HashMap<Chord, EventClass> = HashMap::new();
        for class in EventClass::ALL {
            for key in self.keys(class) {
                if chord::is_reserved(key) {
                    return Err(PopupError::invalid(format!(
                        "{}: {key} is reserved and cannot be bound in {class}",
                        self.name
                    )));
                }
                if let Some(other) = seen.insert(*key, class) {
                    return Err(PopupError::invalid(format!(
                        "{}: {key} is bound in both {other} and {class}",
                        self.name
                    )));
                }
            }
        }
        let empty_flag = self
            .switches
            .iter()
            .map(|s| (s.key, s.flag.as_str()))
            .chain(self.options.iter().map(|o| (o.key, o.flag.as_str())))
            .find(|(_, flag)| flag.trim().is_empty());
        if let Some((key, _)) = empty_flag {
            return Err(PopupError::invalid(format!("{}: {key} has an empty flag", self.name)));
        }
        Ok(())
    }

    pub fn keys(&self, class: EventClass) -> &[Chord] {
        match class {
            EventClass::Switches => self.switches.keys(),
            EventClass::Options => self.options.keys(),
            EventClass::Actions => self.actions.keys(),
        }
    }
}
