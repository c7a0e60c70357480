use crate::args::{self, ArgPair, PersistedValue};
use crate::chord::Chord;
use crate::definition::{ActionHandler, EventClass, PopupDefinition, ReaderKind, SerializationMode};
use tracing::debug;

/// Live state of one switch, option or action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventState {
    Switch {
        flag: String,
        enabled: bool,
    },
    /// `value` is retained while disabled so re-enabling can pre-fill it.
    Option {
        flag: String,
        enabled: bool,
        value: String,
        reader: ReaderKind,
    },
    Action {
        handler: ActionHandler,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub key: Chord,
    pub description: String,
    pub state: EventState,
}

impl Event {
    pub fn class(&self) -> EventClass {
        match self.state {
            EventState::Switch { .. } => EventClass::Switches,
            EventState::Option { .. } => EventClass::Options,
            EventState::Action { .. } => EventClass::Actions,
        }
    }

    pub fn flag(&self) -> Option<&str> {
        match &self.state {
            EventState::Switch { flag, .. } | EventState::Option { flag, .. } => Some(flag.as_str()),
            EventState::Action { .. } => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self.state {
            EventState::Switch { enabled, .. } | EventState::Option { enabled, .. } => enabled,
            EventState::Action { .. } => false,
        }
    }

    /// Current value of an enabled option.
    pub fn value(&self) -> Option<&str> {
        match &self.state {
            EventState::Option {
                enabled: true,
                value,
                ..
            } => Some(value.as_str()),
            _ => None,
        }
    }
}

/// A live popup: one [`Event`] per definition entry, in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub popup: String,
    pub variable: String,
    pub serialization: SerializationMode,
    pub man_page: Option<String>,
    pub max_action_columns: Option<usize>,
    switches: Vec<Event>,
    options: Vec<Event>,
    actions: Vec<Event>,
}

impl Session {
    /// Build a session from `definition` and its variable's persisted value.
    /// A variable that was never written falls back to definition defaults.
    pub fn materialize(definition: &PopupDefinition, persisted: Option<&PersistedValue>) -> Self {
        let switches = definition
            .switches
            .iter()
            .map(|def| Event {
                key: def.key,
                description: def.description.clone(),
                state: EventState::Switch {
                    flag: def.flag.clone(),
                    enabled: persisted.map_or(def.default, |p| p.switch_enabled(&def.flag)),
                },
            })
            .collect();

        let options = definition
            .options
            .iter()
            .map(|def| {
                let stored = persisted.and_then(|p| p.option_value(&def.flag));
                Event {
                    key: def.key,
                    description: def.description.clone(),
                    state: EventState::Option {
                        flag: def.flag.clone(),
                        enabled: stored.is_some(),
                        value: stored.or_else(|| def.default.clone()).unwrap_or_default(),
                        reader: def.reader.clone(),
                    },
                }
            })
            .collect();

        let actions = definition
            .actions
            .iter()
            .map(|def| Event {
                key: def.key,
                description: def.description.clone(),
                state: EventState::Action {
                    handler: def.run.clone(),
                },
            })
            .collect();

        let session = Self {
            popup: definition.name.clone(),
            variable: definition.variable.clone(),
            serialization: definition.serialization,
            man_page: definition.man_page.clone(),
            max_action_columns: definition.max_action_columns,
            switches,
            options,
            actions,
        };
        debug!(popup = %session.popup, persisted = persisted.is_some(), "session materialized");
        session
    }

    pub fn events(&self, class: EventClass) -> &[Event] {
        match class {
            EventClass::Switches => &self.switches,
            EventClass::Options => &self.options,
            EventClass::Actions => &self.actions,
        }
    }

    /// All events: switches, then options, then actions.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.switches.iter().chain(&self.options).chain(&self.actions)
    }

    pub fn position(&self, class: EventClass, key: &Chord) -> Option<usize> {
        self.events(class).iter().position(|e| e.key == *key)
    }

    pub fn event(&self, class: EventClass, key: &Chord) -> Option<&Event> {
        self.events(class).iter().find(|e| e.key == *key)
    }

    /// Flip switch `index`. Returns the new state.
    pub fn toggle_switch(&mut self, index: usize) -> Option<bool> {
        match self.switches.get_mut(index).map(|e| &mut e.state) {
            Some(EventState::Switch { enabled, .. }) => {
                *enabled = !*enabled;
                Some(*enabled)
            }
            _ => None,
        }
    }

    /// Turn option `index` off, keeping its value.
    pub fn disable_option(&mut self, index: usize) -> bool {
        match self.options.get_mut(index).map(|e| &mut e.state) {
            Some(EventState::Option { enabled, .. }) => {
                *enabled = false;
                true
            }
            _ => false,
        }
    }

    pub fn enable_option(&mut self, index: usize, new_value: String) -> bool {
        match self.options.get_mut(index).map(|e| &mut e.state) {
            Some(EventState::Option { enabled, value, .. }) => {
                *enabled = true;
                *value = new_value;
                true
            }
            _ => false,
        }
    }

    pub fn flat_args(&self) -> Vec<String> {
        args::to_flat(self.iter())
    }

    pub fn structured_args(&self) -> Vec<ArgPair> {
        args::to_structured(self.iter())
    }

    /// The value a persist transition writes to the bound variable.
    pub fn persisted(&self) -> PersistedValue {
        args::persist(self.iter(), self.serialization)
    }
}
