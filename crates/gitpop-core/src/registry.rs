use crate::chord::Chord;
use crate::definition::{EventClass, EventDef, Placement, PopupDefinition, PopupSpec};
use crate::error::PopupError;
use std::collections::BTreeMap;
use tracing::debug;

/// Named popup definitions.
///
/// Every edit is applied to a copy and validated before it replaces the
/// stored definition, so a rejected edit leaves the registry unchanged.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    popups: BTreeMap<String, PopupDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the popup `name`.
    pub fn define(&mut self, name: &str, spec: PopupSpec) -> Result<(), PopupError> {
        let definition = PopupDefinition::from_spec(name, spec)?;
        self.insert(definition);
        Ok(())
    }

    pub fn insert(&mut self, definition: PopupDefinition) {
        debug!(popup = %definition.name, "popup defined");
        self.popups.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, name: &str) -> Result<&PopupDefinition, PopupError> {
        self.popups
            .get(name)
            .ok_or_else(|| PopupError::UnknownPopup(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.popups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.popups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }

    /// Insert or replace one entry, optionally relative to another key.
    pub fn add_event(
        &mut self,
        name: &str,
        class: EventClass,
        def: EventDef,
        placement: &Placement,
    ) -> Result<(), PopupError> {
        if def.class() != class {
            return Err(PopupError::invalid(format!(
                "{name}: a {} entry cannot be added to {class}",
                def.class()
            )));
        }
        self.edit(name, |popup| {
            match def {
                EventDef::Switch(d) => popup.switches.upsert(d, placement),
                EventDef::Option(d) => popup.options.upsert(d, placement),
                EventDef::Action(d) => popup.actions.upsert(d, placement),
            }
            Ok(())
        })
    }

    pub fn remove_event(&mut self, name: &str, class: EventClass, key: &Chord) -> Result<(), PopupError> {
        self.edit(name, |popup| {
            let removed = match class {
                EventClass::Switches => popup.switches.remove(key).is_some(),
                EventClass::Options => popup.options.remove(key).is_some(),
                EventClass::Actions => popup.actions.remove(key).is_some(),
            };
            if removed {
                Ok(())
            } else {
                Err(PopupError::invalid(format!("{name}: {key} isn't bound in {class}")))
            }
        })
    }

    /// Rename a key in place.
    pub fn rebind_key(&mut self, name: &str, class: EventClass, from: &Chord, to: Chord) -> Result<(), PopupError> {
        self.edit(name, |popup| {
            let rebound = match class {
                EventClass::Switches => popup.switches.rebind(from, to),
                EventClass::Options => popup.options.rebind(from, to),
                EventClass::Actions => popup.actions.rebind(from, to),
            };
            if rebound {
                Ok(())
            } else {
                Err(PopupError::invalid(format!(
                    "{name}: cannot rebind {from} to {to} in {class}"
                )))
            }
        })
    }

    fn edit(
        &mut self,
        name: &str,
        apply: impl FnOnce(&mut PopupDefinition) -> Result<(), PopupError>,
    ) -> Result<(), PopupError> {
        let current = self
            .popups
            .get(name)
            .ok_or_else(|| PopupError::invalid(format!("no popup named '{name}' to edit")))?;
        let mut updated = current.clone();
        apply(&mut updated)?;
        updated.validate()?;
        self.insert(updated);
        Ok(())
    }
}
