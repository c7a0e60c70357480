//! Deciding whether a prefix argument opens the popup or bypasses it.

use crate::args::PersistedValue;
use crate::definition::{ActionHandler, PopupDefinition};
use crate::error::PopupError;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// How a prefix argument affects invoking a popup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsePrefix {
    /// Prefix runs the default action, no prefix opens the popup.
    #[default]
    Default,
    /// No prefix runs the default action, prefix opens the popup.
    Popup,
    /// Always open the popup; a prefix argument is an error.
    Disabled,
    /// Always open the popup.
    None,
}

impl fmt::Display for UsePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UsePrefix::Default => "default",
            UsePrefix::Popup => "popup",
            UsePrefix::Disabled => "disabled",
            UsePrefix::None => "none",
        })
    }
}

/// Raw numeric prefix argument; each `C-u` multiplies it by four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixArg(pub u32);

impl PrefixArg {
    pub const UNIVERSAL: PrefixArg = PrefixArg(4);

    /// `count` presses of `C-u`.
    pub fn from_presses(count: u32) -> Option<Self> {
        (count > 0).then(|| PrefixArg(4u32.saturating_pow(count)))
    }

    /// What a bypassed popup hands to its default action: a single `C-u` is
    /// consumed by the bypass, further ones are passed on divided by four.
    pub fn consumed(self) -> Option<PrefixArg> {
        (self.0 != 4).then_some(PrefixArg(self.0 / 4)).filter(|p| p.0 > 0)
    }
}

/// Arguments handed to an action when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub popup: String,
    pub args: Vec<String>,
    pub prefix: Option<PrefixArg>,
}

/// Outcome of invoking a popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Open a session. `advisory` explains a fallback, if any.
    Open { advisory: Option<String> },
    /// Run the default action directly with the persisted arguments.
    RunDefault {
        handler: ActionHandler,
        context: InvocationContext,
    },
}

/// Resolve what invoking `definition` should do.
///
/// The popup's own `use_prefix` wins over `global`.
pub fn invoke(
    definition: &PopupDefinition,
    global: UsePrefix,
    prefix: Option<PrefixArg>,
    persisted: Option<&PersistedValue>,
) -> Result<Invocation, PopupError> {
    let local = definition.use_prefix;
    let policy = local.unwrap_or(global);

    let bypass = match policy {
        UsePrefix::Default => prefix.is_some(),
        UsePrefix::Popup => prefix.is_none(),
        UsePrefix::None => false,
        UsePrefix::Disabled => {
            if prefix.is_some() {
                let msg = if local.is_some() {
                    format!(
                        "{}: prefix arguments are disabled for this popup; change its use_prefix \
                         to \"default\" or \"popup\"",
                        definition.name
                    )
                } else {
                    "prefix arguments are disabled; set general.prefix_policy to \"default\", \
                     \"popup\" or \"none\" before using one"
                        .to_string()
                };
                return Err(PopupError::PolicyMisuse(msg));
            }
            false
        }
    };

    if !bypass {
        debug!(popup = %definition.name, %policy, "opening popup");
        return Ok(Invocation::Open { advisory: None });
    }

    let Some(handler) = definition.default_action.clone() else {
        info!(popup = %definition.name, "no default action, opening popup");
        return Ok(Invocation::Open {
            advisory: Some(format!(
                "{} has no default action; showing popup instead",
                definition.name
            )),
        });
    };

    let args = Session::materialize(definition, persisted).flat_args();
    debug!(popup = %definition.name, ?args, "running default action");
    Ok(Invocation::RunDefault {
        handler,
        context: InvocationContext {
            popup: definition.name.clone(),
            args,
            prefix: prefix.and_then(PrefixArg::consumed),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PopupSpec;

    fn def(use_prefix: Option<UsePrefix>, with_default: bool) -> PopupDefinition {
        let mut spec = PopupSpec::new()
            .switch('a', "All", "--all")
            .action('f', "Fetch", &["git", "fetch"]);
        if with_default {
            spec = spec.default_action(&["git", "fetch"]);
        }
        spec.use_prefix = use_prefix;
        PopupDefinition::from_spec("fetch", spec).unwrap()
    }

    fn opens(result: Result<Invocation, PopupError>) -> bool {
        matches!(result, Ok(Invocation::Open { .. }))
    }

    fn bypasses(result: Result<Invocation, PopupError>) -> bool {
        matches!(result, Ok(Invocation::RunDefault { .. }))
    }

    #[test]
    fn default_policy_prefix_bypasses() {
        let d = def(None, true);
        assert!(bypasses(invoke(&d, UsePrefix::Default, Some(PrefixArg::UNIVERSAL), None)));
        assert!(opens(invoke(&d, UsePrefix::Default, None, None)));
    }

    #[test]
    fn popup_policy_is_inverted() {
        let d = def(Some(UsePrefix::Popup), true);
        assert!(opens(invoke(&d, UsePrefix::Default, Some(PrefixArg::UNIVERSAL), None)));
        assert!(bypasses(invoke(&d, UsePrefix::Default, None, None)));
    }

    #[test]
    fn none_policy_always_opens() {
        let d = def(Some(UsePrefix::None), true);
        assert!(opens(invoke(&d, UsePrefix::Default, Some(PrefixArg::UNIVERSAL), None)));
        assert!(opens(invoke(&d, UsePrefix::Default, None, None)));
    }

    #[test]
    fn disabled_global_policy_rejects_prefix() {
        let d = def(None, true);
        let err = invoke(&d, UsePrefix::Disabled, Some(PrefixArg::UNIVERSAL), None).unwrap_err();
        assert!(matches!(err, PopupError::PolicyMisuse(msg) if msg.contains("general.prefix_policy")));
        assert!(opens(invoke(&d, UsePrefix::Disabled, None, None)));
    }

    #[test]
    fn local_policy_wins_over_global() {
        let d = def(Some(UsePrefix::Default), true);
        assert!(bypasses(invoke(&d, UsePrefix::Disabled, Some(PrefixArg::UNIVERSAL), None)));
    }

    #[test]
    fn missing_default_action_falls_back_with_advisory() {
        let d = def(None, false);
        match invoke(&d, UsePrefix::Default, Some(PrefixArg::UNIVERSAL), None).unwrap() {
            Invocation::Open { advisory: Some(msg) } => assert!(msg.contains("no default action")),
            other => panic!("expected advisory, got {other:?}"),
        }
    }

    #[test]
    fn bypass_passes_persisted_args_and_transformed_prefix() {
        let d = def(None, true);
        let persisted = PersistedValue::Flat(vec!["--all".into()]);
        let result = invoke(&d, UsePrefix::Default, PrefixArg::from_presses(2), Some(&persisted));
        match result.unwrap() {
            Invocation::RunDefault { handler, context } => {
                assert_eq!(handler, ActionHandler::Command(vec!["git".into(), "fetch".into()]));
                assert_eq!(context.args, vec!["--all"]);
                assert_eq!(context.prefix, Some(PrefixArg(4)));
            }
            other => panic!("expected bypass, got {other:?}"),
        }
    }

    #[test]
    fn single_universal_prefix_is_consumed() {
        assert_eq!(PrefixArg::UNIVERSAL.consumed(), None);
        assert_eq!(PrefixArg(16).consumed(), Some(PrefixArg(4)));
        assert_eq!(PrefixArg::from_presses(0), None);
        assert_eq!(PrefixArg::from_presses(3), Some(PrefixArg(64)));
    }
}
