use crate::builtin;
use crate::chord::Chord;
use crate::definition::{ActionDef, ActionHandler, EventClass, EventDef, OptionDef, Placement, PopupSpec, ReaderKind, SwitchDef};
use crate::error::PopupError;
use crate::layout::LayoutOptions;
use crate::policy::UsePrefix;
use crate::registry::Registry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// User popups, replacing built-ins of the same name.
    #[serde(default)]
    pub popup: BTreeMap<String, PopupSpec>,
    /// Registry edits applied in order after all popups are defined.
    #[serde(default)]
    pub tweak: Vec<Tweak>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub prefix_policy: UsePrefix,
    #[serde(default = "GeneralConfig::default_show_help_section")]
    pub show_help_section: bool,
}

impl GeneralConfig {
    fn default_show_help_section() -> bool { true }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            prefix_policy: UsePrefix::Default,
            show_help_section: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "LayoutConfig::default_min_padding")]
    pub min_padding: usize,
    #[serde(default = "LayoutConfig::default_max_width")]
    pub max_width: usize,
    #[serde(default)]
    pub switch_columns: Option<usize>,
    #[serde(default)]
    pub option_columns: Option<usize>,
    #[serde(default)]
    pub action_columns: Option<usize>,
}

impl LayoutConfig {
    fn default_min_padding() -> usize { 2 }
    fn default_max_width() -> usize { 120 }

    /// Layout options for a surface `available` cells wide.
    pub fn options(&self, available: usize) -> LayoutOptions {
        LayoutOptions {
            width: available.min(self.max_width).max(1),
            min_padding: self.min_padding,
            switch_columns: self.switch_columns,
            option_columns: self.option_columns,
            action_columns: self.action_columns,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_padding: 2,
            max_width: 120,
            switch_columns: None,
            option_columns: None,
            action_columns: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweakOp {
    Add,
    Remove,
    Rebind,
}

/// One registry edit from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweak {
    pub op: TweakOp,
    pub popup: String,
    /// Kept as text so an unknown class is reported as a definition error.
    pub class: String,
    pub key: Chord,
    #[serde(default)]
    pub to: Option<Chord>,
    #[serde(default)]
    pub at: Option<Chord>,
    #[serde(default)]
    pub prepend: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    /// Switches: on by default.
    #[serde(default)]
    pub enabled: bool,
    /// Options: pre-fill value.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub reader: Option<ReaderKind>,
    #[serde(default)]
    pub run: Option<ActionHandler>,
}

impl Tweak {
    pub fn apply(&self, registry: &mut Registry) -> Result<(), PopupError> {
        let class: EventClass = self.class.parse()?;
        match self.op {
            TweakOp::Add => {
                let placement = Placement {
                    at: self.at,
                    prepend: self.prepend,
                };
                registry.add_event(&self.popup, class, self.event_def(class)?, &placement)
            }
            TweakOp::Remove => registry.remove_event(&self.popup, class, &self.key),
            TweakOp::Rebind => {
                let to = self.to.ok_or_else(|| self.missing("to"))?;
                registry.rebind_key(&self.popup, class, &self.key, to)
            }
        }
    }

    fn event_def(&self, class: EventClass) -> Result<EventDef, PopupError> {
        let description = self.description.clone().ok_or_else(|| self.missing("description"))?;
        Ok(match class {
            EventClass::Switches => EventDef::Switch(SwitchDef {
                key: self.key,
                description,
                flag: self.flag.clone().ok_or_else(|| self.missing("flag"))?,
                default: self.enabled,
            }),
            EventClass::Options => EventDef::Option(OptionDef {
                key: self.key,
                description,
                flag: self.flag.clone().ok_or_else(|| self.missing("flag"))?,
                reader: self.reader.clone().unwrap_or_default(),
                default: self.value.clone(),
            }),
            EventClass::Actions => EventDef::Action(ActionDef {
                key: self.key,
                description,
                run: self.run.clone().ok_or_else(|| self.missing("run"))?,
            }),
        })
    }

    fn missing(&self, field: &str) -> PopupError {
        PopupError::InvalidDefinition(format!(
            "tweak {:?} {} {} in {}: missing '{field}'",
            self.op, self.class, self.key, self.popup
        ))
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("gitpop")
    }

    pub fn config_path() -> PathBuf {
        // GITPOP_CONFIG overrides for testing and per-repo setups.
        if let Ok(path) = std::env::var("GITPOP_CONFIG") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Config = toml::from_str(&contents).with_context(|| "parsing config TOML")?;
        debug!(path = %path.display(), popups = config.popup.len(), tweaks = config.tweak.len(), "config loaded");
        Ok(config)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("arguments.json"))
    }

    /// Built-in popups, then user popups, then tweaks.
    pub fn load_registry(&self) -> Result<Registry> {
        let mut registry = builtin::builtin_registry().context("building built-in popups")?;
        for (name, spec) in &self.popup {
            registry
                .define(name, spec.clone())
                .with_context(|| format!("defining popup '{name}'"))?;
        }
        for (idx, tweak) in self.tweak.iter().enumerate() {
            tweak
                .apply(&mut registry)
                .with_context(|| format!("applying tweak #{}", idx + 1))?;
        }
        info!(popups = registry.len(), "popups loaded");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- defaults ---

    #[test]
    fn default_prefix_policy_is_default() {
        let config = Config::default();
        assert_eq!(config.general.prefix_policy, UsePrefix::Default);
    }

    #[test]
    fn default_shows_help_section() {
        assert!(Config::default().general.show_help_section);
    }

    #[test]
    fn default_layout_padding_is_2() {
        assert_eq!(Config::default().layout.min_padding, 2);
    }

    // --- TOML parsing ---

    #[test]
    fn parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.prefix_policy, UsePrefix::Default);
        assert_eq!(config.layout.max_width, 120);
        assert!(config.popup.is_empty());
    }

    #[test]
    fn parse_global_policy() {
        let config: Config = toml::from_str(
            r#"
[general]
prefix_policy = "disabled"
"#,
        )
        .unwrap();
        assert_eq!(config.general.prefix_policy, UsePrefix::Disabled);
        assert!(config.general.show_help_section);
    }

    #[test]
    fn layout_options_clamp_to_max_width() {
        let layout = LayoutConfig {
            max_width: 60,
            action_columns: Some(3),
            ..LayoutConfig::default()
        };
        let opts = layout.options(200);
        assert_eq!(opts.width, 60);
        assert_eq!(opts.action_columns, Some(3));
        assert_eq!(layout.options(40).width, 40);
    }

    // --- registry loading ---

    #[test]
    fn registry_falls_back_to_builtins() {
        let registry = Config::default().load_registry().unwrap();
        assert!(registry.get("commit").is_ok());
        assert!(registry.get("dispatch").is_ok());
    }

    #[test]
    fn user_popup_replaces_builtin() {
        let config: Config = toml::from_str(
            r#"
[popup.commit]
actions = [{ key = "c", description = "Commit quietly", run = { command = ["git", "commit", "-q"] } }]
"#,
        )
        .unwrap();
        let registry = config.load_registry().unwrap();
        let commit = registry.get("commit").unwrap();
        assert!(commit.switches.is_empty());
        assert_eq!(commit.actions.len(), 1);
    }

    #[test]
    fn tweaks_edit_builtins_in_order() {
        let config: Config = toml::from_str(
            r#"
[[tweak]]
op = "add"
popup = "commit"
class = "switches"
key = "S"
description = "Sign off"
flag = "--signoff"
at = "a"
prepend = true

[[tweak]]
op = "remove"
popup = "commit"
class = "options"
key = "S"

[[tweak]]
op = "rebind"
popup = "commit"
class = "actions"
key = "x"
to = "E"
"#,
        )
        .unwrap();
        // Adding S before the S option is removed collides across classes.
        let err = config.load_registry().unwrap_err();
        assert!(format!("{err:#}").contains("tweak #1"));

        let mut reordered = config.clone();
        reordered.tweak.swap(0, 1);
        let registry = reordered.load_registry().unwrap();
        let commit = registry.get("commit").unwrap();
        assert_eq!(commit.switches.keys()[0], Chord::Char('S'));
        assert!(!commit.options.contains(&Chord::Char('S')));
        assert!(commit.actions.contains(&Chord::Char('E')));
        assert!(!commit.actions.contains(&Chord::Char('x')));
    }

    #[test]
    fn tweak_with_unknown_class_is_invalid_definition() {
        let tweak = Tweak {
            op: TweakOp::Remove,
            popup: "commit".into(),
            class: "sequences".into(),
            key: Chord::Char('a'),
            to: None,
            at: None,
            prepend: false,
            description: None,
            flag: None,
            enabled: false,
            value: None,
            reader: None,
            run: None,
        };
        let mut registry = Config::default().load_registry().unwrap();
        assert!(matches!(tweak.apply(&mut registry), Err(PopupError::InvalidDefinition(_))));
    }

    #[test]
    fn tweak_on_unknown_popup_is_invalid_definition() {
        let config: Config = toml::from_str(
            r#"
[[tweak]]
op = "remove"
popup = "bisect"
class = "switches"
key = "a"
"#,
        )
        .unwrap();
        let mut registry = Config::default().load_registry().unwrap();
        assert!(matches!(
            config.tweak[0].apply(&mut registry),
            Err(PopupError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn store_path_defaults_under_config_dir() {
        let path = Config::default().store_path();
        assert_eq!(path.file_name().unwrap(), "arguments.json");
    }
}
