use crate::describe;
use crate::state_machine::{Dispatcher, Effect};
use crate::terminal::{key_name, Input, Prompted, Terminal};
use crossterm::event::KeyEvent;
use anyhow::{bail, Context, Result};
use gitpop_core::config::Config;
use gitpop_core::definition::ActionHandler;
use gitpop_core::layout::Frame;
use gitpop_core::policy::{self, Invocation, InvocationContext, PrefixArg};
use gitpop_core::registry::Registry;
use gitpop_core::store::ArgStore;
use gitpop_core::PopupError;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Popups reached through `popup` handlers before giving up.
const MAX_POPUP_CHAIN: usize = 16;

/// How an interaction ended.
#[derive(Debug)]
pub enum Outcome {
    Quit,
    /// Run `argv` with the context's arguments appended.
    Command {
        argv: Vec<String>,
        context: InvocationContext,
    },
}

enum Next {
    Show { popup: String, advisory: Option<String> },
    Done(Outcome),
}

/// Drives the dispatcher: owns the argument store and executes effects.
pub struct Runner<'a, S: ArgStore> {
    registry: &'a Registry,
    config: &'a Config,
    store: S,
    dispatcher: Dispatcher,
}

impl<'a, S: ArgStore> Runner<'a, S> {
    pub fn new(registry: &'a Registry, config: &'a Config, store: S) -> Self {
        Self {
            registry,
            config,
            store,
            dispatcher: Dispatcher::new(config.general.show_help_section),
        }
    }

    /// Invoke `popup`, interacting with the user if the policy opens it.
    pub fn run(&mut self, popup: &str, prefix: Option<PrefixArg>) -> Result<Outcome> {
        let (popup, advisory) = match self.resolve(popup, prefix)? {
            Next::Done(outcome) => return Ok(outcome),
            Next::Show { popup, advisory } => (popup, advisory),
        };
        let mut terminal = Terminal::enter()?;
        let outcome = self.interact(&mut terminal, &popup, advisory);
        terminal.restore()?;
        outcome
    }

    /// Apply the invocation policy, following `popup` handlers, until a
    /// popup has to be shown or a command run.
    fn resolve(&mut self, popup: &str, prefix: Option<PrefixArg>) -> Result<Next> {
        let mut name = popup.to_string();
        let mut prefix = prefix;
        for _ in 0..MAX_POPUP_CHAIN {
            let definition = self.registry.get(&name)?;
            let persisted = self.store.read(&definition.variable);
            let global = self.config.general.prefix_policy;
            match policy::invoke(definition, global, prefix, persisted.as_ref())? {
                Invocation::Open { advisory } => {
                    if let Some(advisory) = &advisory {
                        info!(popup = %name, %advisory, "default action unavailable");
                    }
                    return Ok(Next::Show { popup: name, advisory });
                }
                Invocation::RunDefault { handler, context } => {
                    info!(popup = %name, args = ?context.args, "bypassing popup");
                    self.dispatcher.record_invocation(context.clone());
                    match handler {
                        ActionHandler::Command(argv) => return Ok(Next::Done(Outcome::Command { argv, context })),
                        ActionHandler::Popup(next) => {
                            name = next;
                            prefix = None;
                        }
                    }
                }
            }
        }
        bail!("popup chain starting at '{popup}' is more than {MAX_POPUP_CHAIN} deep")
    }

    fn open(&mut self, popup: &str) -> Result<Vec<Effect>> {
        let definition = self.registry.get(popup)?;
        let persisted = self.store.read(&definition.variable);
        Ok(self.dispatcher.open(definition, persisted.as_ref()))
    }

    fn interact(&mut self, terminal: &mut Terminal, popup: &str, advisory: Option<String>) -> Result<Outcome> {
        let mut message = advisory;
        let mut queue: VecDeque<Effect> = self.open(popup)?.into();
        let mut closed = false;
        let mut action = None;

        loop {
            while let Some(effect) = queue.pop_front() {
                match effect {
                    Effect::Render => self.draw(terminal, message.as_deref())?,
                    Effect::Message(text) => message = Some(text),
                    Effect::ReadValue { prompt, initial } => {
                        let result = match terminal.read_line(&prompt, initial.as_deref())? {
                            Prompted::Value(value) => self.dispatcher.option_input(Some(value)),
                            Prompted::Cancelled => self.dispatcher.option_input(None),
                            Prompted::Interrupted(chord) => self.dispatcher.process_key(chord),
                        };
                        queue.extend(self.report(terminal, result, &mut message)?);
                    }
                    Effect::Persist {
                        variable,
                        value,
                        durability,
                    } => self
                        .store
                        .write(&variable, value, durability)
                        .with_context(|| format!("persisting {variable}"))?,
                    Effect::Describe(target) => terminal.show_text(&describe::describe(&target))?,
                    Effect::RunAction { handler, context } => action = Some((handler, context)),
                    Effect::Close => closed = true,
                }
            }

            if closed {
                closed = false;
                match action.take() {
                    None => return Ok(Outcome::Quit),
                    Some((ActionHandler::Command(argv), context)) => return Ok(Outcome::Command { argv, context }),
                    Some((ActionHandler::Popup(next), _)) => match self.resolve(&next, None)? {
                        Next::Done(outcome) => return Ok(outcome),
                        Next::Show { popup, advisory } => {
                            message = advisory;
                            queue.extend(self.open(&popup)?);
                            continue;
                        }
                    },
                }
            }

            let chord = match terminal.next_input()? {
                Input::Chord(chord) => chord,
                Input::Click { row, col } => {
                    let hit = self.frame(terminal)?.and_then(|f| f.hit(row, col).map(|r| r.key));
                    match hit {
                        Some(key) => key,
                        None => continue,
                    }
                }
                Input::Resize => {
                    queue.push_back(Effect::Render);
                    continue;
                }
                Input::Unbound(key) => {
                    debug!(key = %key_name(&key), "key has no chord");
                    terminal.bell()?;
                    message = Some(unbound_message(&key));
                    queue.push_back(Effect::Render);
                    continue;
                }
                Input::Ignored => continue,
            };
            message = None;
            let result = self.dispatcher.process_key(chord);
            queue.extend(self.report(terminal, result, &mut message)?);
        }
    }

    /// Turn a recoverable error into a bell and an echo-area message.
    fn report(
        &self,
        terminal: &mut Terminal,
        result: Result<Vec<Effect>, PopupError>,
        message: &mut Option<String>,
    ) -> Result<Vec<Effect>> {
        match result {
            Ok(effects) => Ok(effects),
            Err(err) if err.is_recoverable() => {
                debug!(error = %err, "input rejected");
                terminal.bell()?;
                *message = Some(err.to_string());
                Ok(vec![Effect::Render])
            }
            Err(err) => Err(err.into()),
        }
    }

    fn frame(&self, terminal: &Terminal) -> Result<Option<Frame>> {
        let opts = self.config.layout.options(terminal.width()?);
        Ok(self.dispatcher.frame(&opts))
    }

    fn draw(&self, terminal: &mut Terminal, message: Option<&str>) -> Result<()> {
        if let Some(frame) = self.frame(terminal)? {
            terminal.draw(&frame, message)?;
        }
        Ok(())
    }
}

/// Echo-area text for a key press no chord can name.
fn unbound_message(key: &KeyEvent) -> String {
    format!("{} isn't bound to anything in this popup", key_name(key))
}

/// Run an action's command in the foreground and return its exit code.
pub fn spawn(argv: &[String], context: &InvocationContext) -> Result<i32> {
    let (program, args) = argv.split_first().context("action has an empty command")?;
    let mut command = std::process::Command::new(program);
    command.args(args).args(&context.args);
    command.env("GITPOP_POPUP", &context.popup);
    if let Some(prefix) = context.prefix {
        command.env("GITPOP_PREFIX", prefix.0.to_string());
    }
    info!(%program, args = ?args, extra = ?context.args, "running command");
    let status = command.status().with_context(|| format!("running {program}"))?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpop_core::args::PersistedValue;
    use gitpop_core::definition::PopupSpec;
    use gitpop_core::policy::UsePrefix;
    use gitpop_core::store::{Durability, MemoryStore};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .define(
                "fetch",
                PopupSpec::new()
                    .switch('p', "Prune", "--prune")
                    .action('f', "Fetch", &["git", "fetch"])
                    .default_action(&["git", "fetch"]),
            )
            .unwrap();
        let mut hub = PopupSpec::new().popup_action('f', "Fetch", "fetch");
        hub.default_action = Some(ActionHandler::Popup("fetch".into()));
        registry.define("hub", hub).unwrap();
        let mut looped = PopupSpec::new();
        looped.default_action = Some(ActionHandler::Popup("loop".into()));
        looped.use_prefix = Some(UsePrefix::Popup);
        registry.define("loop", looped).unwrap();
        registry
    }

    #[test]
    fn bypass_returns_command_with_persisted_args() {
        let registry = registry();
        let config = Config::default();
        let mut store = MemoryStore::new();
        store
            .write("fetch-arguments", PersistedValue::Flat(vec!["--prune".into()]), Durability::Transient)
            .unwrap();
        let mut runner = Runner::new(&registry, &config, store);

        match runner.run("fetch", Some(PrefixArg::UNIVERSAL)).unwrap() {
            Outcome::Command { argv, context } => {
                assert_eq!(argv, vec!["git", "fetch"]);
                assert_eq!(context.args, vec!["--prune"]);
                assert_eq!(context.prefix, None);
            }
            other => panic!("expected command, got {other:?}"),
        }
        assert!(runner.dispatcher.last_invocation().is_some());
    }

    #[test]
    fn bypass_follows_popup_handlers() {
        let registry = registry();
        let config = Config::default();
        let mut runner = Runner::new(&registry, &config, MemoryStore::new());
        match runner.resolve("hub", Some(PrefixArg::UNIVERSAL)).unwrap() {
            Next::Show { popup, advisory } => {
                assert_eq!(popup, "fetch");
                assert!(advisory.is_none());
            }
            Next::Done(outcome) => panic!("expected fetch to open, got {outcome:?}"),
        }
    }

    #[test]
    fn popup_handler_cycles_are_cut_off() {
        let registry = registry();
        let config = Config::default();
        let mut runner = Runner::new(&registry, &config, MemoryStore::new());
        let err = runner.resolve("loop", None).err().unwrap();
        assert!(err.to_string().contains("more than"));
    }

    #[test]
    fn unknown_popup_is_an_error() {
        let registry = registry();
        let config = Config::default();
        let mut runner = Runner::new(&registry, &config, MemoryStore::new());
        let err = runner.resolve("bisect", None).err().unwrap();
        assert_eq!(err.downcast_ref::<PopupError>(), Some(&PopupError::UnknownPopup("bisect".into())));
    }

    #[test]
    fn spawn_appends_context_args() {
        let context = InvocationContext {
            popup: "demo".into(),
            args: vec!["-c".into(), "exit 3".into()],
            prefix: None,
        };
        assert_eq!(spawn(&["sh".to_string()], &context).unwrap(), 3);
        assert!(spawn(&[], &context).is_err());
    }

    #[test]
    fn unbound_keys_are_named_in_the_message() {
        use crossterm::event::{KeyCode, KeyModifiers};
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT);
        assert_eq!(unbound_message(&key), "M-<enter> isn't bound to anything in this popup");
    }
}
