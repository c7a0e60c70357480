use crate::keymap::{self, Keymap, TransitionKind};
use gitpop_core::args::PersistedValue;
use gitpop_core::chord::{Chord, Command};
use gitpop_core::definition::{ActionHandler, EventClass, PopupDefinition};
use gitpop_core::help::HelpTarget;
use gitpop_core::layout::{self, Focus, Frame, LayoutOptions};
use gitpop_core::policy::{InvocationContext, PrefixArg};
use gitpop_core::session::{EventState, Session};
use gitpop_core::store::Durability;
use gitpop_core::PopupError;
use tracing::{debug, info};

/// Dispatcher states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No popup is open.
    Closed,
    /// A session is open and accepting keys.
    Open,
    /// The host is reading a value for option `index`.
    AwaitingOptionInput { index: usize },
    /// `?` was pressed; the next chord is described instead of run.
    AwaitingHelpChord,
}

/// Effects that the dispatcher wants the caller to perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Redraw the popup from [`Dispatcher::frame`].
    Render,
    /// Read a value and hand it to [`Dispatcher::option_input`].
    ReadValue { prompt: String, initial: Option<String> },
    /// Write the popup's arguments to its variable.
    Persist {
        variable: String,
        value: PersistedValue,
        durability: Durability,
    },
    /// Invoke an action's handler. Always preceded by `Close`.
    RunAction {
        handler: ActionHandler,
        context: InvocationContext,
    },
    /// Show help for a resolved chord.
    Describe(HelpTarget),
    /// Show a line in the echo area.
    Message(String),
    /// Tear down the popup and restore the display.
    Close,
}

/// The single open popup.
#[derive(Debug)]
struct Active {
    session: Session,
    keymap: Keymap,
    focus: Option<Focus>,
    /// Pending `C-u` presses, consumed by the next transition.
    prefix: Option<PrefixArg>,
}

pub struct Dispatcher {
    state: State,
    active: Option<Active>,
    /// Display preference kept across sessions.
    show_help_section: bool,
    last_invocation: Option<InvocationContext>,
}

impl Dispatcher {
    pub fn new(show_help_section: bool) -> Self {
        Self {
            state: State::Closed,
            active: None,
            show_help_section,
            last_invocation: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state != State::Closed
    }

    pub fn is_awaiting_input(&self) -> bool {
        matches!(self.state, State::AwaitingOptionInput { .. })
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn show_help_section(&self) -> bool {
        self.show_help_section
    }

    /// Context of the most recent action run, from a popup or a bypass.
    pub fn last_invocation(&self) -> Option<&InvocationContext> {
        self.last_invocation.as_ref()
    }

    pub fn record_invocation(&mut self, context: InvocationContext) {
        self.last_invocation = Some(context);
    }

    /// Open `definition`, replacing any open session.
    pub fn open(&mut self, definition: &PopupDefinition, persisted: Option<&PersistedValue>) -> Vec<Effect> {
        if let Some(previous) = &self.active {
            debug!(popup = %previous.session.popup, "replacing open popup");
        }
        let session = Session::materialize(definition, persisted);
        let keymap = Keymap::for_session(&session);
        info!(popup = %session.popup, bindings = keymap.len(), "popup opened");
        self.active = Some(Active {
            session,
            keymap,
            focus: None,
            prefix: None,
        });
        self.state = State::Open;
        vec![Effect::Render]
    }

    /// Lay out the open session.
    pub fn frame(&self, opts: &LayoutOptions) -> Option<Frame> {
        let active = self.active.as_ref()?;
        let aux = if self.show_help_section {
            layout::common_commands()
        } else {
            Vec::new()
        };
        Some(layout::render(&active.session, &aux, active.focus.as_ref(), opts))
    }

    /// Process one chord, returning effects for the caller.
    pub fn process_key(&mut self, chord: Chord) -> Result<Vec<Effect>, PopupError> {
        match self.state {
            State::Closed => Err(PopupError::NotOpen),
            State::AwaitingOptionInput { .. } => {
                if keymap::is_reserved_quit(&chord) {
                    Ok(self.quit())
                } else {
                    Err(PopupError::InputPending(chord))
                }
            }
            State::AwaitingHelpChord => {
                self.state = State::Open;
                self.describe(chord)
            }
            State::Open => {
                let kind = self.active()?.keymap.resolve(&chord);
                match kind {
                    Some(kind) => self.apply(kind),
                    None => {
                        self.active_mut()?.prefix = None;
                        debug!(%chord, "unbound key");
                        Err(PopupError::UnboundKey(chord))
                    }
                }
            }
        }
    }

    /// Resolve a pending value read. `None` means the read was cancelled.
    pub fn option_input(&mut self, answer: Option<String>) -> Result<Vec<Effect>, PopupError> {
        let State::AwaitingOptionInput { index } = self.state else {
            return match self.state {
                State::Closed => Err(PopupError::NotOpen),
                _ => Ok(Vec::new()),
            };
        };
        self.state = State::Open;

        let Some(raw) = answer else {
            debug!(index, "value entry cancelled");
            return Ok(vec![Effect::Render]);
        };
        let active = self.active_mut()?;
        let (flag, reader) = match active.session.events(EventClass::Options).get(index).map(|e| &e.state) {
            Some(EventState::Option { flag, reader, .. }) => (flag.clone(), reader.clone()),
            _ => return Ok(vec![Effect::Render]),
        };
        match reader.accept(&raw) {
            Ok(Some(value)) => {
                debug!(%flag, %value, "option enabled");
                active.session.enable_option(index, value);
                Ok(vec![Effect::Render])
            }
            Ok(None) => {
                debug!(%flag, "empty value, option left disabled");
                Ok(vec![Effect::Render])
            }
            Err(reason) => Err(PopupError::InvalidValue { flag, reason }),
        }
    }

    /// Close the popup unconditionally.
    pub fn quit(&mut self) -> Vec<Effect> {
        if let Some(active) = self.active.take() {
            info!(popup = %active.session.popup, "popup closed");
        }
        self.state = State::Closed;
        vec![Effect::Close]
    }

    fn active(&self) -> Result<&Active, PopupError> {
        self.active.as_ref().ok_or(PopupError::NotOpen)
    }

    fn active_mut(&mut self) -> Result<&mut Active, PopupError> {
        self.active.as_mut().ok_or(PopupError::NotOpen)
    }

    fn apply(&mut self, kind: TransitionKind) -> Result<Vec<Effect>, PopupError> {
        if kind == TransitionKind::Builtin(Command::PrefixArgument) {
            let active = self.active_mut()?;
            let next = active
                .prefix
                .map_or(PrefixArg::UNIVERSAL, |p| PrefixArg(p.0.saturating_mul(4)));
            active.prefix = Some(next);
            return Ok(vec![Effect::Message(format!("prefix argument {}", next.0)), Effect::Render]);
        }

        let prefix = self.active_mut()?.prefix.take();
        match kind {
            TransitionKind::ToggleSwitch(index) => {
                let active = self.active_mut()?;
                if let Some(enabled) = active.session.toggle_switch(index) {
                    debug!(popup = %active.session.popup, index, enabled, "switch toggled");
                }
                Ok(vec![Effect::Render])
            }
            TransitionKind::SetOption(index) => self.set_option(index),
            TransitionKind::RunAction(index) => self.run_action(index, prefix),
            TransitionKind::Builtin(command) => self.builtin(command, prefix),
        }
    }

    fn set_option(&mut self, index: usize) -> Result<Vec<Effect>, PopupError> {
        let active = self.active_mut()?;
        let (enabled, prompt, initial) = match active.session.events(EventClass::Options).get(index) {
            Some(event) => match &event.state {
                EventState::Option {
                    flag,
                    enabled,
                    value,
                    reader,
                } => (*enabled, reader.prompt(flag), (!value.is_empty()).then(|| value.clone())),
                _ => return Ok(Vec::new()),
            },
            None => return Ok(Vec::new()),
        };

        if enabled {
            active.session.disable_option(index);
            debug!(index, "option disabled");
            return Ok(vec![Effect::Render]);
        }
        self.state = State::AwaitingOptionInput { index };
        Ok(vec![Effect::ReadValue { prompt, initial }])
    }

    fn run_action(&mut self, index: usize, prefix: Option<PrefixArg>) -> Result<Vec<Effect>, PopupError> {
        let session = &self.active()?.session;
        let handler = match session.events(EventClass::Actions).get(index).map(|e| &e.state) {
            Some(EventState::Action { handler }) => handler.clone(),
            _ => return Ok(Vec::new()),
        };
        let context = InvocationContext {
            popup: session.popup.clone(),
            args: session.flat_args(),
            prefix,
        };
        info!(popup = %context.popup, args = ?context.args, "running action");
        self.last_invocation = Some(context.clone());

        let mut effects = self.quit();
        effects.push(Effect::RunAction { handler, context });
        Ok(effects)
    }

    fn builtin(&mut self, command: Command, prefix: Option<PrefixArg>) -> Result<Vec<Effect>, PopupError> {
        match command {
            Command::Quit => Ok(self.quit()),
            Command::Help => {
                self.state = State::AwaitingHelpChord;
                Ok(vec![Effect::Message("Describe key: ".into()), Effect::Render])
            }
            Command::SetDefaults => self.persist(Durability::Transient, prefix.is_some()),
            Command::SaveDefaults => self.persist(Durability::Durable, prefix.is_some()),
            Command::ToggleHelpSection => {
                self.show_help_section = !self.show_help_section;
                Ok(vec![Effect::Render])
            }
            Command::FocusNext => self.move_focus(1),
            Command::FocusPrev => self.move_focus(-1),
            Command::Activate => self.activate(prefix),
            Command::PrefixArgument => Ok(Vec::new()),
        }
    }

    fn persist(&mut self, durability: Durability, keep_open: bool) -> Result<Vec<Effect>, PopupError> {
        let session = &self.active()?.session;
        let variable = session.variable.clone();
        let value = session.persisted();
        info!(%variable, ?durability, keep_open, "persisting arguments");

        let mut effects = vec![Effect::Persist {
            variable,
            value,
            durability,
        }];
        if keep_open {
            let msg = match durability {
                Durability::Transient => "Arguments set",
                Durability::Durable => "Arguments saved",
            };
            effects.push(Effect::Message(msg.into()));
            effects.push(Effect::Render);
        } else {
            effects.extend(self.quit());
        }
        Ok(effects)
    }

    fn move_focus(&mut self, step: isize) -> Result<Vec<Effect>, PopupError> {
        let active = self.active_mut()?;
        let order = focus_order(&active.session);
        let Some(current) = focus_index(active, &order) else {
            return Ok(Vec::new());
        };
        let next = (current as isize + step).rem_euclid(order.len() as isize) as usize;
        active.focus = Some(order[next]);
        Ok(vec![Effect::Render])
    }

    fn activate(&mut self, prefix: Option<PrefixArg>) -> Result<Vec<Effect>, PopupError> {
        let active = self.active_mut()?;
        let order = focus_order(&active.session);
        let Some(current) = focus_index(active, &order) else {
            return Ok(Vec::new());
        };
        let key = order[current].key;
        active.prefix = prefix;
        let kind = active.keymap.resolve(&key);
        match kind {
            Some(kind) => self.apply(kind),
            None => Err(PopupError::UnboundKey(key)),
        }
    }

    fn describe(&mut self, chord: Chord) -> Result<Vec<Effect>, PopupError> {
        let active = self.active()?;
        let session = &active.session;
        let event = |class: EventClass, index: usize| {
            session
                .events(class)
                .get(index)
                .map(|e| HelpTarget::for_event(session, e))
        };
        let target = match active.keymap.resolve(&chord) {
            Some(TransitionKind::ToggleSwitch(i)) => event(EventClass::Switches, i),
            Some(TransitionKind::SetOption(i)) => event(EventClass::Options, i),
            Some(TransitionKind::RunAction(i)) => event(EventClass::Actions, i),
            Some(TransitionKind::Builtin(command)) => Some(HelpTarget::Command(chord, command)),
            None => None,
        };
        match target {
            Some(target) => {
                debug!(%chord, "describing key");
                Ok(vec![Effect::Describe(target), Effect::Render])
            }
            None => Err(PopupError::HelpUnresolved(chord)),
        }
    }
}

/// Buttons in display order.
fn focus_order(session: &Session) -> Vec<Focus> {
    session
        .iter()
        .map(|e| Focus {
            class: e.class(),
            key: e.key,
        })
        .collect()
}

/// Index of the focused button, defaulting to the first action.
fn focus_index(active: &Active, order: &[Focus]) -> Option<usize> {
    if order.is_empty() {
        return None;
    }
    let focused = active.focus.and_then(|f| order.iter().position(|o| *o == f));
    Some(
        focused
            .or_else(|| order.iter().position(|o| o.class == EventClass::Actions))
            .unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpop_core::definition::{PopupSpec, ReaderKind, SerializationMode};
    use gitpop_core::store::{ArgStore, MemoryStore};

    fn def() -> PopupDefinition {
        PopupDefinition::from_spec(
            "demo",
            PopupSpec::new()
                .switch('a', "All", "--all")
                .action('x', "Run handler", &["handler"]),
        )
        .unwrap()
    }

    fn option_def() -> PopupDefinition {
        PopupDefinition::from_spec(
            "log",
            PopupSpec::new()
                .switch('g', "Graph", "--graph")
                .option('n', "Limit", "-n", ReaderKind::Number)
                .option('m', "Message", "--message=", ReaderKind::Text)
                .action('l', "Log", &["git", "log"]),
        )
        .unwrap()
    }

    fn open(def: &PopupDefinition) -> Dispatcher {
        let mut d = Dispatcher::new(true);
        d.open(def, None);
        d
    }

    fn press(d: &mut Dispatcher, keys: &str) -> Vec<Effect> {
        keys.chars()
            .flat_map(|c| d.process_key(Chord::Char(c)).unwrap())
            .collect()
    }

    fn action_context(effects: &[Effect]) -> Option<&InvocationContext> {
        effects.iter().find_map(|e| match e {
            Effect::RunAction { context, .. } => Some(context),
            _ => None,
        })
    }

    fn persisted(effects: &[Effect]) -> Option<(&str, &PersistedValue, Durability)> {
        effects.iter().find_map(|e| match e {
            Effect::Persist {
                variable,
                value,
                durability,
            } => Some((variable.as_str(), value, *durability)),
            _ => None,
        })
    }

    // --- end to end ---

    #[test]
    fn switch_then_action_passes_flag() {
        let mut d = open(&def());
        let effects = press(&mut d, "ax");
        let context = action_context(&effects).unwrap();
        assert_eq!(context.args, vec!["--all"]);
        assert_eq!(context.popup, "demo");
        assert!(matches!(
            effects.iter().find(|e| matches!(e, Effect::RunAction { .. })),
            Some(Effect::RunAction { handler: ActionHandler::Command(argv), .. }) if argv == &["handler"]
        ));
        assert!(!d.is_open());
        assert_eq!(d.last_invocation(), Some(context));
    }

    #[test]
    fn action_alone_passes_nothing() {
        let mut d = open(&def());
        let effects = press(&mut d, "x");
        assert!(action_context(&effects).unwrap().args.is_empty());
    }

    #[test]
    fn close_comes_before_the_action() {
        let mut d = open(&def());
        let effects = press(&mut d, "x");
        let close = effects.iter().position(|e| *e == Effect::Close).unwrap();
        let run = effects.iter().position(|e| matches!(e, Effect::RunAction { .. })).unwrap();
        assert!(close < run);
    }

    #[test]
    fn saved_defaults_survive_reopen() {
        let def = def();
        let mut store = MemoryStore::new();
        let mut d = open(&def);
        press(&mut d, "a");
        let effects = d.process_key(Chord::Ctrl('s')).unwrap();
        let (variable, value, durability) = persisted(&effects).unwrap();
        assert_eq!(variable, "demo-arguments");
        assert_eq!(durability, Durability::Durable);
        store.write(variable, value.clone(), durability).unwrap();
        assert_eq!(effects.last(), Some(&Effect::Close));

        d.open(&def, store.read(&def.variable).as_ref());
        let session = d.session().unwrap();
        assert!(session.event(EventClass::Switches, &Chord::Char('a')).unwrap().is_enabled());
    }

    // --- persist ---

    #[test]
    fn set_without_prefix_closes() {
        let mut d = open(&def());
        let effects = d.process_key(Chord::Ctrl('c')).unwrap();
        assert_eq!(persisted(&effects).unwrap().2, Durability::Transient);
        assert!(!d.is_open());
    }

    #[test]
    fn prefix_keeps_popup_open_after_set() {
        let mut d = open(&def());
        d.process_key(Chord::Ctrl('u')).unwrap();
        let effects = d.process_key(Chord::Ctrl('c')).unwrap();
        assert!(persisted(&effects).is_some());
        assert!(effects.contains(&Effect::Message("Arguments set".into())));
        assert!(d.is_open());

        // The prefix was consumed.
        d.process_key(Chord::Ctrl('c')).unwrap();
        assert!(!d.is_open());
    }

    #[test]
    fn structured_popups_persist_structured_values() {
        let mut def = def();
        def.serialization = SerializationMode::Structured;
        let mut d = open(&def);
        press(&mut d, "a");
        let effects = d.process_key(Chord::Ctrl('s')).unwrap();
        assert!(matches!(persisted(&effects).unwrap().1, PersistedValue::Structured(_)));
    }

    #[test]
    fn prefix_reaches_the_action() {
        let mut d = open(&def());
        d.process_key(Chord::Ctrl('u')).unwrap();
        d.process_key(Chord::Ctrl('u')).unwrap();
        let effects = press(&mut d, "x");
        assert_eq!(action_context(&effects).unwrap().prefix, Some(PrefixArg(16)));
    }

    // --- options ---

    #[test]
    fn option_reads_value_then_toggles_off_keeping_it() {
        let mut d = open(&option_def());
        let effects = press(&mut d, "m");
        assert_eq!(
            effects,
            vec![Effect::ReadValue {
                prompt: "--message= ".into(),
                initial: None
            }]
        );
        assert!(d.is_awaiting_input());

        d.option_input(Some("wip".into())).unwrap();
        assert_eq!(d.session().unwrap().flat_args(), vec!["--message=wip"]);

        press(&mut d, "m");
        assert!(d.session().unwrap().flat_args().is_empty());

        let effects = press(&mut d, "m");
        assert!(matches!(&effects[0], Effect::ReadValue { initial: Some(v), .. } if v == "wip"));
    }

    #[test]
    fn empty_answer_leaves_option_disabled() {
        let mut d = open(&option_def());
        press(&mut d, "m");
        d.option_input(Some("   ".into())).unwrap();
        assert!(!d.is_awaiting_input());
        assert!(d.session().unwrap().flat_args().is_empty());
    }

    #[test]
    fn text_answer_keeps_its_spaces() {
        let mut d = open(&option_def());
        press(&mut d, "m");
        d.option_input(Some("  wip  ".into())).unwrap();
        assert_eq!(d.session().unwrap().flat_args(), vec!["--message=  wip  "]);
    }

    #[test]
    fn cancelled_read_changes_nothing() {
        let mut d = open(&option_def());
        press(&mut d, "m");
        assert_eq!(d.option_input(None).unwrap(), vec![Effect::Render]);
        assert!(d.is_open());
        assert!(d.session().unwrap().flat_args().is_empty());
    }

    #[test]
    fn rejected_value_is_reported() {
        let mut d = open(&option_def());
        press(&mut d, "n");
        let err = d.option_input(Some("many".into())).unwrap_err();
        assert!(matches!(err, PopupError::InvalidValue { ref flag, .. } if flag == "-n"));
        assert!(err.is_recoverable());
        assert!(d.is_open());
        assert!(!d.is_awaiting_input());
        assert!(d.session().unwrap().flat_args().is_empty());
    }

    #[test]
    fn keys_during_input_are_refused() {
        let mut d = open(&option_def());
        press(&mut d, "m");
        assert_eq!(
            d.process_key(Chord::Char('g')).unwrap_err(),
            PopupError::InputPending(Chord::Char('g'))
        );
        assert!(d.is_awaiting_input());
    }

    #[test]
    fn quit_wins_over_pending_input() {
        let mut d = open(&option_def());
        press(&mut d, "m");
        assert_eq!(d.process_key(Chord::Esc).unwrap(), vec![Effect::Close]);
        assert!(!d.is_open());
        assert!(d.session().is_none());
    }

    // --- quit and errors ---

    #[test]
    fn q_quits_when_unclaimed() {
        let mut d = open(&def());
        assert_eq!(press(&mut d, "q"), vec![Effect::Close]);
        assert!(!d.is_open());
    }

    #[test]
    fn unbound_key_keeps_session() {
        let mut d = open(&def());
        let err = d.process_key(Chord::Char('z')).unwrap_err();
        assert_eq!(err, PopupError::UnboundKey(Chord::Char('z')));
        assert!(d.is_open());
    }

    #[test]
    fn meta_chord_does_not_run_the_plain_action() {
        let mut d = open(&def());
        let err = d.process_key(Chord::Meta('x')).unwrap_err();
        assert_eq!(err, PopupError::UnboundKey(Chord::Meta('x')));
        assert!(err.is_recoverable());
        assert!(d.is_open());
        assert!(d.last_invocation().is_none());
    }

    #[test]
    fn extended_keys_are_reported_unbound() {
        let mut d = open(&def());
        for chord in [Chord::Backspace, Chord::F(1), Chord::PageUp, Chord::Meta('q')] {
            assert_eq!(d.process_key(chord).unwrap_err(), PopupError::UnboundKey(chord));
        }
        assert!(d.is_open());
    }

    #[test]
    fn keys_without_popup_fail() {
        let mut d = Dispatcher::new(true);
        assert_eq!(d.process_key(Chord::Char('a')).unwrap_err(), PopupError::NotOpen);
        assert_eq!(d.option_input(Some("x".into())).unwrap_err(), PopupError::NotOpen);
    }

    // --- help ---

    #[test]
    fn help_describes_next_chord() {
        let mut d = open(&option_def());
        press(&mut d, "?");
        let effects = press(&mut d, "n");
        assert!(matches!(
            &effects[0],
            Effect::Describe(HelpTarget::Argument { flag, .. }) if flag == "-n"
        ));
        // Nothing was toggled and the popup is back to normal.
        assert!(d.session().unwrap().flat_args().is_empty());
        assert!(matches!(press(&mut d, "n")[0], Effect::ReadValue { .. }));
    }

    #[test]
    fn help_on_builtin_does_not_run_it() {
        let mut d = open(&def());
        press(&mut d, "?");
        let effects = d.process_key(Chord::Ctrl('g')).unwrap();
        assert_eq!(
            effects[0],
            Effect::Describe(HelpTarget::Command(Chord::Ctrl('g'), Command::Quit))
        );
        assert!(d.is_open());
    }

    #[test]
    fn help_on_unbound_chord_is_signalled() {
        let mut d = open(&def());
        press(&mut d, "?");
        assert_eq!(
            d.process_key(Chord::Char('z')).unwrap_err(),
            PopupError::HelpUnresolved(Chord::Char('z'))
        );
        assert!(d.is_open());
        assert_eq!(press(&mut d, "a"), vec![Effect::Render]);
    }

    // --- focus and display ---

    #[test]
    fn focus_starts_on_first_action_and_wraps() {
        let mut d = open(&def());
        d.process_key(Chord::Tab).unwrap();
        let effects = d.process_key(Chord::Enter).unwrap();
        assert_eq!(effects, vec![Effect::Render]);
        assert_eq!(d.session().unwrap().flat_args(), vec!["--all"]);

        d.process_key(Chord::BackTab).unwrap();
        let effects = d.process_key(Chord::Enter).unwrap();
        assert_eq!(action_context(&effects).unwrap().args, vec!["--all"]);
    }

    #[test]
    fn frame_tracks_focus() {
        let mut d = open(&def());
        let opts = LayoutOptions::default();
        let focused = d.frame(&opts).unwrap().focused().unwrap();
        assert_eq!(focused.key, Chord::Char('x'));

        d.process_key(Chord::Down).unwrap();
        press(&mut d, "a");
        let focused = d.frame(&opts).unwrap().focused().unwrap();
        assert_eq!(focused.class, EventClass::Switches);
    }

    #[test]
    fn help_section_toggle_outlives_session() {
        let def = def();
        let mut d = open(&def);
        let opts = LayoutOptions::default();
        assert!(d.frame(&opts).unwrap().plain_text().contains("Common Commands"));

        d.process_key(Chord::Ctrl('t')).unwrap();
        assert!(!d.frame(&opts).unwrap().plain_text().contains("Common Commands"));

        d.quit();
        assert!(d.frame(&opts).is_none());
        d.open(&def, None);
        assert!(!d.show_help_section());
        assert!(!d.frame(&opts).unwrap().plain_text().contains("Common Commands"));
    }
}
