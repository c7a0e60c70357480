use gitpop_core::chord::{Chord, Command, BUILTIN_BINDINGS, QUIT_CHAR};
use gitpop_core::{EventClass, Session};
use std::collections::HashMap;

/// What pressing a chord does in the open popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    ToggleSwitch(usize),
    SetOption(usize),
    RunAction(usize),
    Builtin(Command),
}

/// Key-binding overlay for one session, built once when it opens.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<Chord, TransitionKind>,
}

impl Keymap {
    pub fn for_session(session: &Session) -> Self {
        let mut bindings: HashMap<Chord, TransitionKind> = BUILTIN_BINDINGS
            .iter()
            .map(|(chord, command)| (*chord, TransitionKind::Builtin(*command)))
            .collect();

        for class in EventClass::ALL {
            for (idx, event) in session.events(class).iter().enumerate() {
                let kind = match class {
                    EventClass::Switches => TransitionKind::ToggleSwitch(idx),
                    EventClass::Options => TransitionKind::SetOption(idx),
                    EventClass::Actions => TransitionKind::RunAction(idx),
                };
                bindings.insert(event.key, kind);
            }
        }

        // `q` quits only while nothing in the popup claims it.
        bindings
            .entry(Chord::Char(QUIT_CHAR))
            .or_insert(TransitionKind::Builtin(Command::Quit));

        Self { bindings }
    }

    pub fn resolve(&self, chord: &Chord) -> Option<TransitionKind> {
        self.bindings.get(chord).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

/// Whether `chord` quits through a reserved binding, which stays live even
/// while a value is being read.
pub fn is_reserved_quit(chord: &Chord) -> bool {
    BUILTIN_BINDINGS
        .iter()
        .any(|(c, command)| c == chord && *command == Command::Quit)
}
