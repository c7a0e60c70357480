use crate::chord::Chord;
use thiserror::Error;

/// Errors raised by popup definitions, sessions and dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PopupError {
    /// Malformed popup configuration. Fatal at definition time.
    #[error("invalid popup definition: {0}")]
    InvalidDefinition(String),

    #[error("no popup named '{0}'")]
    UnknownPopup(String),

    /// A pressed chord matches nothing in the open popup.
    #[error("{0} isn't bound to anything in this popup")]
    UnboundKey(Chord),

    #[error("{0}")]
    PolicyMisuse(String),

    #[error("{0} isn't bound, nothing to describe")]
    HelpUnresolved(Chord),

    /// The option's reader rejected the entered value.
    #[error("invalid value for {flag}: {reason}")]
    InvalidValue { flag: String, reason: String },

    #[error("waiting for a value, {0} ignored")]
    InputPending(Chord),

    #[error("no popup is open")]
    NotOpen,
}

impl PopupError {
    /// Whether the open session survives this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnboundKey(_)
                | Self::HelpUnresolved(_)
                | Self::InvalidValue { .. }
                | Self::InputPending(_)
        )
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }
}
