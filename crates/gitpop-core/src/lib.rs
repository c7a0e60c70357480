//! Declarative argument popups for git.
//!
//! A popup definition lists switches, options and actions bound to keys.
//! Opening it materializes a [`session::Session`] from the popup's persisted
//! arguments; the front-end mutates that session key by key, re-renders it
//! with [`layout::render`] and finally hands the active arguments to an
//! action.

pub mod args;
pub mod builtin;
pub mod chord;
pub mod config;
pub mod definition;
pub mod error;
pub mod help;
pub mod layout;
pub mod policy;
pub mod registry;
pub mod session;
pub mod store;

pub use chord::Chord;
pub use definition::{EventClass, PopupDefinition, PopupSpec};
pub use error::PopupError;
pub use session::Session;
