//! Application state for Theme Creator
//!
//! This crate keeps the theme and color collections consistent under color
//! mutations, persists them through the storage crate, and tracks the
//! clipboard copy confirmation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod feedback;
pub mod mutation;
pub mod palette;
pub mod store;

pub use feedback::{
    Clipboard, ClipboardError, CopyFeedback, CopyState, FeedbackConfig, MemoryClipboard,
};
pub use mutation::{ColorMutation, MutationError, MutationOutcome};
pub use palette::PaletteState;
pub use store::{PaletteBackend, PaletteEvent, ThemeStore, ThemeStoreConfig};
