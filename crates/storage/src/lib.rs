//! Storage layer for Theme Creator
//!
//! This crate provides the key-value store backing the application and the
//! persisted schema of the `themes` and `colors` collections.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;
pub mod palette;

pub use kv::{KvConfig, KvError, KvStore, Result};
pub use palette::{
    default_colors, default_themes, parse_hex_color, Color, PaletteRepository, PaletteSnapshot,
    Theme, COLORS_KEY, DEFAULT_THEME_ID, THEMES_KEY,
};
