//! Mutation types
//!
//! This module defines the color mutations the palette accepts, the errors they
//! can raise, and the outcome reported when they succeed.

use storage::{Color, KvError};
use thiserror::Error;

/// Mutation errors
#[derive(Debug, Error)]
pub enum MutationError {
    /// The targeted theme is protected from modification
    #[error("Theme {0} is protected and cannot be modified")]
    Forbidden(String),

    /// No theme with this id exists
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),

    /// A different color already uses this id
    #[error("Color id already in use: {0}")]
    DuplicateColor(String),

    /// A theme with this id already exists
    #[error("Theme id already in use: {0}")]
    DuplicateTheme(String),

    /// Persisting the mutation failed; nothing was committed
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),
}

/// Result type for mutation operations
pub type Result<T> = std::result::Result<T, MutationError>;

/// What a successful mutation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Both collections now reflect the mutation
    Applied,

    /// The target did not exist; nothing changed
    Unchanged,
}

impl MutationOutcome {
    /// Check whether the mutation changed state
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// A color mutation against the selected theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorMutation {
    /// Prepend a color to the collection and to the selected theme
    Add(Color),

    /// Remove a color and every reference to it
    Delete {
        /// Id of the color to remove
        color_id: String,
    },

    /// Replace a color by id, possibly under a new id
    Update {
        /// Id of the color being replaced
        color_id: String,
        /// Replacement record
        color: Color,
    },
}

impl ColorMutation {
    /// Build a delete mutation
    pub fn delete(color_id: impl Into<String>) -> Self {
        ColorMutation::Delete { color_id: color_id.into() }
    }

    /// Build an update mutation
    pub fn update(color_id: impl Into<String>, color: Color) -> Self {
        ColorMutation::Update { color_id: color_id.into(), color }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ColorMutation::Add(_) => "add_color",
            ColorMutation::Delete { .. } => "delete_color",
            ColorMutation::Update { .. } => "update_color",
        }
    }

    /// Id of the color the mutation targets
    pub fn color_id(&self) -> &str {
        match self {
            ColorMutation::Add(color) => &color.id,
            ColorMutation::Delete { color_id } | ColorMutation::Update { color_id, .. } => color_id,
        }
    }
}
