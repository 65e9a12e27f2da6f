//! Palette state
//!
//! This module holds the theme and color collections together with the
//! current selection, and keeps the two collections consistent under color
//! mutations. All reads of "what to display" go through [`PaletteState::colors_to_show`],
//! which resolves the selected theme's id list on every call.
//!
//! # Protected theme
//!
//! One theme id can be marked protected. While it is selected, color
//! mutations fail with [`MutationError::Forbidden`] and leave both
//! collections untouched; the theme itself cannot be renamed or deleted.

use storage::{Color, PaletteSnapshot, Theme, DEFAULT_THEME_ID};

use crate::mutation::{ColorMutation, MutationError, MutationOutcome, Result};

/// Theme and color collections plus the active selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteState {
    themes: Vec<Theme>,
    colors: Vec<Color>,
    selected: String,
    protected_theme_id: Option<String>,
}

impl PaletteState {
    /// Build state from persisted collections
    ///
    /// Selects the protected theme if present, otherwise the bundled default
    /// theme, otherwise the first theme. An empty theme collection gets a fresh
    /// empty default theme so the selection always resolves.
    pub fn new(snapshot: PaletteSnapshot, protected_theme_id: Option<String>) -> Self {
        let PaletteSnapshot { mut themes, colors } = snapshot;

        if themes.is_empty() {
            let id = protected_theme_id.as_deref().unwrap_or(DEFAULT_THEME_ID);
            tracing::warn!("No themes stored, inserting empty theme {}", id);
            themes.push(Theme::with_id(id, "Default Theme"));
        }

        let selected = initial_selection(&themes, protected_theme_id.as_deref());
        let state = Self { themes, colors, selected, protected_theme_id };

        let dangling: usize = state
            .themes
            .iter()
            .map(|theme| theme.colors.iter().filter(|id| state.color(id).is_none()).count())
            .sum();
        if dangling > 0 {
            tracing::warn!("Loaded palette has {} dangling color references", dangling);
        }

        state
    }

    /// All themes, in display order
    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// All colors, newest first
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Look up a theme by id
    pub fn theme(&self, theme_id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == theme_id)
    }

    /// Look up a color by id
    pub fn color(&self, color_id: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.id == color_id)
    }

    /// Id of the selected theme
    pub fn selected_theme_id(&self) -> &str {
        &self.selected
    }

    /// The selected theme
    pub fn selected_theme(&self) -> Option<&Theme> {
        self.theme(&self.selected)
    }

    /// Id of the protected theme, if any
    pub fn protected_theme_id(&self) -> Option<&str> {
        self.protected_theme_id.as_deref()
    }

    /// Check whether a theme is protected from modification
    pub fn is_protected(&self, theme_id: &str) -> bool {
        self.protected_theme_id.as_deref() == Some(theme_id)
    }

    /// Check whether color mutations are currently allowed
    ///
    /// UIs use this to decide whether to offer edit and delete affordances.
    pub fn can_edit_selected(&self) -> bool {
        !self.is_protected(&self.selected)
    }

    /// Colors of the selected theme, in theme order
    ///
    /// Ids that do not resolve to a stored color are skipped.
    pub fn colors_to_show(&self) -> Vec<&Color> {
        self.selected_theme()
            .map(|theme| theme.colors.iter().filter_map(|id| self.color(id)).collect())
            .unwrap_or_default()
    }

    /// Ids in the selected theme that do not resolve to a stored color
    pub fn dangling_color_ids(&self) -> Vec<&str> {
        self.selected_theme()
            .map(|theme| {
                theme
                    .colors
                    .iter()
                    .filter(|id| self.color(id).is_none())
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Make another theme the active one
    pub fn select_theme(&mut self, theme_id: &str) -> Result<()> {
        if self.theme(theme_id).is_none() {
            return Err(MutationError::ThemeNotFound(theme_id.to_string()));
        }
        self.selected = theme_id.to_string();
        Ok(())
    }

    /// Apply a color mutation to the selected theme
    pub fn apply(&mut self, mutation: ColorMutation) -> Result<MutationOutcome> {
        match mutation {
            ColorMutation::Add(color) => self.add_color(color),
            ColorMutation::Delete { color_id } => self.delete_color(&color_id),
            ColorMutation::Update { color_id, color } => self.update_color(&color_id, color),
        }
    }

    /// Prepend a color to the collection and to the selected theme
    pub fn add_color(&mut self, color: Color) -> Result<MutationOutcome> {
        let index = self.editable_selection()?;
        if self.color(&color.id).is_some() {
            return Err(MutationError::DuplicateColor(color.id));
        }

        self.themes[index].colors.insert(0, color.id.clone());
        self.colors.insert(0, color);
        Ok(MutationOutcome::Applied)
    }

    /// Remove a color from the collection and from every theme
    ///
    /// Returns [`MutationOutcome::Unchanged`] when the id is neither stored
    /// nor referenced.
    pub fn delete_color(&mut self, color_id: &str) -> Result<MutationOutcome> {
        self.editable_selection()?;

        let before = self.colors.len();
        self.colors.retain(|c| c.id != color_id);
        let mut changed = self.colors.len() != before;

        for theme in &mut self.themes {
            let before = theme.colors.len();
            theme.colors.retain(|id| id != color_id);
            changed |= theme.colors.len() != before;
        }

        Ok(if changed { MutationOutcome::Applied } else { MutationOutcome::Unchanged })
    }

    /// Replace a color by id
    ///
    /// When the replacement carries a new id, every theme reference to the
    /// old id is rewritten in place, keeping list order and length.
    pub fn update_color(&mut self, color_id: &str, color: Color) -> Result<MutationOutcome> {
        self.editable_selection()?;

        let Some(position) = self.colors.iter().position(|c| c.id == color_id) else {
            return Ok(MutationOutcome::Unchanged);
        };

        if color.id != color_id {
            if self.color(&color.id).is_some() {
                return Err(MutationError::DuplicateColor(color.id));
            }
            for theme in &mut self.themes {
                for id in theme.colors.iter_mut().filter(|id| id.as_str() == color_id) {
                    *id = color.id.clone();
                }
            }
        }

        self.colors[position] = color;
        Ok(MutationOutcome::Applied)
    }

    /// Append a theme
    pub fn add_theme(&mut self, theme: Theme) -> Result<MutationOutcome> {
        if self.theme(&theme.id).is_some() {
            return Err(MutationError::DuplicateTheme(theme.id));
        }
        self.themes.push(theme);
        Ok(MutationOutcome::Applied)
    }

    /// Rename a theme
    pub fn rename_theme(&mut self, theme_id: &str, name: &str) -> Result<MutationOutcome> {
        if self.is_protected(theme_id) {
            return Err(MutationError::Forbidden(theme_id.to_string()));
        }
        let theme = self
            .themes
            .iter_mut()
            .find(|t| t.id == theme_id)
            .ok_or_else(|| MutationError::ThemeNotFound(theme_id.to_string()))?;

        if theme.name == name {
            return Ok(MutationOutcome::Unchanged);
        }
        theme.name = name.to_string();
        Ok(MutationOutcome::Applied)
    }

    /// Delete a theme
    ///
    /// The colors it referenced stay in the color collection. Deleting the
    /// selected theme moves the selection back to the default. The last
    /// remaining theme cannot be deleted.
    pub fn delete_theme(&mut self, theme_id: &str) -> Result<MutationOutcome> {
        if self.is_protected(theme_id) {
            return Err(MutationError::Forbidden(theme_id.to_string()));
        }
        let Some(position) = self.themes.iter().position(|t| t.id == theme_id) else {
            return Ok(MutationOutcome::Unchanged);
        };
        if self.themes.len() == 1 {
            return Err(MutationError::Forbidden(theme_id.to_string()));
        }

        self.themes.remove(position);
        if self.selected == theme_id {
            self.selected = initial_selection(&self.themes, self.protected_theme_id.as_deref());
        }
        Ok(MutationOutcome::Applied)
    }

    /// Copy of both collections in their persisted shape
    pub fn snapshot(&self) -> PaletteSnapshot {
        PaletteSnapshot { themes: self.themes.clone(), colors: self.colors.clone() }
    }

    /// Index of the selected theme, if color mutations may touch it
    fn editable_selection(&self) -> Result<usize> {
        if self.is_protected(&self.selected) {
            return Err(MutationError::Forbidden(self.selected.clone()));
        }
        self.themes
            .iter()
            .position(|t| t.id == self.selected)
            .ok_or_else(|| MutationError::ThemeNotFound(self.selected.clone()))
    }
}

fn initial_selection(themes: &[Theme], protected_theme_id: Option<&str>) -> String {
    [protected_theme_id, Some(DEFAULT_THEME_ID)]
        .into_iter()
        .flatten()
        .find(|id| themes.iter().any(|t| t.id == *id))
        .map(str::to_string)
        .or_else(|| themes.first().map(|t| t.id.clone()))
        .unwrap_or_else(|| DEFAULT_THEME_ID.to_string())
}
