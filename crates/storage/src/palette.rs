//! Persisted palette schema
//!
//! This module defines the record shapes stored under the `themes` and
//! `colors` keys, the bundled default dataset used on first run, and the
//! repository that loads and saves both collections.
//!
//! # Layout
//!
//! Both keys hold a JSON array and are independent of each other:
//!
//! ```text
//! colors: [{"id": "c1", "value": "#1e3a5f", "name": "Navy"}, ...]
//! themes: [{"id": "t1", "name": "Default Theme", "colors": ["c1", ...]}, ...]
//! ```
//!
//! There is no schema version; records that no longer match these shapes
//! surface as [`crate::kv::KvError::Serialization`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::kv::{KvStore, Result};

/// Key holding the theme collection
pub const THEMES_KEY: &str = "themes";

/// Key holding the color collection
pub const COLORS_KEY: &str = "colors";

/// Id of the bundled default theme
pub const DEFAULT_THEME_ID: &str = "t1";

/// A single stored color
///
/// Colors are replaced whole on update; there is no field-level editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Unique color id
    pub id: String,
    /// Color encoding, usually a hex string such as `#ff8800`
    pub value: String,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Color {
    /// Create a color with a freshly generated id
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), value)
    }

    /// Create a color with an explicit id
    pub fn with_id(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self { id: id.into(), value: value.into(), name: None }
    }

    /// Attach a display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse the value as a hex color into RGB components
    ///
    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (alpha is ignored). Other
    /// encodings are valid color values but return `None` here.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        parse_hex_color(&self.value)
    }
}

/// Parse a hex color string to RGB components
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some((channel(0)?, channel(1)?, channel(2)?))
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// A named palette referencing colors by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Unique theme id
    pub id: String,
    /// Display name
    pub name: String,
    /// Ordered color ids
    #[serde(default)]
    pub colors: Vec<String>,
}

impl Theme {
    /// Create an empty theme with a freshly generated id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name)
    }

    /// Create an empty theme with an explicit id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), colors: Vec::new() }
    }

    /// Set the color id list
    pub fn with_colors<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether the theme references a color id
    pub fn references(&self, color_id: &str) -> bool {
        self.colors.iter().any(|id| id == color_id)
    }
}

/// Both persisted collections, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSnapshot {
    /// Theme collection
    pub themes: Vec<Theme>,
    /// Color collection
    pub colors: Vec<Color>,
}

impl Default for PaletteSnapshot {
    fn default() -> Self {
        Self { themes: default_themes(), colors: default_colors() }
    }
}

/// Colors bundled with a fresh installation
pub fn default_colors() -> Vec<Color> {
    vec![
        Color::with_id("c1", "#1e3a5f").named("Primary"),
        Color::with_id("c2", "#6b46c1").named("Secondary"),
        Color::with_id("c3", "#f8fafc").named("Surface"),
        Color::with_id("c4", "#0f172a").named("On Surface"),
        Color::with_id("c5", "#16a34a").named("Positive"),
        Color::with_id("c6", "#dc2626").named("Negative"),
    ]
}

/// Themes bundled with a fresh installation
pub fn default_themes() -> Vec<Theme> {
    vec![
        Theme::with_id(DEFAULT_THEME_ID, "Default Theme")
            .with_colors(["c1", "c2", "c3", "c4", "c5", "c6"]),
        Theme::with_id("t2", "2nd Theme").with_colors(["c1", "c3"]),
        Theme::with_id("t3", "3rd Theme"),
    ]
}

/// Loads and saves the `themes` and `colors` collections
#[derive(Debug, Clone)]
pub struct PaletteRepository {
    kv: Arc<KvStore>,
}

impl PaletteRepository {
    /// Create a repository over a key-value store
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }

    /// Load both collections, seeding any missing key with the bundled default
    ///
    /// Each key is checked independently, so a store holding only `colors`
    /// keeps those colors and receives the default themes.
    pub fn load_or_seed(&self) -> Result<PaletteSnapshot> {
        let themes = match self.kv.get::<Vec<Theme>>(THEMES_KEY)? {
            Some(themes) => themes,
            None => {
                let themes = default_themes();
                self.kv.set(THEMES_KEY, &themes)?;
                tracing::info!("Seeded {} with {} default themes", THEMES_KEY, themes.len());
                themes
            }
        };

        let colors = match self.kv.get::<Vec<Color>>(COLORS_KEY)? {
            Some(colors) => colors,
            None => {
                let colors = default_colors();
                self.kv.set(COLORS_KEY, &colors)?;
                tracing::info!("Seeded {} with {} default colors", COLORS_KEY, colors.len());
                colors
            }
        };

        Ok(PaletteSnapshot { themes, colors })
    }

    /// Load both collections without seeding
    ///
    /// Returns `None` for a key that has never been written.
    pub fn load(&self) -> Result<(Option<Vec<Theme>>, Option<Vec<Color>>)> {
        Ok((self.kv.get(THEMES_KEY)?, self.kv.get(COLORS_KEY)?))
    }

    /// Save both collections in one batch
    pub fn save(&self, snapshot: &PaletteSnapshot) -> Result<()> {
        self.kv.set_batch(&[
            (THEMES_KEY, serde_json::to_value(&snapshot.themes)?),
            (COLORS_KEY, serde_json::to_value(&snapshot.colors)?),
        ])?;
        tracing::debug!(
            "Saved {} themes and {} colors",
            snapshot.themes.len(),
            snapshot.colors.len()
        );
        Ok(())
    }

    /// Remove both collections; the next load seeds defaults again
    pub fn clear(&self) -> Result<()> {
        self.kv.remove(THEMES_KEY)?;
        self.kv.remove(COLORS_KEY)?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.kv.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvError;

    fn repository() -> PaletteRepository {
        PaletteRepository::new(Arc::new(KvStore::in_memory().unwrap()))
    }

    #[test]
    fn test_color_serialization_shape() {
        let color = Color::with_id("c1", "#fff");
        let json = serde_json::to_value(&color).unwrap();
        assert_eq!(json, serde_json::json!({"id": "c1", "value": "#fff"}));

        let named = color.named("White");
        let json = serde_json::to_value(&named).unwrap();
        assert_eq!(json, serde_json::json!({"id": "c1", "value": "#fff", "name": "White"}));
    }

    #[test]
    fn test_theme_deserializes_without_colors() {
        let theme: Theme = serde_json::from_str(r#"{"id": "t9", "name": "Bare"}"#).unwrap();
        assert_eq!(theme, Theme::with_id("t9", "Bare"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Color::new("#000000");
        let b = Color::new("#000000");
        assert_ne!(a.id, b.id);
        assert_ne!(Theme::new("A").id, Theme::new("A").id);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#1e3a5f"), Some((30, 58, 95)));
        assert_eq!(parse_hex_color("1E3A5F80"), Some((30, 58, 95)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("rgb(0, 0, 0)"), None);
        assert_eq!(parse_hex_color("#ggg"), None);
        assert_eq!(parse_hex_color("#+1+2+3"), None);
        assert_eq!(parse_hex_color("#+f+f+f+"), None);
        assert_eq!(Color::with_id("x", "#000").rgb(), Some((0, 0, 0)));
    }

    #[test]
    fn test_default_dataset_is_consistent() {
        let snapshot = PaletteSnapshot::default();
        assert_eq!(snapshot.themes[0].id, DEFAULT_THEME_ID);

        for theme in &snapshot.themes {
            for id in &theme.colors {
                assert!(snapshot.colors.iter().any(|c| &c.id == id), "dangling {}", id);
            }
        }
    }

    #[test]
    fn test_load_or_seed_first_run() {
        let repo = repository();

        let snapshot = repo.load_or_seed().unwrap();
        assert_eq!(snapshot, PaletteSnapshot::default());

        let (themes, colors) = repo.load().unwrap();
        assert_eq!(themes, Some(default_themes()));
        assert_eq!(colors, Some(default_colors()));
    }

    #[test]
    fn test_load_or_seed_keeps_existing_keys() {
        let kv = Arc::new(KvStore::in_memory().unwrap());
        let stored = vec![Color::with_id("mine", "#abcdef")];
        kv.set(COLORS_KEY, &stored).unwrap();

        let repo = PaletteRepository::new(kv);
        let snapshot = repo.load_or_seed().unwrap();

        assert_eq!(snapshot.colors, stored);
        assert_eq!(snapshot.themes, default_themes());
    }

    #[test]
    fn test_save_and_reload() {
        let repo = repository();
        let snapshot = PaletteSnapshot {
            themes: vec![Theme::with_id("t2", "Mine").with_colors(["c1"])],
            colors: vec![Color::with_id("c1", "#fff")],
        };

        repo.save(&snapshot).unwrap();
        assert_eq!(repo.load_or_seed().unwrap(), snapshot);
    }

    #[test]
    fn test_save_empty_collections_is_not_reseeded() {
        let repo = repository();
        let empty = PaletteSnapshot { themes: Vec::new(), colors: Vec::new() };

        repo.save(&empty).unwrap();
        assert_eq!(repo.load_or_seed().unwrap(), empty);
    }

    #[test]
    fn test_clear_reseeds() {
        let repo = repository();
        repo.save(&PaletteSnapshot { themes: Vec::new(), colors: Vec::new() })
            .unwrap();

        repo.clear().unwrap();
        assert_eq!(repo.load().unwrap(), (None, None));
        assert_eq!(repo.load_or_seed().unwrap(), PaletteSnapshot::default());
    }

    #[test]
    fn test_malformed_record_is_reported() {
        let kv = Arc::new(KvStore::in_memory().unwrap());
        kv.set(THEMES_KEY, &serde_json::json!([{"title": "no id"}]))
            .unwrap();

        let repo = PaletteRepository::new(kv);
        assert!(matches!(repo.load_or_seed(), Err(KvError::Serialization(_))));
    }
}
