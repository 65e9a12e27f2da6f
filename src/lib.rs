//! Theme Creator
//!
//! Build named color themes: add, edit and delete colors in the selected
//! theme, keep everything persisted in a local key-value store, and copy color
//! values to the clipboard with a short-lived confirmation.
//!
//! [`ThemeCreator`] wires the pieces together from one [`AppConfig`]:
//!
//! ```no_run
//! use theme_creator::{AppConfig, ThemeCreator};
//! use theme_creator::app_state::MemoryClipboard;
//! use theme_creator::storage::Color;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = ThemeCreator::open(AppConfig::new("themes.db"), MemoryClipboard::new()).unwrap();
//!
//!     app.store().select_theme("t2").unwrap();
//!     let color = Color::new("#ff8800").named("Orange");
//!     app.store().add_color(color.clone()).unwrap();
//!
//!     app.copy_color(&color.id).await.unwrap();
//!     assert!(app.feedback().is_copied());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Arc;

pub use app_state;
pub use storage;

use app_state::{
    Clipboard, ClipboardError, CopyFeedback, FeedbackConfig, MutationError, ThemeStore,
    ThemeStoreConfig,
};
use storage::{KvConfig, KvStore};

/// Top-level configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Key-value store settings
    pub kv: KvConfig,
    /// Theme store settings
    pub store: ThemeStoreConfig,
    /// Copy confirmation settings
    pub feedback: FeedbackConfig,
}

impl AppConfig {
    /// Create a configuration storing data at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self { kv: KvConfig::new(path), ..Default::default() }
    }

    /// Replace the theme store settings
    pub fn store(mut self, store: ThemeStoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Replace the copy confirmation settings
    pub fn feedback(mut self, feedback: FeedbackConfig) -> Self {
        self.feedback = feedback;
        self
    }
}

/// Theme store plus clipboard feedback
pub struct ThemeCreator<C> {
    store: ThemeStore,
    feedback: CopyFeedback<C>,
}

impl<C: Clipboard> ThemeCreator<C> {
    /// Open the on-disk store described by `config`
    pub fn open(config: AppConfig, clipboard: C) -> Result<Self, MutationError> {
        let kv = Arc::new(KvStore::new(config.kv.clone())?);
        Self::with_store(kv, config, clipboard)
    }

    /// Build on an already opened key-value store
    pub fn with_store(
        kv: Arc<KvStore>,
        config: AppConfig,
        clipboard: C,
    ) -> Result<Self, MutationError> {
        let store = ThemeStore::open(kv, config.store)?;
        let feedback = CopyFeedback::with_config(clipboard, config.feedback);
        Ok(Self { store, feedback })
    }

    /// The theme store
    pub fn store(&self) -> &ThemeStore {
        &self.store
    }

    /// The copy confirmation
    pub fn feedback(&self) -> &CopyFeedback<C> {
        &self.feedback
    }

    /// Copy the value of a color shown in the selected theme
    ///
    /// Returns `Ok(false)` when the selected theme does not show that color.
    pub async fn copy_color(&self, color_id: &str) -> Result<bool, ClipboardError> {
        let value = self.store.read(|state| {
            state
                .colors_to_show()
                .into_iter()
                .find(|c| c.id == color_id)
                .map(|c| c.value.clone())
        });

        match value {
            Some(value) => {
                self.feedback.copy(&value).await?;
                Ok(true)
            }
            None => {
                tracing::debug!("Color {} is not shown, nothing to copy", color_id);
                Ok(false)
            }
        }
    }

    /// Save and flush the store, cancelling any pending confirmation expiry
    pub fn close(self) -> Result<(), MutationError> {
        self.store.save()
    }
}
