//! Persisting theme store
//!
//! [`ThemeStore`] owns the palette state and writes it back to the key-value
//! store after every change. Mutations run on a working copy that is saved
//! before it replaces the live state, so a failed save leaves both memory and
//! storage as they were.
//!
//! Renderers subscribe to the revision counter and re-read the store on every
//! change; nothing derived is cached here.

use parking_lot::RwLock;
use std::sync::Arc;
use storage::{Color, KvStore, PaletteRepository, PaletteSnapshot, Theme, DEFAULT_THEME_ID};
use tokio::sync::{broadcast, watch};

use crate::mutation::{ColorMutation, MutationError, MutationOutcome, Result};
use crate::palette::PaletteState;

/// Theme store configuration
#[derive(Debug, Clone)]
pub struct ThemeStoreConfig {
    /// Theme that color mutations may not touch
    pub protected_theme_id: Option<String>,
    /// Buffered events per subscriber before old ones are dropped
    pub event_capacity: usize,
}

impl Default for ThemeStoreConfig {
    fn default() -> Self {
        Self { protected_theme_id: Some(DEFAULT_THEME_ID.to_string()), event_capacity: 16 }
    }
}

impl ThemeStoreConfig {
    /// Set the protected theme (None disables protection)
    pub fn protected_theme_id(mut self, theme_id: Option<String>) -> Self {
        self.protected_theme_id = theme_id;
        self
    }

    /// Set the event buffer size
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

/// Where the store reads and writes both collections
#[cfg_attr(test, mockall::automock)]
pub trait PaletteBackend: Send + Sync {
    /// Read both collections, seeding any missing key
    fn load_or_seed(&self) -> storage::Result<PaletteSnapshot>;

    /// Write both collections in one batch
    fn save(&self, snapshot: &PaletteSnapshot) -> storage::Result<()>;

    /// Flush pending writes to disk
    fn flush(&self) -> storage::Result<()>;
}

impl PaletteBackend for PaletteRepository {
    fn load_or_seed(&self) -> storage::Result<PaletteSnapshot> {
        PaletteRepository::load_or_seed(self)
    }

    fn save(&self, snapshot: &PaletteSnapshot) -> storage::Result<()> {
        PaletteRepository::save(self, snapshot)
    }

    fn flush(&self) -> storage::Result<()> {
        PaletteRepository::flush(self)
    }
}

/// Events broadcast after a change is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteEvent {
    /// A color was added to a theme
    ColorAdded {
        /// Theme that received the color
        theme_id: String,
        /// New color id
        color_id: String,
    },
    /// A color was deleted
    ColorDeleted {
        /// Theme selected at the time
        theme_id: String,
        /// Deleted color id
        color_id: String,
    },
    /// A color was replaced
    ColorUpdated {
        /// Theme selected at the time
        theme_id: String,
        /// Id before the update
        old_id: String,
        /// Id after the update
        new_id: String,
    },
    /// The selection moved to another theme
    ThemeSelected(String),
    /// A theme was created
    ThemeAdded(String),
    /// A theme was renamed
    ThemeRenamed(String),
    /// A theme was deleted
    ThemeDeleted(String),
    /// State was re-read from storage
    Reloaded,
}

/// Theme and color state backed by the key-value store
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use app_state::store::{ThemeStore, ThemeStoreConfig};
/// use storage::{Color, KvStore};
///
/// let kv = Arc::new(KvStore::in_memory().unwrap());
/// let store = ThemeStore::open(kv, ThemeStoreConfig::default()).unwrap();
///
/// store.select_theme("t2").unwrap();
/// store.add_color(Color::new("#ff8800").named("Orange")).unwrap();
/// assert_eq!(store.colors_to_show()[0].value, "#ff8800");
/// ```
pub struct ThemeStore {
    backend: Box<dyn PaletteBackend>,
    config: ThemeStoreConfig,
    state: RwLock<PaletteState>,
    revision_tx: watch::Sender<u64>,
    events_tx: broadcast::Sender<PaletteEvent>,
}

impl ThemeStore {
    /// Open the store, seeding the bundled defaults on first run
    pub fn open(kv: Arc<KvStore>, config: ThemeStoreConfig) -> Result<Self> {
        Self::with_backend(PaletteRepository::new(kv), config)
    }

    /// Open the store on any backend
    pub fn with_backend(
        backend: impl PaletteBackend + 'static,
        config: ThemeStoreConfig,
    ) -> Result<Self> {
        let snapshot = backend.load_or_seed()?;
        tracing::info!(
            "Loaded {} themes and {} colors",
            snapshot.themes.len(),
            snapshot.colors.len()
        );

        let state = PaletteState::new(snapshot, config.protected_theme_id.clone());
        let (revision_tx, _) = watch::channel(0);
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Ok(Self {
            backend: Box::new(backend),
            config,
            state: RwLock::new(state),
            revision_tx,
            events_tx,
        })
    }

    /// Re-read both collections from storage
    ///
    /// The current selection is kept when the theme still exists.
    pub fn load(&self) -> Result<()> {
        let snapshot = self.backend.load_or_seed()?;
        let mut fresh = PaletteState::new(snapshot, self.config.protected_theme_id.clone());

        let mut state = self.state.write();
        let selected = state.selected_theme_id().to_string();
        if fresh.select_theme(&selected).is_err() {
            tracing::debug!("Selected theme {} no longer exists after reload", selected);
        }
        *state = fresh;
        drop(state);

        self.notify(PaletteEvent::Reloaded);
        Ok(())
    }

    /// Write both collections to storage and flush
    pub fn save(&self) -> Result<()> {
        let snapshot = self.state.read().snapshot();
        self.backend.save(&snapshot)?;
        self.backend.flush()?;
        Ok(())
    }

    /// Run a read-only closure against the current state
    pub fn read<R>(&self, f: impl FnOnce(&PaletteState) -> R) -> R {
        f(&*self.state.read())
    }

    /// Copy of the current state
    pub fn state(&self) -> PaletteState {
        self.state.read().clone()
    }

    /// Colors of the selected theme, resolved from the color collection
    pub fn colors_to_show(&self) -> Vec<Color> {
        self.read(|state| state.colors_to_show().into_iter().cloned().collect())
    }

    /// All themes
    pub fn themes(&self) -> Vec<Theme> {
        self.read(|state| state.themes().to_vec())
    }

    /// All colors
    pub fn colors(&self) -> Vec<Color> {
        self.read(|state| state.colors().to_vec())
    }

    /// Id of the selected theme
    pub fn selected_theme_id(&self) -> String {
        self.read(|state| state.selected_theme_id().to_string())
    }

    /// Check whether color mutations are allowed on the selected theme
    pub fn can_edit_selected(&self) -> bool {
        self.read(PaletteState::can_edit_selected)
    }

    /// Make another theme the active one
    ///
    /// The selection is not persisted.
    pub fn select_theme(&self, theme_id: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.selected_theme_id() == theme_id {
            return Ok(());
        }
        state.select_theme(theme_id)?;
        drop(state);

        self.notify(PaletteEvent::ThemeSelected(theme_id.to_string()));
        Ok(())
    }

    /// Add a color to the selected theme
    pub fn add_color(&self, color: Color) -> Result<MutationOutcome> {
        self.apply(ColorMutation::Add(color))
    }

    /// Delete a color everywhere
    pub fn delete_color(&self, color_id: &str) -> Result<MutationOutcome> {
        self.apply(ColorMutation::delete(color_id))
    }

    /// Replace a color by id
    pub fn update_color(&self, color_id: &str, color: Color) -> Result<MutationOutcome> {
        self.apply(ColorMutation::update(color_id, color))
    }

    /// Apply a color mutation and persist it
    pub fn apply(&self, mutation: ColorMutation) -> Result<MutationOutcome> {
        let operation = mutation.name();
        let template = mutation.clone();

        self.commit(
            operation,
            move |state| state.apply(mutation),
            move |state| color_event(&template, state.selected_theme_id()),
        )
    }

    /// Create an empty theme and persist it
    pub fn add_theme(&self, name: &str) -> Result<Theme> {
        let theme = Theme::new(name);
        let created = theme.clone();
        let theme_id = theme.id.clone();

        self.commit("add_theme", move |state| state.add_theme(theme), move |_| {
            PaletteEvent::ThemeAdded(theme_id)
        })?;
        Ok(created)
    }

    /// Rename a theme and persist it
    pub fn rename_theme(&self, theme_id: &str, name: &str) -> Result<MutationOutcome> {
        self.commit(
            "rename_theme",
            |state| state.rename_theme(theme_id, name),
            |_| PaletteEvent::ThemeRenamed(theme_id.to_string()),
        )
    }

    /// Delete a theme and persist it
    pub fn delete_theme(&self, theme_id: &str) -> Result<MutationOutcome> {
        self.commit(
            "delete_theme",
            |state| state.delete_theme(theme_id),
            |_| PaletteEvent::ThemeDeleted(theme_id.to_string()),
        )
    }

    /// Subscribe to the revision counter, bumped once per committed change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    /// Subscribe to committed change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PaletteEvent> {
        self.events_tx.subscribe()
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        *self.revision_tx.borrow()
    }

    fn commit<F, E>(&self, operation: &'static str, mutate: F, event: E) -> Result<MutationOutcome>
    where
        F: FnOnce(&mut PaletteState) -> Result<MutationOutcome>,
        E: FnOnce(&PaletteState) -> PaletteEvent,
    {
        let mut state = self.state.write();
        let mut working = state.clone();

        match mutate(&mut working) {
            Ok(MutationOutcome::Applied) => {}
            Ok(MutationOutcome::Unchanged) => {
                tracing::debug!("{} changed nothing", operation);
                return Ok(MutationOutcome::Unchanged);
            }
            Err(e @ MutationError::Forbidden(_)) => {
                tracing::warn!("Rejected {}: {}", operation, e);
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = self.backend.save(&working.snapshot()) {
            tracing::error!("Failed to persist {}: {}", operation, e);
            return Err(e.into());
        }
        let event = event(&working);
        *state = working;
        drop(state);

        tracing::debug!("Applied {}", operation);
        self.notify(event);
        Ok(MutationOutcome::Applied)
    }

    fn notify(&self, event: PaletteEvent) {
        self.revision_tx.send_modify(|revision| *revision += 1);
        let _ = self.events_tx.send(event);
    }
}

fn color_event(mutation: &ColorMutation, theme_id: &str) -> PaletteEvent {
    let theme_id = theme_id.to_string();
    match mutation {
        ColorMutation::Add(color) => {
            PaletteEvent::ColorAdded { theme_id, color_id: color.id.clone() }
        }
        ColorMutation::Delete { color_id } => {
            PaletteEvent::ColorDeleted { theme_id, color_id: color_id.clone() }
        }
        ColorMutation::Update { color_id, color } => PaletteEvent::ColorUpdated {
            theme_id,
            old_id: color_id.clone(),
            new_id: color.id.clone(),
        },
    }
}
