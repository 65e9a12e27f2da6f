//! Copy-to-clipboard confirmation
//!
//! This module tracks the transient "copied" flag shown after a color value is
//! written to the clipboard. The flag clears itself after a fixed delay; a new
//! successful copy restarts the delay, and a pending expiry never fires against
//! a newer confirmation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long the confirmation stays visible (3 seconds)
pub const COPY_CONFIRMATION_DELAY: Duration = Duration::from_millis(3000);

/// Clipboard errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// No clipboard is available on this host
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// The host refused the write
    #[error("Clipboard write rejected: {0}")]
    Rejected(String),
}

/// Host clipboard capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Write plain text to the clipboard
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[async_trait]
impl<C: Clipboard + ?Sized> Clipboard for Arc<C> {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        (**self).write_text(text).await
    }
}

/// In-process clipboard that keeps the last written text
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

/// Confirmation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    /// Nothing to confirm
    #[default]
    Idle,
    /// A copy succeeded recently
    Copied,
}

impl CopyState {
    /// Check whether the confirmation should be shown
    pub fn is_copied(&self) -> bool {
        matches!(self, CopyState::Copied)
    }
}

/// Feedback configuration
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    /// Time from the last successful copy until the confirmation clears
    pub delay: Duration,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { delay: COPY_CONFIRMATION_DELAY }
    }
}

impl FeedbackConfig {
    /// Set the confirmation delay
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Clipboard copy with a self-expiring confirmation flag
///
/// Must be used from within a tokio runtime; the expiry runs as a spawned task.
/// Dropping the feedback cancels any pending expiry.
///
/// # Example
///
/// ```no_run
/// use app_state::feedback::{CopyFeedback, CopyState, MemoryClipboard};
///
/// #[tokio::main]
/// async fn main() {
///     let feedback = CopyFeedback::new(MemoryClipboard::new());
///
///     feedback.copy("#1e3a5f").await.unwrap();
///     assert_eq!(feedback.state(), CopyState::Copied);
/// }
/// ```
pub struct CopyFeedback<C> {
    clipboard: C,
    config: FeedbackConfig,
    state_tx: Arc<watch::Sender<CopyState>>,
    /// Bumped on every transition into `Copied`; an expiry only fires for its own generation
    generation: Arc<AtomicU64>,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clipboard> CopyFeedback<C> {
    /// Create feedback with the default 3 second delay
    pub fn new(clipboard: C) -> Self {
        Self::with_config(clipboard, FeedbackConfig::default())
    }

    /// Create feedback with a custom configuration
    pub fn with_config(clipboard: C, config: FeedbackConfig) -> Self {
        let (state_tx, _) = watch::channel(CopyState::Idle);

        Self {
            clipboard,
            config,
            state_tx: Arc::new(state_tx),
            generation: Arc::new(AtomicU64::new(0)),
            expiry: Mutex::new(None),
        }
    }

    /// Write text to the clipboard and show the confirmation on success
    ///
    /// A failed write is logged and returned; the confirmation state is left
    /// as it was.
    pub async fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        match self.clipboard.write_text(text).await {
            Ok(()) => {
                self.mark_copied();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to copy color value: {}", e);
                Err(e)
            }
        }
    }

    /// Current confirmation state
    pub fn state(&self) -> CopyState {
        *self.state_tx.borrow()
    }

    /// Check whether the confirmation is showing
    pub fn is_copied(&self) -> bool {
        self.state().is_copied()
    }

    /// Subscribe to confirmation changes
    pub fn subscribe(&self) -> watch::Receiver<CopyState> {
        self.state_tx.subscribe()
    }

    /// Clear the confirmation now and cancel the pending expiry
    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = self.expiry.lock().take() {
            pending.abort();
        }
        self.state_tx.send_replace(CopyState::Idle);
    }

    /// The underlying clipboard
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    fn mark_copied(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state_tx.send_replace(CopyState::Copied);

        let state_tx = Arc::clone(&self.state_tx);
        let current = Arc::clone(&self.generation);
        let delay = self.config.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                state_tx.send_replace(CopyState::Idle);
            }
        });

        if let Some(previous) = self.expiry.lock().replace(handle) {
            previous.abort();
        }
    }
}

impl<C> Drop for CopyFeedback<C> {
    fn drop(&mut self) {
        if let Some(pending) = self.expiry.get_mut().take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn ok_clipboard() -> MockClipboard {
        let mut clipboard = MockClipboard::new();
        clipboard.expect_write_text().returning(|_| Ok(()));
        clipboard
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_confirms_then_expires_after_delay() {
        let feedback = CopyFeedback::new(ok_clipboard());
        assert_eq!(feedback.state(), CopyState::Idle);

        feedback.copy("#1e3a5f").await.unwrap();
        assert_eq!(feedback.state(), CopyState::Copied);

        sleep_ms(2999).await;
        assert!(feedback.is_copied());

        sleep_ms(2).await;
        assert_eq!(feedback.state(), CopyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_copy_restarts_window() {
        let feedback = CopyFeedback::new(ok_clipboard());

        feedback.copy("#000").await.unwrap();
        sleep_ms(2000).await;
        feedback.copy("#fff").await.unwrap();

        // Past the first copy's expiry
        sleep_ms(2999).await;
        assert_eq!(feedback.state(), CopyState::Copied);

        sleep_ms(2).await;
        assert_eq!(feedback.state(), CopyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_copy_stays_idle() {
        init_tracing();
        let mut clipboard = MockClipboard::new();
        clipboard
            .expect_write_text()
            .withf(|text: &str| text == "#abc")
            .times(1)
            .returning(|_| Err(ClipboardError::Rejected("permission denied".to_string())));
        let feedback = CopyFeedback::new(clipboard);

        let result = feedback.copy("#abc").await;
        assert_eq!(result, Err(ClipboardError::Rejected("permission denied".to_string())));
        assert_eq!(feedback.state(), CopyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_copy_does_not_extend_confirmation() {
        init_tracing();
        let mut clipboard = MockClipboard::new();
        clipboard
            .expect_write_text()
            .withf(|text: &str| text == "good")
            .returning(|_| Ok(()));
        clipboard
            .expect_write_text()
            .withf(|text: &str| text == "bad")
            .returning(|_| Err(ClipboardError::Unavailable("no display".to_string())));
        let feedback = CopyFeedback::new(clipboard);

        feedback.copy("good").await.unwrap();
        sleep_ms(1000).await;
        assert!(feedback.copy("bad").await.is_err());
        assert!(feedback.is_copied());

        sleep_ms(2001).await;
        assert_eq!(feedback.state(), CopyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_sees_both_transitions() {
        let feedback = CopyFeedback::new(ok_clipboard());
        let mut rx = feedback.subscribe();

        feedback.copy("#123456").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), CopyState::Copied);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), CopyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_pending_expiry() {
        let feedback = CopyFeedback::new(ok_clipboard());

        feedback.copy("#000").await.unwrap();
        feedback.dismiss();
        assert_eq!(feedback.state(), CopyState::Idle);

        sleep_ms(1000).await;
        feedback.copy("#fff").await.unwrap();
        sleep_ms(2500).await;
        assert!(feedback.is_copied());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_expiry() {
        let feedback = CopyFeedback::new(ok_clipboard());
        let rx = feedback.subscribe();

        feedback.copy("#000").await.unwrap();
        drop(feedback);

        sleep_ms(5000).await;
        assert_eq!(*rx.borrow(), CopyState::Copied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_delay() {
        let config = FeedbackConfig::default().delay(Duration::from_millis(500));
        let feedback = CopyFeedback::with_config(ok_clipboard(), config);

        feedback.copy("#000").await.unwrap();
        sleep_ms(501).await;
        assert_eq!(feedback.state(), CopyState::Idle);
    }

    #[tokio::test]
    async fn test_memory_clipboard_keeps_last_text() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let feedback = CopyFeedback::new(Arc::clone(&clipboard));

        assert_eq!(clipboard.contents(), None);
        feedback.copy("#0f172a").await.unwrap();
        assert_eq!(clipboard.contents(), Some("#0f172a".to_string()));
        assert_eq!(feedback.clipboard().contents(), Some("#0f172a".to_string()));
    }

    #[test]
    fn test_default_delay_is_three_seconds() {
        assert_eq!(FeedbackConfig::default().delay, Duration::from_millis(3000));
        assert!(!CopyState::default().is_copied());
    }
}
