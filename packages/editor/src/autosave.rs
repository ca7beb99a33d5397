//! # Autosave
//!
//! Debounced persistence of the committed document. Rapid successive
//! commits coalesce into one `save` once the debounce window passes without
//! a new commit. Saving runs off the editing path; failures surface as
//! [`SyncState::Failed`] and can be retried.
//!
//! ```rust,ignore
//! let saver = Autosaver::spawn(store, config.autosave_debounce);
//! session.accept_all_patches()?;
//! saver.schedule_commit(&mut session); // after every successful commit
//! // ...
//! saver.flush().await;
//! ```

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::document::Document;
use crate::session::EditSession;
use crate::store::{DocumentStore, SyncState};

enum Command {
    Schedule(Document),
    Retry,
    Flush(oneshot::Sender<SyncState>),
}

/// Handle to the background save task
pub struct Autosaver {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SyncState>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// Start the save task on the current tokio runtime
    pub fn spawn(store: Arc<dyn DocumentStore>, debounce: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SyncState::Idle);
        let task = tokio::spawn(run(store, debounce, rx, state_tx));
        Self { commands, state, task }
    }

    /// Queue `document` for saving after the debounce window
    pub fn schedule(&self, document: Document) {
        if self.commands.send(Command::Schedule(document)).is_err() {
            warn!("Autosave task is gone, dropping scheduled save");
        }
    }

    /// Queue the session's committed document if it changed since the last
    /// hand-off. From then on the outcome is tracked by [`Self::state`], not
    /// by the session's dirty flag.
    pub fn schedule_commit(&self, session: &mut EditSession) -> bool {
        if !session.is_dirty() {
            return false;
        }
        self.schedule(session.document().clone());
        session.mark_saved();
        true
    }

    /// Retry the last failed save immediately
    pub fn retry(&self) {
        let _ = self.commands.send(Command::Retry);
    }

    /// Save anything pending now and report the resulting state
    pub async fn flush(&self) -> SyncState {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Flush(reply)).is_err() {
            return self.state();
        }
        done.await.unwrap_or_else(|_| self.state())
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Watch state transitions (for a UI sync indicator)
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    /// Flush and stop the task
    pub async fn shutdown(self) -> SyncState {
        let state = self.flush().await;
        drop(self.commands);
        let _ = self.task.await;
        state
    }
}

async fn run(
    store: Arc<dyn DocumentStore>,
    debounce: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<SyncState>,
) {
    let mut pending: Option<Document> = None;
    let mut failed: Option<Document> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = commands.recv() => command,
                _ = tokio::time::sleep(debounce) => {
                    if let Some(doc) = pending.take() {
                        write(&store, doc, &state, &mut failed).await;
                    }
                    continue;
                }
            }
        } else {
            commands.recv().await
        };

        match command {
            Some(Command::Schedule(doc)) => {
                pending = Some(doc);
                state.send_replace(SyncState::Pending);
            }
            Some(Command::Retry) => {
                // a newer scheduled document supersedes the failed one
                if let Some(doc) = pending.take().or_else(|| failed.take()) {
                    write(&store, doc, &state, &mut failed).await;
                }
            }
            Some(Command::Flush(reply)) => {
                if let Some(doc) = pending.take() {
                    write(&store, doc, &state, &mut failed).await;
                }
                let _ = reply.send(state.borrow().clone());
            }
            None => {
                if let Some(doc) = pending.take() {
                    write(&store, doc, &state, &mut failed).await;
                }
                break;
            }
        }
    }
}

async fn write(
    store: &Arc<dyn DocumentStore>,
    doc: Document,
    state: &watch::Sender<SyncState>,
    failed: &mut Option<Document>,
) {
    state.send_replace(SyncState::Pending);

    let store = Arc::clone(store);
    let attempt = doc.clone();
    let result = tokio::task::spawn_blocking(move || store.save(&attempt.id, &attempt)).await;

    let error = match result {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(join) => Some(join.to_string()),
    };

    match error {
        None => {
            debug!(id = %doc.id, version = doc.version, "Autosaved document");
            *failed = None;
            state.send_replace(SyncState::Saved { at: Utc::now() });
        }
        Some(message) => {
            warn!(id = %doc.id, error = %message, "Autosave failed");
            *failed = Some(doc);
            state.send_replace(SyncState::Failed { message });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentSummary, MemoryStore, StoreError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        saves: AtomicUsize,
        failing: AtomicBool,
    }

    impl DocumentStore for FlakyStore {
        fn save(&self, id: &str, document: &Document) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(id, document)
        }

        fn load(&self, id: &str) -> Result<Document, StoreError> {
            self.inner.load(id)
        }

        fn list(&self) -> Result<Vec<DocumentSummary>, StoreError> {
            self.inner.list()
        }

        fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete(id)
        }
    }

    fn titled(title: &str) -> Document {
        Document::new("form", title)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce() {
        let store = Arc::new(FlakyStore::default());
        let saver = Autosaver::spawn(store.clone(), Duration::from_millis(500));

        saver.schedule(titled("v1"));
        saver.schedule(titled("v2"));
        saver.schedule(titled("v3"));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(matches!(saver.flush().await, SyncState::Saved { .. }));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.load("form").unwrap().metadata.title, "v3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately() {
        let store = Arc::new(FlakyStore::default());
        let saver = Autosaver::spawn(store.clone(), Duration::from_secs(60));

        saver.schedule(titled("v1"));
        assert!(matches!(saver.flush().await, SyncState::Saved { .. }));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_retryable() {
        let store = Arc::new(FlakyStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let saver = Autosaver::spawn(store.clone(), Duration::from_millis(100));

        saver.schedule(titled("v1"));
        assert!(saver.flush().await.is_failed());
        assert!(saver.state().is_failed());

        store.failing.store(false, Ordering::SeqCst);
        saver.retry();
        assert!(matches!(saver.flush().await, SyncState::Saved { .. }));
        assert_eq!(store.load("form").unwrap().metadata.title, "v1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_commits_are_scheduled() {
        let store = Arc::new(FlakyStore::default());
        let saver = Autosaver::spawn(store.clone(), Duration::from_millis(500));
        let mut session = EditSession::new(titled("v0"));

        assert!(!saver.schedule_commit(&mut session));

        session
            .apply_direct(
                vec![crate::patch::PatchOperation::replace("/metadata/title", serde_json::json!("v1"))],
                None,
            )
            .unwrap();
        assert!(saver.schedule_commit(&mut session));
        assert!(!session.is_dirty());
        assert!(!saver.schedule_commit(&mut session));

        assert!(matches!(saver.flush().await, SyncState::Saved { .. }));
        assert_eq!(store.load("form").unwrap().metadata.title, "v1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_writes_pending() {
        let store = Arc::new(FlakyStore::default());
        let saver = Autosaver::spawn(store.clone(), Duration::from_secs(60));

        saver.schedule(titled("last"));
        saver.shutdown().await;
        assert_eq!(store.load("form").unwrap().metadata.title, "last");
    }
}
