use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use docrender_logging::{docrender_debug, docrender_info, docrender_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::persist::{DocumentStore, DOCUMENT_KEY};
use crate::{EngineEvent, Revision};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSave {
    revision: Revision,
    content: String,
}

/// Debounced writer for the document buffer.
///
/// Each `schedule` replaces the pending snapshot and restarts the timer, so
/// only the latest snapshot is ever committed. A zero delay commits inline.
pub struct PersistenceGuard {
    committer: Arc<Committer>,
    delay: Duration,
    runtime: Handle,
    timer: Option<JoinHandle<()>>,
}

impl PersistenceGuard {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sink: Arc<dyn EventSink>,
        delay: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            committer: Arc::new(Committer {
                store,
                sink,
                latest: Mutex::new(None),
                committed: Mutex::new(None),
            }),
            delay,
            runtime,
            timer: None,
        }
    }

    /// Initial buffer for a session: the durable copy, else `fallback`.
    ///
    /// The flag is true when the durable copy was used. Read errors fall back too.
    pub fn load_initial(store: &dyn DocumentStore, fallback: &str) -> (String, bool) {
        match store.get(DOCUMENT_KEY) {
            Ok(Some(text)) => (text, true),
            Ok(None) => (fallback.to_string(), false),
            Err(err) => {
                docrender_warn!("Could not read stored document, using example: {}", err);
                (fallback.to_string(), false)
            }
        }
    }

    pub fn schedule(&mut self, revision: Revision, content: String) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.committer.replace(PendingSave { revision, content });

        if self.delay.is_zero() {
            self.committer.commit(Some(revision));
            return;
        }

        let committer = self.committer.clone();
        let delay = self.delay;
        self.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            committer.commit(Some(revision));
        }));
    }

    /// Commits a pending snapshot now instead of waiting for the timer.
    ///
    /// Blocks while a timer that already woke is still writing.
    pub fn flush(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.committer.commit(None);
    }

    pub fn has_pending(&self) -> bool {
        self.committer
            .latest
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

/// Serializes writes: one commit at a time, never an older revision after a newer one.
struct Committer {
    store: Arc<dyn DocumentStore>,
    sink: Arc<dyn EventSink>,
    latest: Mutex<Option<PendingSave>>,
    /// Held across the whole write; last revision that reached storage.
    committed: Mutex<Option<Revision>>,
}

impl Committer {
    fn replace(&self, pending: PendingSave) {
        if let Ok(mut slot) = self.latest.lock() {
            *slot = Some(pending);
        }
    }

    /// Writes the pending snapshot. With `expected`, only if it is still that revision.
    fn commit(&self, expected: Option<Revision>) {
        let Ok(mut committed) = self.committed.lock() else {
            return;
        };
        let Some(pending) = self.take_pending(expected) else {
            return;
        };
        if committed.is_some_and(|last| pending.revision <= last) {
            docrender_debug!("Skipping save of superseded revision {}", pending.revision);
            return;
        }
        if expected.is_none() {
            docrender_debug!("Flushing pending save of revision {}", pending.revision);
        }
        if write(self.store.as_ref(), self.sink.as_ref(), &pending) {
            *committed = Some(pending.revision);
        }
    }

    fn take_pending(&self, expected: Option<Revision>) -> Option<PendingSave> {
        let mut slot = self.latest.lock().ok()?;
        match (slot.as_ref(), expected) {
            (Some(pending), Some(revision)) if pending.revision != revision => None,
            _ => slot.take(),
        }
    }
}

/// Storage failures are reported but never retried here; the next edit reschedules.
fn write(store: &dyn DocumentStore, sink: &dyn EventSink, pending: &PendingSave) -> bool {
    match store.put(DOCUMENT_KEY, &pending.content) {
        Ok(()) => {
            docrender_info!(
                "Saved document revision {} ({} bytes)",
                pending.revision,
                pending.content.len()
            );
            sink.emit(EngineEvent::DocumentSaved {
                revision: pending.revision,
            });
            true
        }
        Err(err) => {
            docrender_warn!("Saving document revision {} failed: {}", pending.revision, err);
            sink.emit(EngineEvent::DocumentSaveFailed {
                revision: pending.revision,
                message: err.to_string(),
            });
            false
        }
    }
}
