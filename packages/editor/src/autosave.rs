//! # Debounced Autosave
//!
//! A background Tokio task owns the pending snapshot. Each
//! [`AutoSaver::schedule`] replaces it and restarts the trailing timer, so
//! only the last snapshot of a burst of edits is written. Dropping the
//! handle closes the channel and the task writes whatever is still pending.

use crate::document::Design;
use crate::persistence::{Persistence, PersistenceWarning};
use crate::{EditorError, EditorResult};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// Default trailing delay between the last change and the save
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

enum Command {
    Schedule(Box<Design>),
    Cancel,
    Flush(oneshot::Sender<()>),
    Settle(oneshot::Sender<()>),
}

type Warnings = Arc<Mutex<Vec<PersistenceWarning>>>;

/// Handle to the autosave task
#[derive(Debug)]
pub struct AutoSaver {
    commands: mpsc::UnboundedSender<Command>,
    warnings: Warnings,
    delay: Duration,
}

impl AutoSaver {
    /// Start the autosave task on the current Tokio runtime
    pub fn spawn(persistence: Persistence, delay: Duration) -> EditorResult<Self> {
        let handle = Handle::try_current().map_err(|_| {
            EditorError::Precondition("autosave needs a running Tokio runtime".to_string())
        })?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let warnings = Warnings::default();
        handle.spawn(run(receiver, persistence, delay, Arc::clone(&warnings)));

        tracing::debug!(delay_ms = delay.as_millis() as u64, "autosave started");
        Ok(Self {
            commands,
            warnings,
            delay,
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending snapshot and restart the timer
    pub fn schedule(&self, design: &Design) {
        self.send(Command::Schedule(Box::new(design.clone())));
    }

    /// Drop the pending snapshot without writing it
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    /// Drop the pending snapshot and wait until no save is running
    pub async fn settle(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Settle(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Write the pending snapshot now and wait for it
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Drain the failures collected since the last call
    pub fn take_warnings(&self) -> Vec<PersistenceWarning> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("autosave task is gone; change not scheduled");
        }
    }
}

async fn run(
    mut commands: mpsc::UnboundedReceiver<Command>,
    persistence: Persistence,
    delay: Duration,
    warnings: Warnings,
) {
    let mut pending: Option<Box<Design>> = None;
    let timer = tokio::time::sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Schedule(design)) => {
                    pending = Some(design);
                    timer.as_mut().reset(Instant::now() + delay);
                }
                Some(Command::Cancel) => {
                    if pending.take().is_some() {
                        tracing::debug!("pending save cancelled");
                    }
                }
                Some(Command::Flush(done)) => {
                    if let Some(design) = pending.take() {
                        save(&persistence, *design, &warnings).await;
                    }
                    let _ = done.send(());
                }
                Some(Command::Settle(done)) => {
                    pending = None;
                    let _ = done.send(());
                }
                None => {
                    if let Some(design) = pending.take() {
                        save(&persistence, *design, &warnings).await;
                    }
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(design) = pending.take() {
                    save(&persistence, *design, &warnings).await;
                }
            }
        }
    }
}

async fn save(persistence: &Persistence, design: Design, warnings: &Warnings) {
    let name = design.name.clone();
    let persistence = persistence.clone();
    let message = match tokio::task::spawn_blocking(move || persistence.save(&design)).await {
        Ok(Ok(_)) => return,
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("save task failed: {e}"),
    };

    tracing::warn!(design = %name, "{message}");
    warnings
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(PersistenceWarning {
            design: name,
            message,
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use designer_common::{CommonError, CommonResult, MemoryStore, SnapshotStore};

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn get(&self, _key: &str) -> CommonResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> CommonResult<()> {
            Err(CommonError::Generic(format!("disk full writing {key}")))
        }

        fn remove(&self, _key: &str) -> CommonResult<()> {
            Ok(())
        }
    }

    /// Memory store whose writes take a while
    #[derive(Default)]
    struct SlowStore(MemoryStore);

    impl SnapshotStore for SlowStore {
        fn get(&self, key: &str) -> CommonResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> CommonResult<()> {
            std::thread::sleep(Duration::from_millis(100));
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> CommonResult<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let persistence = Persistence::new(Arc::new(MemoryStore::new()));
        let result = AutoSaver::spawn(persistence, DEFAULT_AUTOSAVE_DELAY);
        assert!(matches!(result, Err(EditorError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_burst_is_coalesced() {
        let store = Arc::new(MemoryStore::new());
        let persistence = Persistence::new(store.clone());
        let saver = AutoSaver::spawn(persistence.clone(), Duration::from_millis(20)).unwrap();

        let mut design = Design::new("burst");
        for next_id in 10..15 {
            design.next_id = next_id;
            saver.schedule(&design);
        }
        assert!(store.is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let stored = persistence.load("burst").unwrap().unwrap();
        assert_eq!(stored["nextId"], 14);
    }

    #[tokio::test]
    async fn test_cancel_drops_pending() {
        let store = Arc::new(MemoryStore::new());
        let saver =
            AutoSaver::spawn(Persistence::new(store.clone()), Duration::from_millis(20)).unwrap();

        saver.schedule(&Design::new("stale"));
        saver.cancel();
        saver.flush().await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_flush_writes_immediately() {
        let store = Arc::new(MemoryStore::new());
        let saver = AutoSaver::spawn(Persistence::new(store.clone()), Duration::from_secs(60)).unwrap();

        saver.schedule(&Design::new("now"));
        saver.flush().await;
        assert!(store.get("now").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_save_becomes_warning() {
        let saver = AutoSaver::spawn(Persistence::new(Arc::new(FailingStore)), Duration::from_secs(60))
            .unwrap();

        saver.schedule(&Design::new("doomed"));
        saver.flush().await;

        let warnings = saver.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].design, "doomed");
        assert!(warnings[0].message.contains("disk full"));
        assert!(saver.take_warnings().is_empty());
    }

    #[tokio::test]
    async fn test_settle_waits_for_running_save() {
        let store = Arc::new(SlowStore::default());
        let saver =
            AutoSaver::spawn(Persistence::new(store.clone()), Duration::from_millis(10)).unwrap();

        saver.schedule(&Design::new("slow"));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.get("slow").unwrap().is_none());

        saver.settle().await;
        assert!(store.get("slow").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_settle_drops_pending() {
        let store = Arc::new(MemoryStore::new());
        let saver =
            AutoSaver::spawn(Persistence::new(store.clone()), Duration::from_millis(20)).unwrap();

        saver.schedule(&Design::new("stale"));
        saver.settle().await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.is_empty());
    }
}
