use homework_core::error::AppError;
use homework_core::notify::{Notifier, ResetNotice};
use homework_core::storage::json_store;
use homework_core::{ResetOutcome, ResetSchedule, TaskStore};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// One interaction cycle: load the store, apply due resets, run a single
/// operation, save.
pub struct Session {
    store_path: PathBuf,
    schedule: ResetSchedule,
    notifier: Box<dyn Notifier>,
}

#[derive(Debug)]
pub struct SessionOutcome<T> {
    pub value: T,
    pub resets: ResetOutcome,
}

impl Session {
    pub fn new(store_path: PathBuf, schedule: ResetSchedule, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store_path,
            schedule,
            notifier,
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn schedule(&self) -> ResetSchedule {
        self.schedule
    }

    pub fn run<T, F>(&self, now: OffsetDateTime, operation: F) -> Result<SessionOutcome<T>, AppError>
    where
        F: FnOnce(&mut TaskStore) -> Result<T, AppError>,
    {
        let mut store = self.load(now)?;
        let resets = store.check_and_apply_resets(now);
        self.announce(resets);

        match operation(&mut store) {
            Ok(value) => {
                self.save(&store)?;
                Ok(SessionOutcome { value, resets })
            }
            Err(err) => {
                if resets.fired() {
                    self.save(&store)?;
                }
                Err(err)
            }
        }
    }

    /// Prints reset notices to stderr and forwards them to the desktop.
    /// Notification failures are logged, never fatal.
    pub fn announce(&self, resets: ResetOutcome) {
        let Some(notice) = ResetNotice::from_outcome(resets) else {
            return;
        };

        tracing::info!(daily = resets.daily, weekly = resets.weekly, "reset applied");
        for line in &notice.lines {
            eprintln!("NOTICE: {line}");
        }
        if let Err(err) = self.notifier.notify(&notice) {
            tracing::warn!(error = %err, "desktop notification failed");
        }
    }

    fn load(&self, now: OffsetDateTime) -> Result<TaskStore, AppError> {
        let load = json_store::load_store_with_fallback(&self.store_path, self.schedule, now)?;
        if let Some(err) = load.error {
            let backup = self.backup_path();
            std::fs::rename(&self.store_path, &backup)
                .map_err(|io_err| AppError::io(format!("{}: {}", backup.display(), io_err)))?;
            eprintln!(
                "WARNING: {err}; starting with a fresh roster, previous file moved to {}",
                backup.display()
            );
        }

        tracing::debug!(path = %self.store_path.display(), "store loaded");
        Ok(load.store)
    }

    fn save(&self, store: &TaskStore) -> Result<(), AppError> {
        json_store::save_store(&self.store_path, store)?;
        tracing::debug!(path = %self.store_path.display(), "store saved");
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .store_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".broken");
        self.store_path.with_file_name(name)
    }
}
