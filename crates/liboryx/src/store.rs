//! Durable, lock-guarded access to the state document
//!
//! Every invocation of the tool is an independent OS process, so mutual
//! exclusion is an exclusive advisory `flock` on the backing file. The
//! lock is materialized as a [`StateGuard`]: committing writes the
//! document back and releases, dropping the guard releases without
//! writing. A process that crashes while holding the lock releases it
//! when the kernel closes its file descriptors; that is the recovery
//! mechanism for stuck locks.
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::state::State;

const STATE_FILE: &str = "state";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open state file {path:?}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to lock state file {path:?}")]
    Lock { path: PathBuf, source: nix::Error },
    #[error("failed to read state file {path:?}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write state file {path:?}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize state")]
    Serialize(#[source] serde_json::Error),
}

/// Handle on the backing state file. Cheap to construct; nothing is
/// opened until [`StateStore::acquire`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the exclusive lock, blocking until it is available, and
    /// loads the current document. A missing or unparsable file is
    /// treated identically to "no state yet" and yields a blank
    /// document; the next commit overwrites it.
    pub fn acquire(&self) -> Result<StateGuard, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Open {
                path: self.path.clone(),
                source: err,
            })?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|err| StoreError::Open {
                path: self.path.clone(),
                source: err,
            })?;

        tracing::debug!(path = %self.path.display(), "locking state file");
        let mut file =
            Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| StoreError::Lock {
                path: self.path.clone(),
                source: errno,
            })?;

        let mut raw = String::new();
        file.read_to_string(&mut raw).map_err(|err| StoreError::Read {
            path: self.path.clone(),
            source: err,
        })?;

        let state = serde_json::from_str(&raw).unwrap_or_else(|err| {
            if !raw.trim().is_empty() {
                tracing::debug!(path = %self.path.display(), %err, "state file unparsable, starting from blank state");
            }
            State::default()
        });

        Ok(StateGuard {
            file,
            path: self.path.clone(),
            state,
        })
    }
}

/// Exclusive access token for the loaded document, held for the
/// duration of one registry operation.
pub struct StateGuard {
    file: Flock<File>,
    path: PathBuf,
    state: State,
}

impl StateGuard {
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Serializes the document, truncates and rewrites the backing file
    /// through the locked descriptor, then releases the lock. Readers
    /// never observe a torn write because the exclusive lock is held
    /// across the whole rewrite.
    pub fn commit(mut self) -> Result<(), StoreError> {
        let mut serialized =
            serde_json::to_string_pretty(&self.state).map_err(StoreError::Serialize)?;
        serialized.push('\n');

        tracing::debug!(path = %self.path.display(), "writing back state");
        let write_err = |err| StoreError::Write {
            path: self.path.clone(),
            source: err,
        };
        self.file.seek(SeekFrom::Start(0)).map_err(write_err)?;
        self.file.set_len(0).map_err(write_err)?;
        self.file.write_all(serialized.as_bytes()).map_err(write_err)?;
        self.file.flush().map_err(write_err)?;
        // Dropping the guard unlocks the file.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Source;
    use anyhow::Result;

    #[test]
    fn test_pristine_root_yields_blank_state() -> Result<()> {
        let root = tempfile::tempdir()?;
        let store = StateStore::new(&root.path().join("nested"));

        let guard = store.acquire()?;
        assert!(guard.state().sources.is_empty());
        assert!(guard.state().guests.is_empty());
        Ok(())
    }

    #[test]
    fn test_commit_roundtrip() -> Result<()> {
        let root = tempfile::tempdir()?;
        let store = StateStore::new(root.path());

        let mut guard = store.acquire()?;
        guard.state_mut().sources.insert(
            "s".to_owned(),
            Source {
                url: "http://h/p".to_owned(),
            },
        );
        guard.commit()?;

        // Reopen through a fresh handle, as a new process would.
        let store = StateStore::new(root.path());
        let guard = store.acquire()?;
        assert_eq!(guard.state().sources["s"].url, "http://h/p");
        Ok(())
    }

    #[test]
    fn test_drop_discards_changes() -> Result<()> {
        let root = tempfile::tempdir()?;
        let store = StateStore::new(root.path());

        let mut guard = store.acquire()?;
        guard.state_mut().sources.insert(
            "s".to_owned(),
            Source {
                url: "http://h/p".to_owned(),
            },
        );
        drop(guard);

        let guard = store.acquire()?;
        assert!(guard.state().sources.is_empty());
        Ok(())
    }

    #[test]
    fn test_unparsable_state_file_is_blank_state() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join(STATE_FILE), "not json {{{")?;

        let store = StateStore::new(root.path());
        let guard = store.acquire()?;
        assert!(guard.state().sources.is_empty());
        guard.commit()?;

        let raw = fs::read_to_string(root.path().join(STATE_FILE))?;
        assert_eq!(raw, "{}\n");
        Ok(())
    }

    #[test]
    fn test_commit_truncates_longer_previous_content() -> Result<()> {
        let root = tempfile::tempdir()?;
        let store = StateStore::new(root.path());

        let mut guard = store.acquire()?;
        for i in 0..16 {
            guard.state_mut().sources.insert(
                format!("source-{i}"),
                Source {
                    url: format!("http://host/{i}"),
                },
            );
        }
        guard.commit()?;

        let mut guard = store.acquire()?;
        guard.state_mut().sources.clear();
        guard.commit()?;

        let raw = fs::read_to_string(store.path())?;
        assert_eq!(raw, "{}\n");
        Ok(())
    }
}
