//! Source registry operations
use tracing::info;

use super::GuestManager;
use crate::error::OryxError;
use crate::state::Source;

impl GuestManager {
    /// Registers a new source. The URL is not probed here; whether it
    /// is reachable only matters when a guest is installed from it.
    pub fn add_source(&self, name: &str, url: &str) -> Result<(), OryxError> {
        let mut guard = self.store.acquire()?;
        if guard.state().sources.contains_key(name) {
            return Err(OryxError::SourceExists {
                name: name.to_owned(),
            });
        }

        guard.state_mut().sources.insert(
            name.to_owned(),
            Source {
                url: url.to_owned(),
            },
        );
        guard.commit()?;
        info!(name, url, "added source");
        Ok(())
    }

    pub fn remove_source(&self, name: &str) -> Result<(), OryxError> {
        let mut guard = self.store.acquire()?;
        if guard.state_mut().sources.shift_remove(name).is_none() {
            return Err(OryxError::SourceNotFound {
                name: name.to_owned(),
            });
        }

        guard.commit()?;
        info!(name, "removed source");
        Ok(())
    }

    /// Names of all registered sources, in registration order.
    pub fn list_sources(&self) -> Result<Vec<String>, OryxError> {
        let guard = self.store.acquire()?;
        Ok(guard.state().sources.keys().cloned().collect())
    }

    pub fn show_source(&self, name: &str) -> Result<Source, OryxError> {
        let guard = self.store.acquire()?;
        guard
            .state()
            .sources
            .get(name)
            .cloned()
            .ok_or_else(|| OryxError::SourceNotFound {
                name: name.to_owned(),
            })
    }
}
