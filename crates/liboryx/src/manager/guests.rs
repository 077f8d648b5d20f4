//! Guest registry operations and lifecycle transitions
use std::fs;
use std::process::Command;

use tracing::{debug, info};

use super::GuestManager;
use crate::error::OryxError;
use crate::reference::ImageReference;
use crate::resolver::Resolver;
use crate::state::Guest;

impl GuestManager {
    /// Installs an image and registers it as a new guest.
    ///
    /// Preconditions are checked under the lock, but the descriptor
    /// fetch and the install run without it: the guest's directory is
    /// not visible to anyone else yet, and a multi-minute download must
    /// not block unrelated registry operations. The final insert
    /// re-checks for a concurrent install of the same name under a
    /// second acquisition.
    pub fn add_guest(&self, name: &str, reference: &str) -> Result<(), OryxError> {
        let reference: ImageReference = reference.parse()?;

        let source = {
            let guard = self.store.acquire()?;
            if guard.state().guests.contains_key(name) {
                return Err(OryxError::GuestExists {
                    name: name.to_owned(),
                });
            }
            guard
                .state()
                .sources
                .get(&reference.source)
                .cloned()
                .ok_or_else(|| OryxError::SourceNotFound {
                    name: reference.source.clone(),
                })?
        };

        let image_root = Resolver::image_root(&source, &reference.image);
        let image = self.resolver.fetch_descriptor(&image_root, &reference.image)?;

        let path = self.guest_path(name);
        self.installer.install(name, &path, &image_root, &image)?;

        let mut guard = self.store.acquire()?;
        if guard.state().guests.contains_key(name) {
            // Lost a race against a concurrent install of the same
            // name; their record stands, as does the directory the
            // winning install renamed into place.
            return Err(OryxError::GuestExists {
                name: name.to_owned(),
            });
        }
        guard.state_mut().guests.insert(
            name.to_owned(),
            Guest {
                image_name: reference.image.clone(),
                image,
                source_name: reference.source.clone(),
                source,
                path,
                autostart_enabled: 0,
            },
        );
        guard.commit()?;
        info!(name, reference = %reference, "added guest");
        Ok(())
    }

    /// Deletes the guest's directory tree, then its record. A crash
    /// between the two leaves a dangling record; re-running the removal
    /// tolerates the already-missing directory and clears it.
    pub fn remove_guest(&self, name: &str) -> Result<(), OryxError> {
        let mut guard = self.store.acquire()?;
        let path = guard
            .state()
            .guests
            .get(name)
            .map(|guest| guest.path.clone())
            .ok_or_else(|| OryxError::GuestNotFound {
                name: name.to_owned(),
            })?;

        debug!(path = %path.display(), "deleting guest data");
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|err| OryxError::RemoveGuestData {
                path: path.clone(),
                source: err,
            })?;
        }

        guard.state_mut().guests.shift_remove(name);
        guard.commit()?;
        info!(name, "removed guest");
        Ok(())
    }

    /// Names of all registered guests, in installation order.
    pub fn list_guests(&self) -> Result<Vec<String>, OryxError> {
        let guard = self.store.acquire()?;
        Ok(guard.state().guests.keys().cloned().collect())
    }

    pub fn show_guest(&self, name: &str) -> Result<Guest, OryxError> {
        let guard = self.store.acquire()?;
        guard
            .state()
            .guests
            .get(name)
            .cloned()
            .ok_or_else(|| OryxError::GuestNotFound {
                name: name.to_owned(),
            })
    }

    /// Enables autostart. Rejects a second enable with
    /// [`OryxError::AlreadyEnabled`] to surface caller mistakes rather
    /// than silently succeeding twice.
    pub fn enable_guest(&self, name: &str) -> Result<(), OryxError> {
        self.set_autostart(name, true)
    }

    /// Disables autostart; the mirror image of [`Self::enable_guest`].
    pub fn disable_guest(&self, name: &str) -> Result<(), OryxError> {
        self.set_autostart(name, false)
    }

    fn set_autostart(&self, name: &str, enabled: bool) -> Result<(), OryxError> {
        let mut guard = self.store.acquire()?;
        let guest = guard
            .state_mut()
            .guests
            .get_mut(name)
            .ok_or_else(|| OryxError::GuestNotFound {
                name: name.to_owned(),
            })?;

        let target = u8::from(enabled);
        if guest.autostart_enabled == target {
            return Err(if enabled {
                OryxError::AlreadyEnabled {
                    name: name.to_owned(),
                }
            } else {
                OryxError::AlreadyDisabled {
                    name: name.to_owned(),
                }
            });
        }

        guest.autostart_enabled = target;
        guard.commit()?;
        info!(name, enabled, "changed guest autostart");
        Ok(())
    }

    /// Delegates a verbatim argument list to the external runtime with
    /// the guest's directory as working directory. The arguments are
    /// not interpreted here; start/stop/exec semantics belong entirely
    /// to the runtime.
    pub fn runtime(&self, name: &str, args: &[String]) -> Result<(), OryxError> {
        let path = {
            let guard = self.store.acquire()?;
            guard
                .state()
                .guests
                .get(name)
                .map(|guest| guest.path.clone())
                .ok_or_else(|| OryxError::GuestNotFound {
                    name: name.to_owned(),
                })?
        };

        debug!(runtime = %self.runtime.display(), ?args, "invoking runtime");
        let status = Command::new(&self.runtime)
            .args(args)
            .current_dir(&path)
            .status()
            .map_err(|err| OryxError::Runtime {
                runtime: self.runtime.clone(),
                source: err,
            })?;

        if !status.success() {
            return Err(OryxError::RuntimeFailed {
                runtime: self.runtime.clone(),
                status,
            });
        }
        Ok(())
    }
}
