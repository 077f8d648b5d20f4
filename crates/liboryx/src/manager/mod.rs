//! High-level registry operations over sources and guests
//!
//! Every operation is one acquire/commit (or acquire/discard) cycle on
//! the state store; see the per-operation files for the exceptions
//! around guest installation, where long-running network and filesystem
//! work deliberately runs outside the lock.
mod guests;
mod sources;

use std::path::{Path, PathBuf};

use crate::installer::Installer;
use crate::resolver::Resolver;
use crate::store::StateStore;

/// Defaults matching the deployed host layout.
const DEFAULT_ROOT: &str = "/var/lib/oryx-guests";
const DEFAULT_RUNTIME: &str = "runc";
const DEFAULT_INIT: &str = "/sbin/dumb-init";
const DEFAULT_NETNS_HOOK: &str = "/usr/sbin/netns";

/// Host paths the manager operates with. `Default` matches the
/// deployed layout; tests redirect all four.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Directory holding the state file and one subdirectory per guest.
    pub root: PathBuf,
    /// External OCI runtime binary, used for spec generation and for
    /// verbatim pass-through invocations.
    pub runtime: PathBuf,
    /// PID 1 wrapper prepended to every guest entrypoint.
    pub init: PathBuf,
    /// Network namespace setup hook registered in every generated spec.
    pub netns_hook: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            runtime: PathBuf::from(DEFAULT_RUNTIME),
            init: PathBuf::from(DEFAULT_INIT),
            netns_hook: PathBuf::from(DEFAULT_NETNS_HOOK),
        }
    }
}

impl ManagerConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

/// The source and guest registry.
pub struct GuestManager {
    store: StateStore,
    resolver: Resolver,
    installer: Installer,
    root: PathBuf,
    runtime: PathBuf,
}

impl GuestManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            store: StateStore::new(&config.root),
            resolver: Resolver::new(),
            installer: Installer::new(
                config.runtime.clone(),
                config.init,
                config.netns_hook,
            ),
            root: config.root.clone(),
            runtime: config.runtime,
        }
    }

    /// The directory exclusively owned by the named guest.
    fn guest_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of the backing state file.
    pub fn state_file_path(&self) -> &Path {
        self.store.path()
    }
}
