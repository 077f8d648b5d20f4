//! Top-level error type for registry operations
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::installer::InstallError;
use crate::reference::ReferenceError;
use crate::resolver::ResolveError;
use crate::spec::SpecError;
use crate::store::StoreError;

/// Everything a registry operation can fail with. Precondition
/// violations carry the offending name; mechanism failures wrap the
/// per-module error they came from.
#[derive(Debug, thiserror::Error)]
pub enum OryxError {
    #[error("source {name:?} already defined")]
    SourceExists { name: String },
    #[error("source {name:?} not defined")]
    SourceNotFound { name: String },
    #[error("guest {name:?} already defined")]
    GuestExists { name: String },
    #[error("guest {name:?} not defined")]
    GuestNotFound { name: String },
    #[error("guest {name:?} already enabled")]
    AlreadyEnabled { name: String },
    #[error("guest {name:?} already disabled")]
    AlreadyDisabled { name: String },
    #[error("failed to remove guest data at {path:?}")]
    RemoveGuestData {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to invoke runtime {runtime:?}")]
    Runtime {
        runtime: PathBuf,
        source: std::io::Error,
    },
    #[error("runtime {runtime:?} exited with {status}")]
    RuntimeFailed {
        runtime: PathBuf,
        status: ExitStatus,
    },
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
