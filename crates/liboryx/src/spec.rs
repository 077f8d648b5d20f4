//! The generated runtime spec (`config.json`) and the patch applied to it
//!
//! The external runtime generates a baseline spec; only the handful of
//! fields the patch touches are modeled here. Everything else round
//! trips through flattened passthrough maps so rewriting the file is
//! not lossy.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("failed to read runtime spec {path:?}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse runtime spec {path:?}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("runtime spec is missing the {section:?} section")]
    MissingSection { section: &'static str },
    #[error("failed to split entrypoint command {command:?}")]
    Command {
        command: String,
        source: shell_words::ParseError,
    },
    #[error("failed to write runtime spec {path:?}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Partial view of the OCI runtime spec, restricted to the fields the
/// guest patch rewrites.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RuntimeSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<Root>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process: Option<Process>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hooks: Option<Hooks>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Root {
    #[serde(skip_serializing_if = "Option::is_none")]
    readonly: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Process {
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<Vec<String>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct Hooks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    prestart: Vec<Hook>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Hook {
    path: PathBuf,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RuntimeSpec {
    pub const SPEC_FILE: &'static str = "config.json";

    pub fn file_path(guest_dir: &Path) -> PathBuf {
        guest_dir.join(Self::SPEC_FILE)
    }

    pub fn load(guest_dir: &Path) -> Result<Self, SpecError> {
        let path = Self::file_path(guest_dir);
        let raw = fs::read_to_string(&path).map_err(|err| SpecError::Read {
            path: path.clone(),
            source: err,
        })?;
        serde_json::from_str(&raw).map_err(|err| SpecError::Parse { path, source: err })
    }

    pub fn save(&self, guest_dir: &Path) -> Result<(), SpecError> {
        let path = Self::file_path(guest_dir);
        // Serialization of this structure cannot fail; surface the
        // error through the write variant anyway rather than panic.
        let mut serialized = serde_json::to_string_pretty(self).map_err(|err| SpecError::Write {
            path: path.clone(),
            source: err.into(),
        })?;
        serialized.push('\n');
        fs::write(&path, serialized).map_err(|err| SpecError::Write { path, source: err })
    }

    /// Rewrites the baseline spec for one guest: registers the netns
    /// pre-start hook, makes the rootfs writable, sets the hostname to
    /// the guest name, and wraps the image command in the init wrapper.
    pub fn patch(
        &mut self,
        name: &str,
        command: &str,
        init: &Path,
        netns_hook: &Path,
    ) -> Result<(), SpecError> {
        self.hooks
            .get_or_insert_with(Hooks::default)
            .prestart
            .push(Hook {
                path: netns_hook.to_owned(),
                extra: Map::new(),
            });

        self.root
            .as_mut()
            .ok_or(SpecError::MissingSection { section: "root" })?
            .readonly = Some(false);

        self.hostname = Some(name.to_owned());

        let command_args = shell_words::split(command).map_err(|err| SpecError::Command {
            command: command.to_owned(),
            source: err,
        })?;
        let mut args = vec![init.to_string_lossy().into_owned()];
        args.extend(command_args);
        self.process
            .as_mut()
            .ok_or(SpecError::MissingSection { section: "process" })?
            .args = Some(args);

        Ok(())
    }
}
