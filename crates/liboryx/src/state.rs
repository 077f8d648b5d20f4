//! The persisted registry document and its record types
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The single persisted aggregate. A missing top-level key in the
/// backing file deserializes to an empty map, never an error.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct State {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub sources: IndexMap<String, Source>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub guests: IndexMap<String, Guest>,
}

/// A named remote location publishing installable guest images.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Root URL under which per-image subdirectories are published.
    pub url: String,
}

/// Metadata published alongside an image, fetched from the source as
/// `image.json`. Keys not modeled here are carried through unchanged so
/// the provenance snapshot embedded in a guest record stays complete.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImageDescriptor {
    #[serde(rename = "SYSTEM_PROFILE")]
    pub system_profile: String,
    /// Relative path of the rootfs archive below the image root.
    #[serde(rename = "ARCHIVE")]
    pub archive: String,
    /// Shell command line run as the container entrypoint.
    #[serde(rename = "COMMAND")]
    pub command: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ImageDescriptor {
    /// Profile an image must declare to be installable as a guest.
    pub const GUEST_PROFILE: &'static str = "guest";

    pub fn is_guest(&self) -> bool {
        self.system_profile == Self::GUEST_PROFILE
    }
}

/// An installed, runnable container instance derived from one image.
///
/// `source_name` is a soft reference; the `source` and `image`
/// snapshots keep the record self-describing even after the source is
/// removed from the registry.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Guest {
    pub image_name: String,
    pub image: ImageDescriptor,
    pub source_name: String,
    pub source: Source,
    /// Exclusively-owned directory holding `rootfs/` and `config.json`.
    pub path: PathBuf,
    /// Persisted as integer 0/1 for state file compatibility.
    pub autostart_enabled: u8,
}

impl Guest {
    pub fn autostart(&self) -> bool {
        self.autostart_enabled != 0
    }
}
