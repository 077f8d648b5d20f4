//! # liboryx
//! Control plane library for guest containers on a single Oryx host. It
//! tracks image sources and installed guests in a lock-guarded state
//! document, turns remote image references into unpacked root
//! filesystems, and generates the configuration consumed by an external
//! OCI runtime. Process execution itself is delegated to that runtime.
pub mod error;
pub mod installer;
pub mod manager;
pub mod reference;
pub mod resolver;
pub mod spec;
pub mod state;
pub mod store;

pub use error::OryxError;
pub use manager::{GuestManager, ManagerConfig};
pub use reference::ImageReference;
pub use state::{Guest, ImageDescriptor, Source, State};
pub use store::{StateGuard, StateStore};
