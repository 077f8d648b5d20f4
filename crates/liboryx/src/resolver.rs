//! Fetching image descriptors from a source
use reqwest::blocking::Client;

use crate::state::{ImageDescriptor, Source};

/// Descriptor document published at the image root.
const DESCRIPTOR_FILE: &str = "image.json";

/// Fixed path segment between the source URL and the image name.
const IMAGE_KIND: &str = "guest";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to fetch image descriptor from {url}")]
    Fetch { url: String, source: reqwest::Error },
    #[error("malformed image descriptor at {url}")]
    MalformedDescriptor {
        url: String,
        source: serde_json::Error,
    },
    #[error("image {image:?} is not a guest image (SYSTEM_PROFILE = {profile:?})")]
    NotAGuestImage { image: String, profile: String },
}

/// Resolves a `(source, image)` pair into a validated descriptor.
/// Reachability of a source is only ever discovered here, not when the
/// source is registered.
pub struct Resolver {
    http: Client,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Root URL under which all of an image's files are published.
    pub fn image_root(source: &Source, image: &str) -> String {
        format!("{}/{IMAGE_KIND}/{image}", source.url.trim_end_matches('/'))
    }

    /// Fetches and parses `image.json` below `image_root` and validates
    /// the image profile.
    pub fn fetch_descriptor(
        &self,
        image_root: &str,
        image: &str,
    ) -> Result<ImageDescriptor, ResolveError> {
        let url = format!("{image_root}/{DESCRIPTOR_FILE}");
        tracing::debug!(url = %url, "retrieving image descriptor");

        let body = self
            .http
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|err| ResolveError::Fetch {
                url: url.clone(),
                source: err,
            })?;

        let descriptor: ImageDescriptor =
            serde_json::from_str(&body).map_err(|err| ResolveError::MalformedDescriptor {
                url,
                source: err,
            })?;

        if !descriptor.is_guest() {
            return Err(ResolveError::NotAGuestImage {
                image: image.to_owned(),
                profile: descriptor.system_profile,
            });
        }

        Ok(descriptor)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
