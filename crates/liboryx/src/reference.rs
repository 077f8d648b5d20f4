//! Qualified image references of the form `<source>:<image>`
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("invalid image reference {reference:?}, expected \"<source>:<image>\"")]
    Invalid { reference: String },
}

/// Parsed `(source, image)` pair. Exactly one colon with non-empty
/// segments on both sides; anything else is rejected up front, before
/// any state or network access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub source: String,
    pub image: String,
}

impl FromStr for ImageReference {
    type Err = ReferenceError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let mut parts = reference.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(source), Some(image), None) if !source.is_empty() && !image.is_empty() => {
                Ok(Self {
                    source: source.to_owned(),
                    image: image.to_owned(),
                })
            }
            _ => Err(ReferenceError::Invalid {
                reference: reference.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.image)
    }
}
