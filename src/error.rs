//! Error kinds surfaced by the loader, the server client and pipeline setup.
//!
//! Fetch and parse failures are recoverable: callers log them and keep the
//! last known state. A [`Error::ShaderLink`] is fatal for the session.

/// Boxed cause of a failed fetch (I/O or HTTP).
pub type FetchCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Network, I/O or non-2xx response while retrieving `location`.
    #[error("could not fetch `{location}`: {source}")]
    Fetch {
        location: String,
        #[source]
        source: FetchCause,
    },

    /// Malformed mesh, material or JSON text, or an empty result set.
    #[error("could not parse `{what}`: {reason}")]
    Parse { what: String, reason: String },

    /// The render pipeline failed validation.
    #[error("shader program `{label}` failed to link: {reason}")]
    ShaderLink { label: String, reason: String },
}

impl Error {
    pub fn fetch(location: impl Into<String>, source: impl Into<FetchCause>) -> Self {
        Self::Fetch {
            location: location.into(),
            source: source.into(),
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
