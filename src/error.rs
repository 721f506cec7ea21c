use std::fmt;
use thiserror::Error;

/// Build options the remote build cannot honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedFeature {
    ContinuousMode,
    IncludedBuilds,
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContinuousMode => write!(f, "continuous mode is not supported yet"),
            Self::IncludedBuilds => write!(f, "included builds are not supported yet"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MirakleError {
    #[error("{0}")]
    UnsupportedFeature(UnsupportedFeature),
    #[error("host does not provide a {0}; register it when the plugin is applied")]
    MissingCapability(String),
}
