use crate::error::{MirakleError, UnsupportedFeature};
use serde::{Deserialize, Serialize};

/// Options the build was started with, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartParameters {
    pub continuous: bool,
    pub included_builds: Vec<String>,
    pub build_scan: bool,
    pub no_build_scan: bool,
}

impl StartParameters {
    /// Fails on the first option the remote build cannot run with.
    pub fn assert_supported(&self) -> Result<(), MirakleError> {
        if self.continuous {
            return Err(MirakleError::UnsupportedFeature(
                UnsupportedFeature::ContinuousMode,
            ));
        }

        if !self.included_builds.is_empty() {
            return Err(MirakleError::UnsupportedFeature(
                UnsupportedFeature::IncludedBuilds,
            ));
        }

        Ok(())
    }

    /// Fresh parameters for a delegated run. Only the build scan flags carry over.
    pub fn copy_for_delegate(&self) -> Self {
        Self {
            build_scan: self.build_scan,
            no_build_scan: self.no_build_scan,
            ..Self::default()
        }
    }
}
