//! Configuration for the coverage reader.

use crate::padding::{DEFAULT_PADDING, MAX_PADDING};
use crate::types::{DecimationPolicy, InterpolationMethod, OverviewPolicy};
use serde::{Deserialize, Serialize};

/// Reader-wide defaults, applied when a read does not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Overview policy used when a read passes none.
    pub overview_policy: OverviewPolicy,

    /// Decimation policy used when a read passes none.
    pub decimation_policy: DecimationPolicy,

    /// Base padding in pixels added around requested windows.
    pub padding: usize,

    /// Sample the requested grid instead of mapping it onto the read bounds
    /// when estimating the requested resolution across CRSs.
    pub accurate_resolution: bool,

    /// Interpolation assumed by [`crate::CoverageReader::plan_read`] when
    /// the read parameters carry none.
    pub interpolation: InterpolationMethod,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            overview_policy: OverviewPolicy::Nearest,
            decimation_policy: DecimationPolicy::Allow,
            padding: DEFAULT_PADDING,
            accurate_resolution: false,
            interpolation: InterpolationMethod::Nearest,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COVERAGE_OVERVIEW_POLICY") {
            config.overview_policy = OverviewPolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("COVERAGE_DECIMATION_POLICY") {
            config.decimation_policy = DecimationPolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("COVERAGE_READ_PADDING") {
            if let Ok(padding) = val.parse() {
                config.padding = padding;
            }
        }

        if let Ok(val) = std::env::var("COVERAGE_ACCURATE_RESOLUTION") {
            config.accurate_resolution = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("COVERAGE_INTERPOLATION") {
            config.interpolation = InterpolationMethod::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.padding > MAX_PADDING {
            return Err(format!("padding must be <= {}", MAX_PADDING));
        }

        Ok(())
    }
}

/// Per-read parameters.
///
/// Unlike [`ReaderConfig`], an explicit read asks for
/// [`OverviewPolicy::FORMAT_DEFAULT`] unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadParameters {
    pub overview_policy: OverviewPolicy,
    pub decimation_policy: DecimationPolicy,
    /// Interpolation the caller will resample with; `None` falls back to the
    /// reader configuration.
    pub interpolation: Option<InterpolationMethod>,
}

impl Default for ReadParameters {
    fn default() -> Self {
        Self {
            overview_policy: OverviewPolicy::FORMAT_DEFAULT,
            decimation_policy: DecimationPolicy::Allow,
            interpolation: None,
        }
    }
}

impl ReadParameters {
    pub fn with_overview_policy(mut self, policy: OverviewPolicy) -> Self {
        self.overview_policy = policy;
        self
    }

    pub fn with_decimation_policy(mut self, policy: DecimationPolicy) -> Self {
        self.decimation_policy = policy;
        self
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationMethod) -> Self {
        self.interpolation = Some(interpolation);
        self
    }
}
