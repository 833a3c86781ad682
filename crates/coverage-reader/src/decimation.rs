//! Subsampling of the chosen level.
//!
//! Overviews only come in a few fixed steps, so the level picked for a read
//! is usually still finer than requested. The decoder can close the gap by
//! reading only every n-th column and row of that level.

use crate::types::{DecimationPolicy, Resolution, SubsamplingFactors};

/// Decides how much the decoder may subsample a level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimationController {
    policy: DecimationPolicy,
}

impl DecimationController {
    pub fn new(policy: DecimationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DecimationPolicy {
        self.policy
    }

    /// Subsampling for a level of `raster_size` pixels at `level_resolution`,
    /// or none when decimation is disallowed.
    pub fn subsampling(
        &self,
        requested: Option<Resolution>,
        raster_size: (usize, usize),
        level_resolution: Resolution,
    ) -> SubsamplingFactors {
        match self.policy {
            DecimationPolicy::Disallow => SubsamplingFactors::NONE,
            DecimationPolicy::Allow => compute_subsampling(requested, raster_size, level_resolution),
        }
    }
}

/// Per-axis subsampling turning `level_resolution` into at most `requested`.
///
/// Each factor is `floor(requested / level)`, at least 1, and never larger
/// than the level size on that axis, so the decoded raster keeps at least
/// one pixel. Without a requested resolution no subsampling happens.
pub fn compute_subsampling(
    requested: Option<Resolution>,
    raster_size: (usize, usize),
    level_resolution: Resolution,
) -> SubsamplingFactors {
    let Some(requested) = requested else {
        return SubsamplingFactors::NONE;
    };

    SubsamplingFactors::new(
        axis_factor(requested.x, level_resolution.x, raster_size.0),
        axis_factor(requested.y, level_resolution.y, raster_size.1),
    )
}

fn axis_factor(requested: f64, level: f64, size: usize) -> u32 {
    let ratio = requested / level;
    let factor = if ratio.is_finite() && ratio >= 1.0 {
        ratio.floor().min(u32::MAX as f64) as u32
    } else {
        1
    };

    // Largest factor for which size / factor is still positive.
    let max_factor = u32::try_from(size).unwrap_or(u32::MAX).max(1);
    factor.clamp(1, max_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_of_ratio() {
        assert_eq!(axis_factor(2.9, 1.0, 100), 2);
        assert_eq!(axis_factor(3.0, 1.0, 100), 3);
        assert_eq!(axis_factor(0.5, 1.0, 100), 1);
    }

    #[test]
    fn test_factor_limited_by_size() {
        assert_eq!(axis_factor(1000.0, 1.0, 7), 7);
        assert_eq!(axis_factor(1000.0, 1.0, 0), 1);
    }

    #[test]
    fn test_non_finite_ratio() {
        assert_eq!(axis_factor(f64::NAN, 1.0, 10), 1);
        assert_eq!(axis_factor(1.0, 0.0, 10), 1);
    }

    #[test]
    fn test_disallow() {
        let controller = DecimationController::new(DecimationPolicy::Disallow);
        assert_eq!(
            controller.subsampling(Some(Resolution::uniform(8.0)), (100, 100), Resolution::uniform(1.0)),
            SubsamplingFactors::NONE
        );
    }
}
