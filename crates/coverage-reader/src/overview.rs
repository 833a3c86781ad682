//! Overview level selection.
//!
//! A coverage is stored at its full resolution plus a pyramid of reduced
//! resolution overviews. [`ResolutionLevels`] is the table of those levels
//! sorted from finest to coarsest; [`ResolutionLevels::pick_level`] chooses
//! which one to decode for a requested resolution under an
//! [`OverviewPolicy`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::types::{OverviewPolicy, Resolution, FULL_RESOLUTION_LEVEL};

/// One entry of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionLevel {
    /// Ratio of this level's x resolution to the full x resolution.
    pub scale_factor: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    /// 0 for the full-resolution level, `k + 1` for overview `k`.
    pub level_index: usize,
}

impl ResolutionLevel {
    pub fn new(scale_factor: f64, resolution_x: f64, resolution_y: f64, level_index: usize) -> Self {
        Self {
            scale_factor,
            resolution_x,
            resolution_y,
            level_index,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.resolution_x, self.resolution_y)
    }
}

/// Levels of a coverage sorted by ascending scale factor.
///
/// The first entry is always the full-resolution level with scale factor 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionLevels {
    levels: Vec<ResolutionLevel>,
}

impl ResolutionLevels {
    /// Build the table from the native resolution and the overview
    /// resolutions, in storage order.
    ///
    /// Returns `None` when the native resolution is unusable. Overviews with
    /// invalid resolutions, or finer than the native one, are skipped.
    pub fn build(full: Resolution, overviews: &[Resolution]) -> Option<Self> {
        if !full.is_valid() {
            tracing::warn!(
                resolution_x = full.x,
                resolution_y = full.y,
                "Invalid native resolution, overviews disabled"
            );
            return None;
        }

        let mut levels = Vec::with_capacity(overviews.len() + 1);
        levels.push(ResolutionLevel::new(1.0, full.x, full.y, FULL_RESOLUTION_LEVEL));

        for (i, overview) in overviews.iter().enumerate() {
            let level_index = i + 1;
            if !overview.is_valid() {
                tracing::warn!(
                    level = level_index,
                    resolution_x = overview.x,
                    resolution_y = overview.y,
                    "Skipping overview with invalid resolution"
                );
                continue;
            }

            let scale_factor = overview.x / full.x;
            if scale_factor < 1.0 {
                tracing::warn!(
                    level = level_index,
                    scale_factor,
                    "Skipping overview finer than the native resolution"
                );
                continue;
            }

            levels.push(ResolutionLevel::new(scale_factor, overview.x, overview.y, level_index));
        }

        // Stable, so the full-resolution level stays first among equal factors.
        levels.sort_by(|a, b| a.scale_factor.total_cmp(&b.scale_factor));

        tracing::debug!(
            levels = levels.len(),
            max_scale_factor = levels.last().map(|l| l.scale_factor).unwrap_or(1.0),
            "Built resolution level table"
        );

        Some(Self { levels })
    }

    /// All levels, finest first.
    pub fn levels(&self) -> &[ResolutionLevel] {
        &self.levels
    }

    /// Number of overviews in the table, excluding the full-resolution level.
    pub fn num_overviews(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn full(&self) -> &ResolutionLevel {
        &self.levels[0]
    }

    pub fn coarsest(&self) -> &ResolutionLevel {
        &self.levels[self.levels.len() - 1]
    }

    pub fn full_resolution(&self) -> Resolution {
        self.full().resolution()
    }

    /// Level with the given storage index.
    pub fn level(&self, level_index: usize) -> Option<&ResolutionLevel> {
        self.levels.iter().find(|l| l.level_index == level_index)
    }

    /// Scale factor of a requested resolution along its least-reduced axis.
    pub fn requested_scale_factor(&self, requested: Resolution) -> f64 {
        let full = self.full();
        let scale_x = requested.x / full.resolution_x;
        let scale_y = requested.y / full.resolution_y;
        scale_x.min(scale_y)
    }

    /// Pick the level to decode for `requested` under `policy`.
    ///
    /// Requests at or finer than the full resolution get level 0; requests
    /// at or coarser than the coarsest overview get that overview. Anything
    /// in between lands on one of the two levels bracketing it.
    pub fn pick_level(&self, policy: OverviewPolicy, requested: Resolution) -> usize {
        if policy == OverviewPolicy::Ignore {
            return FULL_RESOLUTION_LEVEL;
        }

        let requested_scale = self.requested_scale_factor(requested);
        if requested_scale.is_nan() {
            tracing::debug!(?requested, "Requested resolution not comparable, using full resolution");
            return FULL_RESOLUTION_LEVEL;
        }

        let full = self.full();
        if requested_scale <= 1.0 {
            return full.level_index;
        }

        let coarsest = self.coarsest();
        if requested_scale >= coarsest.scale_factor {
            return coarsest.level_index;
        }

        let last = self.levels.len() - 1;
        let mut prev = full;
        for (i, curr) in self.levels.iter().enumerate().skip(1) {
            if curr.scale_factor == requested_scale {
                return curr.level_index;
            }
            if curr.scale_factor > requested_scale || i == last {
                return self.choose(policy, requested_scale, prev, curr).level_index;
            }
            prev = curr;
        }

        full.level_index
    }

    /// Decide between the finer level `prev` and the coarser level `curr`.
    fn choose<'l>(
        &'l self,
        policy: OverviewPolicy,
        requested_scale: f64,
        prev: &'l ResolutionLevel,
        curr: &'l ResolutionLevel,
    ) -> &'l ResolutionLevel {
        match policy {
            OverviewPolicy::Ignore => self.full(),
            OverviewPolicy::Quality => prev,
            OverviewPolicy::Speed => curr,
            OverviewPolicy::Nearest => {
                if requested_scale - prev.scale_factor <= curr.scale_factor - requested_scale {
                    prev
                } else {
                    curr
                }
            }
        }
    }
}

/// Owns the level table of a reader and builds it on first use.
///
/// Concurrent first callers race to build the table; exactly one build is
/// kept and every caller sees the same table afterwards.
#[derive(Debug, Default)]
pub struct OverviewsController {
    levels: OnceCell<Option<Arc<ResolutionLevels>>>,
}

impl OverviewsController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A controller whose table is already known.
    pub fn with_levels(levels: Option<ResolutionLevels>) -> Self {
        Self {
            levels: OnceCell::with_value(levels.map(Arc::new)),
        }
    }

    /// The level table, building it with `build` if this is the first call.
    pub fn resolution_levels<F>(&self, build: F) -> Option<Arc<ResolutionLevels>>
    where
        F: FnOnce() -> Option<ResolutionLevels>,
    {
        self.levels.get_or_init(|| build().map(Arc::new)).clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.levels.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyramid() -> ResolutionLevels {
        ResolutionLevels::build(
            Resolution::uniform(1.0),
            &[
                Resolution::uniform(2.0),
                Resolution::uniform(4.0),
                Resolution::uniform(8.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_build_sorts_levels() {
        let levels = ResolutionLevels::build(
            Resolution::uniform(10.0),
            &[Resolution::uniform(40.0), Resolution::uniform(20.0)],
        )
        .unwrap();
        let indices: Vec<usize> = levels.levels().iter().map(|l| l.level_index).collect();
        assert_eq!(indices, vec![0, 2, 1]);
        assert_eq!(levels.coarsest().scale_factor, 4.0);
        assert_eq!(levels.num_overviews(), 2);
    }

    #[test]
    fn test_build_rejects_invalid_native() {
        assert!(ResolutionLevels::build(Resolution::uniform(0.0), &[]).is_none());
        assert!(ResolutionLevels::build(Resolution::new(f64::NAN, 1.0), &[]).is_none());
    }

    #[test]
    fn test_build_skips_invalid_overviews() {
        let levels = ResolutionLevels::build(
            Resolution::uniform(1.0),
            &[Resolution::uniform(0.0), Resolution::uniform(0.5), Resolution::uniform(3.0)],
        )
        .unwrap();
        assert_eq!(levels.levels().len(), 2);
        assert_eq!(levels.coarsest().level_index, 3);
    }

    #[test]
    fn test_exact_match() {
        let levels = pyramid();
        for policy in [OverviewPolicy::Nearest, OverviewPolicy::Quality, OverviewPolicy::Speed] {
            assert_eq!(levels.pick_level(policy, Resolution::uniform(4.0)), 2);
        }
    }

    #[test]
    fn test_nearest_tie_goes_to_finer_level() {
        let levels = pyramid();
        assert_eq!(levels.pick_level(OverviewPolicy::Nearest, Resolution::uniform(3.0)), 1);
        assert_eq!(levels.pick_level(OverviewPolicy::Nearest, Resolution::uniform(3.1)), 2);
    }

    #[test]
    fn test_nan_request() {
        let levels = pyramid();
        assert_eq!(
            levels.pick_level(OverviewPolicy::Speed, Resolution::uniform(f64::NAN)),
            FULL_RESOLUTION_LEVEL
        );
    }

    #[test]
    fn test_controller_builds_once() {
        let controller = OverviewsController::new();
        assert!(!controller.is_initialized());

        let first = controller.resolution_levels(|| Some(pyramid())).unwrap();
        let second = controller.resolution_levels(|| panic!("table rebuilt")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(controller.is_initialized());
    }

    #[test]
    fn test_controller_remembers_missing_table() {
        let controller = OverviewsController::with_levels(None);
        assert!(controller.is_initialized());
        assert!(controller.resolution_levels(|| Some(pyramid())).is_none());
    }
}
