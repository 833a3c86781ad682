//! Common test fixtures for coverage reading tests.
//!
//! Coverages are described by [`grid::GridSpec`]s; pyramids are plain
//! `(resolution_x, resolution_y)` lists so they can feed any reader type.

use coverage_common::{BoundingBox, Crs};

/// Common envelopes for testing.
pub mod bbox {
    use coverage_common::BoundingBox;

    /// Global geographic envelope.
    pub const GLOBAL: BoundingBox = BoundingBox {
        min_x: -180.0,
        min_y: -90.0,
        max_x: 180.0,
        max_y: 90.0,
    };

    /// Continental United States.
    pub const CONUS: BoundingBox = BoundingBox {
        min_x: -130.0,
        min_y: 20.0,
        max_x: -60.0,
        max_y: 55.0,
    };

    /// A one-degree tile.
    pub const SMALL_TILE: BoundingBox = BoundingBox {
        min_x: -100.0,
        min_y: 40.0,
        max_x: -99.0,
        max_y: 41.0,
    };

    /// The square Web Mercator world, in meters.
    pub const WEB_MERCATOR_WORLD: BoundingBox = BoundingBox {
        min_x: -20_037_508.342_789_244,
        min_y: -20_037_508.342_789_244,
        max_x: 20_037_508.342_789_244,
        max_y: 20_037_508.342_789_244,
    };
}

/// Common grid specifications for testing.
pub mod grid {
    use coverage_common::BoundingBox;

    /// GFS global grid (0.25 degree resolution)
    pub const GFS_GLOBAL: GridSpec = GridSpec {
        width: 1440,
        height: 720,
        envelope: super::bbox::GLOBAL,
    };

    /// 1024 x 1024 pixels of 1 unit each.
    pub const UNIT_1024: GridSpec = GridSpec {
        width: 1024,
        height: 1024,
        envelope: BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1024.0,
            max_y: 1024.0,
        },
    };

    /// Standard tile size (256x256)
    pub const TILE_256: GridSpec = GridSpec {
        width: 256,
        height: 256,
        envelope: super::bbox::GLOBAL,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub envelope: BoundingBox,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the resolution in CRS units.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = self.envelope.width() / self.width as f64;
            let dy = self.envelope.height() / self.height as f64;
            (dx, dy)
        }
    }
}

/// Resolutions of `count` overviews each twice as coarse as the previous,
/// starting from `native`.
pub fn power_of_two_pyramid(native: (f64, f64), count: usize) -> Vec<(f64, f64)> {
    (1..=count)
        .map(|level| {
            let factor = (1u64 << level) as f64;
            (native.0 * factor, native.1 * factor)
        })
        .collect()
}

/// Overview resolutions at arbitrary scale factors of `native`.
pub fn pyramid_with_factors(native: (f64, f64), factors: &[f64]) -> Vec<(f64, f64)> {
    factors
        .iter()
        .map(|factor| (native.0 * factor, native.1 * factor))
        .collect()
}

pub fn wgs84() -> Crs {
    Crs::wgs84()
}

pub fn web_mercator() -> Crs {
    Crs::web_mercator()
}

/// `envelope` shrunk towards its center by `factor` on each axis.
pub fn shrink(envelope: &BoundingBox, factor: f64) -> BoundingBox {
    let (cx, cy) = envelope.center();
    let half_w = envelope.width() / (2.0 * factor);
    let half_h = envelope.height() / (2.0 * factor);
    BoundingBox::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
}
