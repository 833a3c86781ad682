//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoverageError, CoverageResult};

/// Well-known CRS codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 Geographic
    Epsg4269,
    /// Albers Equal Area (CONUS)
    Epsg5070,
    /// Polar Stereographic North
    Epsg3413,
    /// Polar Stereographic South
    Epsg3031,
    /// Any other EPSG code; only equality is meaningful for these.
    Epsg(u32),
}

impl CrsCode {
    /// Parse an authority code string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    /// - "EPSG:32633" (mapped to [`CrsCode::Epsg`])
    pub fn from_code_string(s: &str) -> CoverageResult<Self> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:4269" => Ok(CrsCode::Epsg4269),
            "EPSG:5070" => Ok(CrsCode::Epsg5070),
            "EPSG:3413" => Ok(CrsCode::Epsg3413),
            "EPSG:3031" => Ok(CrsCode::Epsg3031),
            other => other
                .strip_prefix("EPSG:")
                .and_then(|code| code.parse::<u32>().ok())
                .map(CrsCode::from_epsg)
                .ok_or_else(|| CoverageError::invalid_crs(s.to_string())),
        }
    }

    /// Map a numeric EPSG code to its well-known variant when there is one.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            3857 | 900913 => CrsCode::Epsg3857,
            4269 => CrsCode::Epsg4269,
            5070 => CrsCode::Epsg5070,
            3413 => CrsCode::Epsg3413,
            3031 => CrsCode::Epsg3031,
            other => CrsCode::Epsg(other),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg5070 => 5070,
            CrsCode::Epsg3413 => 3413,
            CrsCode::Epsg3031 => 3031,
            CrsCode::Epsg(code) => *code,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

/// A horizontal CRS reference.
///
/// The `name` and `axis_order` are descriptive metadata: two CRS with the
/// same code describe the same coordinate space even when they differ there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    pub code: CrsCode,
    pub name: Option<String>,
    pub axis_order: AxisOrder,
}

impl Crs {
    pub fn new(code: CrsCode) -> Self {
        Self {
            code,
            name: None,
            axis_order: AxisOrder::XY,
        }
    }

    /// A CRS carrying a descriptive name.
    pub fn named(code: CrsCode, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(code)
        }
    }

    pub fn wgs84() -> Self {
        Self::new(CrsCode::Epsg4326)
    }

    pub fn web_mercator() -> Self {
        Self::new(CrsCode::Epsg3857)
    }

    /// Parse from an authority code string such as "EPSG:3857".
    pub fn from_code_string(s: &str) -> CoverageResult<Self> {
        CrsCode::from_code_string(s).map(Self::new)
    }

    /// Compare the coordinate space only, ignoring names and axis-order hints.
    pub fn equals_ignore_metadata(&self, other: &Crs) -> bool {
        self.code == other.code
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        self.code.is_geographic()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.code, name),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_code_string("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_code_string("epsg:3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::from_code_string("CRS:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_code_string("EPSG:32633").unwrap(),
            CrsCode::Epsg(32633)
        );
        assert!(CrsCode::from_code_string("EPSG:abc").is_err());
        assert!(CrsCode::from_code_string("WKT").is_err());
    }

    #[test]
    fn test_equals_ignore_metadata() {
        let plain = Crs::wgs84();
        let named = Crs {
            axis_order: AxisOrder::LatLon,
            ..Crs::named(CrsCode::Epsg4326, "WGS 84")
        };

        assert_ne!(plain, named);
        assert!(plain.equals_ignore_metadata(&named));
        assert!(!plain.equals_ignore_metadata(&Crs::new(CrsCode::Epsg4269)));
    }

    #[test]
    fn test_display() {
        assert_eq!(CrsCode::Epsg(2154).to_string(), "EPSG:2154");
        assert_eq!(
            Crs::named(CrsCode::Epsg3857, "Pseudo-Mercator").to_string(),
            "EPSG:3857 (Pseudo-Mercator)"
        );
    }
}
