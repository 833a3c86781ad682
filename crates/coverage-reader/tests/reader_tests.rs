//! End-to-end tests for the read-planning facade.

use std::sync::Arc;

use coverage_common::{BoundingBox, Crs, GridRange};
use coverage_reader::{
    CoverageInfo, CoverageReader, DecimationPolicy, GridGeometry, InterpolationMethod,
    OverviewPolicy, Padding, ReadParameters, ReaderConfig, ReaderError, Resolution,
    SubsamplingFactors, MAX_PADDING,
};
use projection::AffineTransform;
use test_utils::{
    assert_approx_eq, bbox, grid, init_test_logging, FailingTransformFactory,
    ScalingTransformFactory,
};

/// 1024 x 1024 pixels of 1 m with overviews at 2, 4, 8 and 16 m.
fn unit_coverage() -> CoverageInfo {
    let spec = grid::UNIT_1024;
    CoverageInfo::new(Crs::web_mercator(), spec.envelope, spec.width, spec.height)
        .with_power_of_two_overviews(4)
}

/// 3600 x 1800 geographic pixels of 0.1 degree with four overviews.
fn global_coverage() -> CoverageInfo {
    CoverageInfo::new(Crs::wgs84(), bbox::GLOBAL, 3600, 1800).with_power_of_two_overviews(4)
}

/// A 100 x 100 request with `pixel` sized pixels anchored at the top-left of
/// the unit coverage.
fn request(pixel: f64) -> GridGeometry {
    GridGeometry::new(
        GridRange::from_size(100, 100),
        AffineTransform::from_scale_translate(pixel, -pixel, 0.0, 1024.0),
        Crs::web_mercator(),
    )
}

fn reader(config: ReaderConfig) -> CoverageReader<CoverageInfo> {
    CoverageReader::new(unit_coverage(), config)
}

// ============================================================================
// Level and subsampling
// ============================================================================

#[test]
fn test_configured_policy_is_default() {
    let reader = reader(ReaderConfig::default());

    // Nearest: equidistant from levels 1 and 2, ties go to the finer one.
    let plan = reader.pick_level_and_subsampling(&request(3.0), None, None).unwrap();
    assert_eq!(plan.level_index, 1);
    assert_eq!(plan.level_resolution, Resolution::uniform(2.0));
    assert_eq!(plan.level_raster_size, (512, 512));
    assert_eq!(plan.subsampling, SubsamplingFactors::NONE);
    assert_eq!(plan.requested_resolution, Resolution::uniform(3.0));
}

#[test]
fn test_explicit_policy_overrides_config() {
    let reader = reader(ReaderConfig {
        overview_policy: OverviewPolicy::Speed,
        ..Default::default()
    });

    let speed = reader.pick_level_and_subsampling(&request(6.0), None, None).unwrap();
    assert_eq!(speed.level_index, 3);

    let quality = reader
        .pick_level_and_subsampling(&request(6.0), Some(OverviewPolicy::Quality), None)
        .unwrap();
    assert_eq!(quality.level_index, 2);
    assert_eq!(quality.subsampling, SubsamplingFactors::NONE);
}

#[test]
fn test_coarsest_level_is_subsampled() {
    let reader = reader(ReaderConfig::default());
    let plan = reader.pick_level_and_subsampling(&request(100.0), None, None).unwrap();
    assert_eq!(plan.level_index, 4);
    assert_eq!(plan.level_raster_size, (64, 64));
    assert_eq!(plan.subsampling, SubsamplingFactors::new(6, 6));
}

#[test]
fn test_ignore_policy_subsamples_full_resolution() {
    let reader = reader(ReaderConfig::default());
    let plan = reader
        .pick_level_and_subsampling(&request(3.0), Some(OverviewPolicy::Ignore), None)
        .unwrap();
    assert_eq!(plan.level_index, 0);
    assert_eq!(plan.level_raster_size, (1024, 1024));
    assert_eq!(plan.subsampling, SubsamplingFactors::new(3, 3));
}

#[test]
fn test_disallowed_decimation() {
    let reader = reader(ReaderConfig {
        decimation_policy: DecimationPolicy::Disallow,
        ..Default::default()
    });
    let plan = reader
        .pick_level_and_subsampling(&request(3.0), Some(OverviewPolicy::Ignore), None)
        .unwrap();
    assert_eq!(plan.subsampling, SubsamplingFactors::NONE);

    let allowed = reader
        .pick_level_and_subsampling(
            &request(3.0),
            Some(OverviewPolicy::Ignore),
            Some(DecimationPolicy::Allow),
        )
        .unwrap();
    assert_eq!(allowed.subsampling, SubsamplingFactors::new(3, 3));
}

#[test]
fn test_derived_overview_raster_size() {
    let spec = grid::UNIT_1024;
    let info = CoverageInfo::new(Crs::web_mercator(), spec.envelope, spec.width, spec.height)
        .with_overview(Resolution::uniform(3.0));
    let reader = CoverageReader::new(info, ReaderConfig::default());

    let plan = reader.pick_level_and_subsampling(&request(7.0), None, None).unwrap();
    assert_eq!(plan.level_index, 1);
    assert_eq!(plan.level_raster_size, (341, 341));
    assert_eq!(plan.subsampling, SubsamplingFactors::new(2, 2));
}

#[test]
fn test_unusable_native_resolution_reads_full_level() {
    let info = CoverageInfo::new(Crs::web_mercator(), BoundingBox::new(0.0, 0.0, 0.0, 1024.0), 1024, 1024);
    let reader = CoverageReader::new(info, ReaderConfig::default());

    assert!(reader.resolution_levels().is_none());
    let plan = reader.pick_level_and_subsampling(&request(3.0), None, None).unwrap();
    assert_eq!(plan.level_index, 0);
    assert!(plan.subsampling.x >= 1 && plan.subsampling.y >= 1);
}

// ============================================================================
// Cross-CRS requests
// ============================================================================

#[test]
fn test_web_mercator_request_on_geographic_coverage() {
    let reader = CoverageReader::new(global_coverage(), ReaderConfig::default());
    let request = GridGeometry::from_envelope(bbox::WEB_MERCATOR_WORLD, 256, 256, Crs::web_mercator())
        .unwrap();

    let resolution = reader.requested_resolution(&request).unwrap();
    assert_approx_eq!(resolution.x, 360.0 / 256.0, 1e-6);

    // Longitude asks for scale ~14, latitude (~170 degrees over 256 rows)
    // only for ~6.6, between the overviews at 4 and 8.
    assert_approx_eq!(resolution.y, 2.0 * 85.051_128_779_806_59 / 256.0, 1e-6);
    let nearest = reader.pick_level_and_subsampling(&request, None, None).unwrap();
    assert_eq!(nearest.level_index, 3);
    let quality = reader
        .pick_level_and_subsampling(&request, Some(OverviewPolicy::Quality), None)
        .unwrap();
    assert_eq!(quality.level_index, 2);
}

#[test]
fn test_unknown_transform_reads_full_resolution() {
    init_test_logging();
    let reader = CoverageReader::with_transform_factory(
        global_coverage(),
        ReaderConfig::default(),
        Arc::new(FailingTransformFactory),
    );
    let request = GridGeometry::from_envelope(bbox::WEB_MERCATOR_WORLD, 256, 256, Crs::web_mercator())
        .unwrap();

    let plan = reader.pick_level_and_subsampling(&request, None, None).unwrap();
    assert_eq!(plan.level_index, 0);
    assert_approx_eq!(plan.requested_resolution.x, 0.1, 1e-12);
    assert_eq!(plan.subsampling, SubsamplingFactors::NONE);
}

/// A 128 x 128 coverage of 1 m pixels at the origin, read through a CRS
/// whose units are half a native unit.
fn corner_reader(accurate_resolution: bool) -> CoverageReader<CoverageInfo> {
    let info = CoverageInfo::new(Crs::web_mercator(), BoundingBox::new(0.0, 0.0, 128.0, 128.0), 128, 128)
        .with_power_of_two_overviews(4);
    CoverageReader::with_transform_factory(
        info,
        ReaderConfig {
            accurate_resolution,
            ..Default::default()
        },
        Arc::new(ScalingTransformFactory::new(Crs::wgs84(), 2.0)),
    )
}

#[test]
fn test_request_overhanging_coverage() {
    // 100 pixels of 4 native units span 400 units; only the lower-left
    // 32 x 32 pixels cover the coverage.
    let request =
        GridGeometry::from_envelope(BoundingBox::new(0.0, 0.0, 200.0, 200.0), 100, 100, Crs::wgs84())
            .unwrap();

    for accurate in [false, true] {
        let reader = corner_reader(accurate);
        let resolution = reader.requested_resolution(&request).unwrap();
        assert_approx_eq!(resolution.x, 4.0, 1e-9);
        assert_approx_eq!(resolution.y, 4.0, 1e-9);

        let nearest = reader.pick_level_and_subsampling(&request, None, None).unwrap();
        assert_eq!(nearest.level_index, 2);
        assert_eq!(nearest.level_resolution, Resolution::uniform(4.0));
        assert_eq!(nearest.subsampling, SubsamplingFactors::NONE);

        let quality = reader
            .pick_level_and_subsampling(&request, Some(OverviewPolicy::Quality), None)
            .unwrap();
        assert_eq!(quality.level_index, 2);
    }
}

#[test]
fn test_request_inside_coverage_is_not_clipped() {
    let request =
        GridGeometry::from_envelope(BoundingBox::new(8.0, 8.0, 40.0, 40.0), 64, 64, Crs::wgs84())
            .unwrap();

    for accurate in [false, true] {
        let resolution = corner_reader(accurate).requested_resolution(&request).unwrap();
        assert_approx_eq!(resolution.x, 1.0, 1e-9);
        assert_approx_eq!(resolution.y, 1.0, 1e-9);
    }
}

#[test]
fn test_non_affine_request_is_rejected() {
    let reader = reader(ReaderConfig::default());
    let request = GridGeometry::non_linear(
        GridRange::from_size(10, 10),
        "swath",
        Crs::web_mercator(),
        BoundingBox::new(0.0, 0.0, 100.0, 100.0),
    );

    let err = reader.pick_level_and_subsampling(&request, None, None).unwrap_err();
    assert!(matches!(err, ReaderError::UnsupportedTransformKind(_)));
    assert!(reader.plan_read(&request, &ReadParameters::default()).is_err());
}

// ============================================================================
// Reading resolution
// ============================================================================

#[test]
fn test_reading_resolution() {
    let reader = reader(ReaderConfig::default());
    assert_eq!(
        reader.reading_resolution(None, Resolution::uniform(6.0)),
        Resolution::uniform(4.0)
    );
    assert_eq!(
        reader.reading_resolution(Some(OverviewPolicy::Speed), Resolution::uniform(6.0)),
        Resolution::uniform(8.0)
    );
    assert_eq!(
        reader.reading_resolution(Some(OverviewPolicy::Ignore), Resolution::uniform(6.0)),
        Resolution::uniform(1.0)
    );
    assert_eq!(
        reader.reading_resolution(None, Resolution::uniform(0.1)),
        Resolution::uniform(1.0)
    );
}

// ============================================================================
// Full plans
// ============================================================================

#[test]
fn test_plan_read_defaults_to_quality() {
    let reader = reader(ReaderConfig::default());
    let plan = reader.plan_read(&request(6.0), &ReadParameters::default()).unwrap();

    assert_eq!(plan.level_index, 2);
    assert_eq!(plan.padding, Padding::uniform(10));
    assert_eq!(plan.read_geometry.raster_window, GridRange::new(-10, -10, 120, 120));
    assert_eq!(plan.read_geometry.envelope, BoundingBox::new(-60.0, 364.0, 660.0, 1084.0));
}

#[test]
fn test_plan_read_scales_padding_for_bilinear() {
    let reader = reader(ReaderConfig::default());
    let params = ReadParameters::default().with_interpolation(InterpolationMethod::Bilinear);
    let plan = reader.plan_read(&request(0.5), &params).unwrap();

    assert_eq!(plan.level_index, 0);
    assert_eq!(plan.padding, Padding::uniform(20));
    assert_eq!(plan.read_geometry.raster_window, GridRange::new(-20, -20, 140, 140));
}

#[test]
fn test_plan_read_uses_configured_interpolation() {
    let reader = reader(ReaderConfig {
        interpolation: InterpolationMethod::Cubic,
        padding: 2,
        ..Default::default()
    });
    let plan = reader.plan_read(&request(0.25), &ReadParameters::default()).unwrap();
    assert_eq!(plan.padding, Padding::uniform(8));
}

#[test]
fn test_plan_read_caps_padding() {
    let reader = reader(ReaderConfig::default());
    let request = GridGeometry::new(
        GridRange::from_size(10, 10),
        AffineTransform::from_scale_translate(1e-19, -1e-19, 0.0, 0.0),
        Crs::web_mercator(),
    );
    let params = ReadParameters::default().with_interpolation(InterpolationMethod::Bilinear);
    let plan = reader.plan_read(&request, &params).unwrap();

    assert_eq!(plan.level_index, 0);
    assert_eq!(plan.padding, Padding::uniform(MAX_PADDING));
    assert_eq!(
        plan.read_geometry.raster_window,
        GridRange::new(-1024, -1024, 10 + 2 * MAX_PADDING, 10 + 2 * MAX_PADDING)
    );
}

#[test]
fn test_pad_for_interpolation() {
    let reader = reader(ReaderConfig::default());
    let padded = reader.pad_for_interpolation(&request(0.5), InterpolationMethod::Nearest);
    assert_eq!(padded.raster_window, GridRange::new(-10, -10, 120, 120));
    assert_eq!(padded.grid_to_world, request(0.5).grid_to_world);
}

// ============================================================================
// Concurrency and configuration
// ============================================================================

#[test]
fn test_concurrent_planning_shares_one_table() {
    let reader = Arc::new(reader(ReaderConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let reader = Arc::clone(&reader);
            std::thread::spawn(move || {
                let pixel = 1.0 + i as f64;
                let plan = reader.pick_level_and_subsampling(&request(pixel), None, None).unwrap();
                (plan.level_index, reader.resolution_levels().unwrap())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (_, levels) in &results {
        assert!(Arc::ptr_eq(levels, &results[0].1));
    }
    assert_eq!(results[0].0, 0);
    assert_eq!(results[7].0, 3);
}

#[test]
fn test_try_new_validates_config() {
    let err = CoverageReader::try_new(
        unit_coverage(),
        ReaderConfig {
            padding: 2000,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, ReaderError::ConfigError(_)));
    assert!(!err.is_recoverable());

    let reader = CoverageReader::try_new(unit_coverage(), ReaderConfig::default()).unwrap();
    assert_eq!(reader.config().padding, 10);
}

#[test]
fn test_config_from_env() {
    std::env::set_var("COVERAGE_OVERVIEW_POLICY", "SPEED");
    std::env::set_var("COVERAGE_DECIMATION_POLICY", "disallow");
    std::env::set_var("COVERAGE_READ_PADDING", "3");
    std::env::set_var("COVERAGE_ACCURATE_RESOLUTION", "true");
    std::env::set_var("COVERAGE_INTERPOLATION", "bilinear");

    let config = ReaderConfig::from_env();
    assert_eq!(config.overview_policy, OverviewPolicy::Speed);
    assert_eq!(config.decimation_policy, DecimationPolicy::Disallow);
    assert_eq!(config.padding, 3);
    assert!(config.accurate_resolution);
    assert_eq!(config.interpolation, InterpolationMethod::Bilinear);
    assert!(config.validate().is_ok());
}
