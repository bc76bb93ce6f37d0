//! Tests for the centralized configuration constants.

use super::*;

/// Ensures default constants are sane and positive.
#[test]
fn default_constants_are_valid() {
    let cfg = GlobalConfig::default();
    assert!(cfg.tolerance > 0.0);
    assert_eq!(cfg.default_segments % 4, 0);
    assert_eq!(cfg.feature_segments % 4, 0);
    assert!(cfg.coplanar_offset > cfg.tolerance);
}

/// The defaults must pass their own validation.
#[test]
fn default_round_trips_through_new() {
    let d = GlobalConfig::default();
    let built = GlobalConfig::new(
        d.tolerance,
        d.default_segments,
        d.feature_segments,
        d.coplanar_offset,
    );
    assert_eq!(built, Ok(d));
}

/// Validates the builder rejects invalid values.
#[test]
fn new_validates_inputs() {
    assert_eq!(
        GlobalConfig::new(0.0, 24, 12, 0.02).unwrap_err(),
        ConfigError::InvalidTolerance(0.0)
    );
    assert_eq!(
        GlobalConfig::new(1.0e-9, 2, 12, 0.02).unwrap_err(),
        ConfigError::InvalidSegments(2)
    );
    assert_eq!(
        GlobalConfig::new(1.0e-9, 24, 10, 0.02).unwrap_err(),
        ConfigError::InvalidSegments(10)
    );
    assert_eq!(
        GlobalConfig::new(1.0e-3, 24, 12, 1.0e-4).unwrap_err(),
        ConfigError::InvalidOffset(1.0e-4)
    );
}

#[test]
fn tolerances_are_ordered() {
    assert!(EPSILON_TOLERANCE < PLANE_EPSILON);
    assert!(WELD_TOLERANCE < COPLANAR_OFFSET);
    assert!(CAP_CUTTER_SCALE >= 4.0);
}

#[test]
fn error_messages_name_the_value() {
    let msg = ConfigError::InvalidSegments(7).to_string();
    assert!(msg.contains('7'), "message should include the value: {msg}");
}
