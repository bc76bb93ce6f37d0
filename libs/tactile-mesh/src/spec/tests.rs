//! Tests for specification parsing and validation.

use super::*;
use crate::error::SpecError;

const FLAT: &str = r#"{
    "shape_kind": "flat",
    "polarity": "embossing",
    "plate": {"width": 50, "height": 30, "thickness": 2, "center_x": 25, "center_y": 15, "center_z": 1},
    "dots": [
        {"position": {"x": 10, "y": 10, "z": 2}, "shape": "standard",
         "base_radius": 0.9, "top_radius": 0.45, "height": 0.6},
        {"position": {"x": 14, "y": 10, "z": 2}, "shape": "rounded",
         "base_radius": 0.9, "dome_radius": 0.6, "dome_height": 0.5, "is_recess": false}
    ],
    "markers": [
        {"kind": "character", "position": {"x": 3, "y": 3, "z": 2}, "size": 3, "depth": 0.5, "character": "A"}
    ]
}"#;

fn cylinder_spec(bore: Option<Vec<[f64; 2]>>, wall: f64) -> GeometrySpec {
    GeometrySpec {
        shape_kind: ShapeKind::Cylindrical,
        polarity: Polarity::Counter,
        plate: None,
        cylinder: Some(CylinderSpec {
            radius: 15.0,
            height: 50.0,
            wall_thickness: wall,
            bore_points: bore,
        }),
        dots: Vec::new(),
        markers: Vec::new(),
    }
}

/// Test the documented JSON shape parses into typed features.
#[test]
fn test_parse_flat_spec() {
    let spec = GeometrySpec::from_json(FLAT).unwrap();
    assert_eq!(spec.shape_kind, ShapeKind::Flat);
    assert_eq!(spec.dots.len(), 2);
    let dots: Vec<&DotSpec> = spec.dots.iter().filter_map(FeatureEntry::parsed).collect();
    assert!(matches!(dots[0].shape, DotShape::Standard { height, .. } if height == 0.6));
    assert!(matches!(
        dots[1].shape,
        DotShape::Rounded { base_height, .. } if base_height == 0.0
    ));
    let marker = spec.markers[0].parsed().unwrap();
    assert_eq!(marker.character.as_deref(), Some("A"));
    assert_eq!(spec.plate.unwrap().center_x, 25.0);
}

/// Test cylindrical positions are told apart from flat ones.
#[test]
fn test_parse_cylindrical_position() {
    let json = r#"{"position": {"theta": 1.5, "y": 4, "radius": 15}, "shape": "bowl",
                   "radius": 1.0, "depth": 0.4}"#;
    let dot: DotSpec = serde_json::from_str(json).unwrap();
    assert_eq!(
        dot.position,
        Position::Cylindrical {
            theta: 1.5,
            y: 4.0,
            radius: Some(15.0)
        }
    );
    assert!(dot.is_recess_for(Polarity::Embossing));
}

/// Test a feature with an unknown family is kept for validation to skip.
#[test]
fn test_unknown_shape_is_malformed_entry() {
    let json = FLAT.replace("\"standard\"", "\"star\"");
    let spec = GeometrySpec::from_json(&json).unwrap();
    match &spec.dots[0] {
        FeatureEntry::Malformed { raw, error } => {
            assert_eq!(raw["shape"], "star");
            assert!(!error.is_empty());
        }
        other => panic!("expected a malformed entry, got {other:?}"),
    }
    assert!(spec.dots[1].parsed().is_some());

    let validated = validate(&spec).unwrap();
    assert_eq!(validated.dots.len(), 1);
    assert_eq!(validated.dots[0].0, 1);
    assert_eq!(validated.skipped, 1);
}

/// Test one dot with missing fields does not sink the others.
#[test]
fn test_incomplete_features_are_skipped() {
    let json = r#"{
        "shape_kind": "flat", "polarity": "embossing",
        "plate": {"width": 50, "height": 30, "thickness": 2},
        "dots": [
            {"position": {"x": 1, "y": 1, "z": 2}, "shape": "standard",
             "base_radius": 0.9, "top_radius": 0.45, "height": 0.6},
            {"position": {"x": 4, "y": 1, "z": 2}, "shape": "standard", "base_radius": 0.9}
        ],
        "markers": [
            {"kind": "triangle", "position": {"x": 3, "y": 3, "z": 2}},
            {"kind": "rectangle", "position": {"x": 9, "y": 3, "z": 2}, "size": 2, "depth": 0.5}
        ]
    }"#;
    let spec = GeometrySpec::from_json(json).unwrap();
    assert!(matches!(spec.dots[1], FeatureEntry::Malformed { .. }));

    let validated = validate(&spec).unwrap();
    assert_eq!(validated.dots.len(), 1);
    assert_eq!(validated.markers.len(), 1);
    assert_eq!(validated.markers[0].0, 1);
    assert_eq!(validated.skipped, 2);

    // Malformed entries serialize back as sent.
    let round_trip: serde_json::Value = serde_json::to_value(&spec).unwrap();
    assert_eq!(round_trip["dots"][1]["base_radius"], 0.9);
    assert!(round_trip["dots"][1].get("top_radius").is_none());
}

#[test]
fn test_feature_list_must_be_a_list() {
    let json = FLAT.replace("\"dots\": [", "\"dots\": 5, \"unused\": [");
    assert!(matches!(GeometrySpec::from_json(&json), Err(SpecError::Json(_))));
}

#[test]
fn test_recess_rules_by_polarity() {
    let spec = GeometrySpec::from_json(FLAT).unwrap();
    let dot = *spec.dots[0].parsed().unwrap();
    assert!(!dot.is_recess_for(Polarity::Embossing));
    assert!(dot.is_recess_for(Polarity::Counter));
}

/// Test embossing plates raise standard and rounded dots whatever the
/// flag says, and only cones honour it.
#[test]
fn test_recess_flag_only_sinks_cones() {
    let position = Position::Flat {
        x: 0.0,
        y: 0.0,
        z: 2.0,
    };
    let dot = |shape| DotSpec {
        position,
        shape,
        is_recess: true,
    };
    let standard = dot(DotShape::Standard {
        base_radius: 0.9,
        top_radius: 0.45,
        height: 0.6,
    });
    let rounded = dot(DotShape::Rounded {
        base_radius: 0.9,
        base_height: 0.0,
        dome_radius: 0.6,
        dome_height: 0.5,
    });
    let cone = dot(DotShape::Cone {
        base_radius: 0.9,
        top_radius: 0.3,
        height: 0.5,
    });
    assert!(!standard.is_recess_for(Polarity::Embossing));
    assert!(!rounded.is_recess_for(Polarity::Embossing));
    assert!(cone.is_recess_for(Polarity::Embossing));
    assert!(!DotSpec { is_recess: false, ..cone }.is_recess_for(Polarity::Embossing));
    assert!(DotSpec { is_recess: false, ..cone }.is_recess_for(Polarity::Counter));

    let bowl = DotSpec {
        is_recess: false,
        ..dot(DotShape::Bowl { radius: 1.0, depth: 0.4 })
    };
    assert!(bowl.is_recess_for(Polarity::Embossing));
    assert!(!cone.shape.is_inherent_recess());
}

/// Test a valid flat spec keeps every feature.
#[test]
fn test_validate_flat_spec() {
    let validated = validate(&GeometrySpec::from_json(FLAT).unwrap()).unwrap();
    assert_eq!(validated.dots.len(), 2);
    assert_eq!(validated.markers.len(), 1);
    assert_eq!(validated.skipped, 0);
    assert!(matches!(validated.base, BaseSpec::Plate(_)));
}

#[test]
fn test_missing_and_conflicting_base() {
    let mut spec = GeometrySpec::from_json(FLAT).unwrap();
    spec.plate = None;
    assert!(matches!(
        validate(&spec),
        Err(SpecError::MissingBase { field: "plate", .. })
    ));

    let mut spec = cylinder_spec(None, 2.0);
    spec.plate = GeometrySpec::from_json(FLAT).unwrap().plate;
    assert!(matches!(validate(&spec), Err(SpecError::ConflictingBase)));

    let mut spec = cylinder_spec(None, 2.0);
    spec.shape_kind = ShapeKind::Flat;
    assert!(matches!(validate(&spec), Err(SpecError::MissingBase { .. })));
}

/// Test fatal base errors name the offending field.
#[test]
fn test_invalid_base_fields() {
    let mut spec = GeometrySpec::from_json(FLAT).unwrap();
    if let Some(plate) = spec.plate.as_mut() {
        plate.thickness = 0.0;
    }
    let err = validate(&spec).unwrap_err();
    assert!(err.to_string().contains("plate.thickness"), "{err}");

    let err = validate(&cylinder_spec(None, 15.0)).unwrap_err();
    assert!(err.to_string().contains("wall_thickness"), "{err}");

    let mut spec = cylinder_spec(None, 2.0);
    if let Some(c) = spec.cylinder.as_mut() {
        c.radius = f64::NAN;
    }
    assert!(validate(&spec).unwrap_err().to_string().contains("cylinder.radius"));
}

#[test]
fn test_bore_validation() {
    let two = Some(vec![[0.0, 0.0], [1.0, 0.0]]);
    assert!(matches!(validate(&cylinder_spec(two, 2.0)), Err(SpecError::InvalidBore(_))));

    let collinear = Some(vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
    assert!(matches!(
        validate(&cylinder_spec(collinear, 2.0)),
        Err(SpecError::InvalidBore(_))
    ));

    let nan = Some(vec![[0.0, 0.0], [1.0, f64::NAN], [0.0, 1.0]]);
    assert!(matches!(validate(&cylinder_spec(nan, 2.0)), Err(SpecError::InvalidBore(_))));

    let clockwise = Some(vec![[-5.0, -5.0], [-5.0, 5.0], [5.0, 5.0], [5.0, -5.0]]);
    match validate(&cylinder_spec(clockwise, 2.0)).unwrap().base {
        BaseSpec::Cylinder { bore: Some(bore), .. } => {
            let area: f64 = (0..bore.len())
                .map(|i| bore[i].perp_dot(bore[(i + 1) % bore.len()]))
                .sum();
            assert!(area > 0.0, "bore should be counter-clockwise");
        }
        other => panic!("unexpected base {other:?}"),
    }
}

/// Test bad features are skipped without failing the job.
#[test]
fn test_invalid_features_are_skipped() {
    let mut spec = GeometrySpec::from_json(FLAT).unwrap();
    spec.dots.push(
        DotSpec {
            position: Position::Cylindrical {
                theta: 0.0,
                y: 0.0,
                radius: None,
            },
            shape: DotShape::Hemisphere { radius: 1.0 },
            is_recess: true,
        }
        .into(),
    );
    spec.dots.push(
        DotSpec {
            position: Position::Flat {
                x: f64::NAN,
                y: 0.0,
                z: 2.0,
            },
            shape: DotShape::Hemisphere { radius: 1.0 },
            is_recess: true,
        }
        .into(),
    );
    let mut marker = spec.markers[0].parsed().unwrap().clone();
    marker.depth = 0.0;
    spec.markers.push(marker.into());

    let validated = validate(&spec).unwrap();
    assert_eq!(validated.dots.len(), 2);
    assert_eq!(validated.markers.len(), 1);
    assert_eq!(validated.skipped, 3);
    assert_eq!(validated.dots[1].0, 1);
}
