//! Tests for feature construction and the engine flow.

use super::*;
use crate::backend::{EmbeddedLoader, ManifoldBackend, ManifoldRuntime, MeshBackend};
use crate::error::{EngineError, FeatureError};
use crate::placement::Site;
use crate::primitives::GlyphFont;
use crate::spec::{CylinderSpec, DotShape, MarkerKind, PlateSpec, Position};
use approx::assert_relative_eq;
use config::constants::CHARACTER_FALLBACK_DEPTH;
use glam::{DVec2, DVec3};

const PLATE: PlateSpec = PlateSpec {
    width: 50.0,
    height: 30.0,
    thickness: 2.0,
    center_x: 25.0,
    center_y: 15.0,
    center_z: 1.0,
};

fn flat_site(x: f64, y: f64) -> Site {
    Site::Flat {
        origin: DVec3::new(x, y, 2.0),
    }
}

fn flat_position(x: f64, y: f64) -> Position {
    Position::Flat { x, y, z: 2.0 }
}

fn standard_dot(x: f64, y: f64) -> DotSpec {
    DotSpec {
        position: flat_position(x, y),
        shape: DotShape::Standard {
            base_radius: 0.9,
            top_radius: 0.45,
            height: 0.6,
        },
        is_recess: false,
    }
}

fn marker(kind: MarkerKind, character: Option<&str>) -> MarkerSpec {
    MarkerSpec {
        kind,
        position: flat_position(3.0, 3.0),
        size: 2.0,
        depth: 0.8,
        mirrored: false,
        character: character.map(str::to_string),
        width: None,
        height: None,
    }
}

fn vertices(solid: &crate::csg::Solid) -> Vec<DVec3> {
    solid
        .polygons()
        .iter()
        .flat_map(|p| p.vertices().iter().copied())
        .collect()
}

#[test]
fn test_site_for_rejects_mismatch() {
    let base = BaseSpec::Plate(PLATE);
    let cylindrical = Position::Cylindrical {
        theta: 0.0,
        y: 0.0,
        radius: None,
    };
    assert_eq!(
        site_for(&cylindrical, &base),
        Err(FeatureError::PositionMismatch {
            expected: "flat",
            found: "cylindrical"
        })
    );

    let shell = BaseSpec::Cylinder {
        radius: 15.0,
        height: 50.0,
        wall_thickness: 2.0,
        bore: None,
    };
    assert_eq!(
        site_for(&cylindrical, &shell),
        Ok(Site::Cylinder {
            radius: 15.0,
            theta: 0.0,
            y: 0.0
        })
    );
}

/// Test raised dots overlap the plate and recesses poke through it.
#[test]
fn test_standard_dot_extents() {
    let config = EngineConfig::default();
    let dot = standard_dot(10.0, 10.0);

    let raised = dot_solid(&dot, &flat_site(10.0, 10.0), Polarity::Embossing, &config).unwrap();
    let bounds = raised.bounds().unwrap();
    assert_relative_eq!(bounds.min.z, 2.0 - config.coplanar_offset, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.z, 2.6, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.x, 10.9, epsilon = 1e-12);

    let sunk = dot_solid(&dot, &flat_site(10.0, 10.0), Polarity::Counter, &config).unwrap();
    let bounds = sunk.bounds().unwrap();
    assert_relative_eq!(bounds.min.z, 1.4, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.z, 2.0 + config.coplanar_offset, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.x, 10.9, epsilon = 1e-12);
}

#[test]
fn test_rounded_recess_is_mirrored_dome() {
    let config = EngineConfig::default();
    let dot = DotSpec {
        position: flat_position(0.0, 0.0),
        shape: DotShape::Rounded {
            base_radius: 0.9,
            base_height: 0.2,
            dome_radius: 0.8,
            dome_height: 0.4,
        },
        is_recess: false,
    };
    let raised = dot_solid(&dot, &flat_site(0.0, 0.0), Polarity::Embossing, &config).unwrap();
    let sunk = dot_solid(&dot, &flat_site(0.0, 0.0), Polarity::Counter, &config).unwrap();
    // The tessellated cap has no pole vertex, so it stops just short of
    // the nominal top.
    let top = raised.bounds().unwrap().max.z;
    assert!(top <= 2.6 + 1e-9 && top > 2.55, "cap top {top}");
    let bottom = sunk.bounds().unwrap().min.z;
    assert!(bottom >= 1.4 - 1e-9 && bottom < 1.45, "cavity bottom {bottom}");
    assert_relative_eq!(raised.volume(), sunk.volume(), epsilon = 1e-9);
}

/// Test a bowl opens at the surface and reaches about its depth.
#[test]
fn test_bowl_recess_depth() {
    let config = EngineConfig::default();
    let dot = DotSpec {
        position: flat_position(5.0, 5.0),
        shape: DotShape::Bowl {
            radius: 1.0,
            depth: 0.4,
        },
        is_recess: false,
    };
    let solid = dot_solid(&dot, &flat_site(5.0, 5.0), Polarity::Embossing, &config).unwrap();
    let bounds = solid.bounds().unwrap();
    assert!(bounds.min.z >= 2.0 - 0.4 - 1e-9, "too deep: {}", bounds.min.z);
    assert!(bounds.min.z <= 2.0 - 0.35, "too shallow: {}", bounds.min.z);
    assert!(dot.is_recess_for(Polarity::Embossing));
}

fn cone_dot(is_recess: bool) -> DotSpec {
    DotSpec {
        position: flat_position(0.0, 0.0),
        shape: DotShape::Cone {
            base_radius: 1.0,
            top_radius: 0.25,
            height: 0.5,
        },
        is_recess,
    }
}

#[test]
fn test_cone_is_wide_at_surface() {
    let config = EngineConfig::default();
    let dot = cone_dot(true);
    let solid = dot_solid(&dot, &flat_site(0.0, 0.0), Polarity::Embossing, &config).unwrap();
    let width_at = |z: f64| {
        vertices(&solid)
            .iter()
            .filter(|v| (v.z - z).abs() < 1e-9)
            .map(|v| v.x)
            .fold(f64::MIN, f64::max)
    };
    assert_relative_eq!(width_at(2.0 + config.coplanar_offset), 1.0, epsilon = 1e-12);
    assert_relative_eq!(width_at(1.5), 0.25, epsilon = 1e-12);
}

/// Test a cone without the recess flag stands on an embossing plate.
#[test]
fn test_raised_cone_on_embossing_plate() {
    let config = EngineConfig::default();
    let dot = cone_dot(false);
    let solid = dot_solid(&dot, &flat_site(0.0, 0.0), Polarity::Embossing, &config).unwrap();
    let bounds = solid.bounds().unwrap();
    assert_relative_eq!(bounds.min.z, 2.0 - config.coplanar_offset, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.z, 2.5, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.x, 1.0, epsilon = 1e-12);

    let sunk = dot_solid(&dot, &flat_site(0.0, 0.0), Polarity::Counter, &config).unwrap();
    assert_relative_eq!(sunk.bounds().unwrap().min.z, 1.5, epsilon = 1e-12);
}

/// Test a raised cone on a cylinder sits at `R + (h - embed) / 2`.
#[test]
fn test_raised_cone_on_cylinder() {
    let config = EngineConfig::default();
    let site = Site::Cylinder {
        radius: 15.0,
        theta: 0.0,
        y: 0.0,
    };
    let dot = cone_dot(false);
    let solid = dot_solid(&dot, &site, Polarity::Embossing, &config).unwrap();
    let bounds = solid.bounds().unwrap();
    let embed = site.embed_depth(1.0, config.coplanar_offset);
    assert_relative_eq!(bounds.max.x, 15.5, epsilon = 1e-12);
    assert_relative_eq!(bounds.min.x, 15.0 - embed, epsilon = 1e-12);
    assert_relative_eq!(bounds.center().x, 15.0 + (0.5 - embed) / 2.0, epsilon = 1e-12);
}

/// Test hemisphere and bowl spheres are centred on the cylinder surface.
#[test]
fn test_cylinder_spheres_centred_on_surface() {
    let config = EngineConfig::default();
    let site = Site::Cylinder {
        radius: 15.0,
        theta: 0.7,
        y: 3.0,
    };
    for shape in [
        DotShape::Bowl {
            radius: 1.0,
            depth: 0.4,
        },
        DotShape::Hemisphere { radius: 0.8 },
    ] {
        let dot = DotSpec {
            position: Position::Cylindrical {
                theta: 0.7,
                y: 3.0,
                radius: None,
            },
            shape,
            is_recess: false,
        };
        for polarity in [Polarity::Embossing, Polarity::Counter] {
            let solid = dot_solid(&dot, &site, polarity, &config).unwrap();
            let centre = solid.bounds().unwrap().center();
            assert_relative_eq!(DVec2::new(centre.x, centre.z).length(), 15.0, epsilon = 1e-9);
            assert_relative_eq!(centre.y, 3.0, epsilon = 1e-9);
        }
    }

    let bowl = DotSpec {
        position: Position::Cylindrical {
            theta: 0.7,
            y: 3.0,
            radius: None,
        },
        shape: DotShape::Bowl {
            radius: 1.0,
            depth: 0.4,
        },
        is_recess: false,
    };
    let solid = dot_solid(&bowl, &site, Polarity::Counter, &config).unwrap();
    let size = solid.bounds().unwrap().size();
    // Sphere radius (1 + 0.16) / 0.8 = 1.45; the widest ring sits just inside it.
    assert!(size.y > 2.8 && size.y <= 2.9 + 1e-9, "bowl sphere extent {size}");
}

/// Test a raised dot on a cylinder starts inside the wall everywhere.
#[test]
fn test_cylinder_dot_is_embedded() {
    let config = EngineConfig::default();
    let site = Site::Cylinder {
        radius: 15.0,
        theta: 0.0,
        y: 0.0,
    };
    let mut dot = standard_dot(0.0, 0.0);
    dot.position = Position::Cylindrical {
        theta: 0.0,
        y: 0.0,
        radius: None,
    };
    let solid = dot_solid(&dot, &site, Polarity::Embossing, &config).unwrap();
    let points = vertices(&solid);
    let innermost = points.iter().map(|v| v.x).fold(f64::MAX, f64::min);
    for v in points.iter().filter(|v| (v.x - innermost).abs() < 1e-9) {
        assert!(DVec2::new(v.x, v.z).length() < 15.0, "floating vertex {v}");
    }
}

#[test]
fn test_triangle_apex_and_mirror() {
    let config = EngineConfig::default();
    let font = GlyphFont::builtin();
    let site = flat_site(3.0, 3.0);

    let plain = marker_solid(&marker(MarkerKind::Triangle, None), &site, &font, &config).unwrap();
    let apex: Vec<DVec3> = vertices(&plain.solid)
        .into_iter()
        .filter(|v| (v.x - 4.0).abs() < 1e-9)
        .collect();
    assert!(!apex.is_empty());
    assert!(apex.iter().all(|v| (v.y - 3.0).abs() < 1e-9));

    let mut flipped = marker(MarkerKind::Triangle, None);
    flipped.mirrored = true;
    let mirrored = marker_solid(&flipped, &site, &font, &config).unwrap();
    let apex: Vec<DVec3> = vertices(&mirrored.solid)
        .into_iter()
        .filter(|v| (v.x - 2.0).abs() < 1e-9)
        .collect();
    assert!(!apex.is_empty());
    assert!(apex.iter().all(|v| (v.y - 3.0).abs() < 1e-9));
    assert_relative_eq!(plain.solid.volume(), mirrored.solid.volume(), epsilon = 1e-12);
}

#[test]
fn test_rectangle_defaults_to_square() {
    let config = EngineConfig::default();
    let font = GlyphFont::builtin();
    let mut rect = marker(MarkerKind::Rectangle, None);
    let square = marker_solid(&rect, &flat_site(3.0, 3.0), &font, &config).unwrap();
    assert_relative_eq!(square.solid.volume(), 4.0 * (0.8 + config.coplanar_offset), epsilon = 1e-9);

    rect.width = Some(3.0);
    rect.height = Some(1.0);
    let wide = marker_solid(&rect, &flat_site(3.0, 3.0), &font, &config).unwrap();
    let size = wide.solid.bounds().unwrap().size();
    assert_relative_eq!(size.x, 3.0, epsilon = 1e-12);
    assert_relative_eq!(size.y, 1.0, epsilon = 1e-12);
}

/// Test an unsupported glyph becomes the fallback rectangle.
#[test]
fn test_unsupported_character_falls_back() {
    let config = EngineConfig::default();
    let font = GlyphFont::builtin();
    let site = flat_site(3.0, 3.0);

    let omega = marker_solid(&marker(MarkerKind::Character, Some("Ω")), &site, &font, &config).unwrap();
    assert!(omega.fallback);

    let mut rect = marker(MarkerKind::Rectangle, None);
    rect.depth = CHARACTER_FALLBACK_DEPTH;
    let expected = marker_solid(&rect, &site, &font, &config).unwrap();
    assert!(!expected.fallback);
    assert_eq!(omega.solid, expected.solid);

    let glyph = marker_solid(&marker(MarkerKind::Character, Some("a")), &site, &font, &config).unwrap();
    assert!(!glyph.fallback);

    assert_eq!(
        marker_solid(&marker(MarkerKind::Character, Some("")), &site, &font, &config),
        Err(FeatureError::MissingCharacter)
    );
}

#[test]
fn test_engine_rejects_bad_config() {
    let config = EngineConfig {
        feature_segments: 6,
        ..EngineConfig::default()
    };
    let err = Engine::new(MeshBackend::new(&config), config).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

/// Test the counters for a job with every kind of outcome.
#[test]
fn test_engine_stats() {
    let config = EngineConfig::default();
    let engine = Engine::new(MeshBackend::new(&config), config).unwrap();
    let mut hemisphere = standard_dot(20.0, 10.0);
    hemisphere.shape = DotShape::Hemisphere { radius: 0.7 };
    let spec = GeometrySpec {
        shape_kind: ShapeKind::Flat,
        polarity: Polarity::Embossing,
        plate: Some(PLATE),
        cylinder: None,
        dots: vec![
            standard_dot(10.0, 10.0).into(),
            hemisphere.into(),
            DotSpec {
                position: flat_position(f64::NAN, 1.0),
                ..standard_dot(0.0, 0.0)
            }
            .into(),
        ],
        markers: vec![
            marker(MarkerKind::Triangle, None).into(),
            MarkerSpec {
                position: flat_position(40.0, 20.0),
                ..marker(MarkerKind::Character, Some("Ω"))
            }
            .into(),
            marker(MarkerKind::Character, None).into(),
        ],
    };
    let generated = engine.generate(&spec).unwrap();
    let stats = &generated.stats;
    assert_eq!(stats.dots_rendered, 2);
    assert_eq!(stats.markers_rendered, 2);
    assert_eq!(stats.fallback_markers, 1);
    assert_eq!(stats.skipped_features, 2);
    assert_eq!(stats.backend, "general");
    assert_eq!(stats.triangle_count, generated.mesh.triangle_count());
    assert!(stats.triangle_count > 12);
}

#[test]
fn test_engine_on_manifold_backend() {
    let mut runtime = ManifoldRuntime::new();
    runtime.initialize(&EmbeddedLoader).unwrap();
    let config = EngineConfig::default();
    let backend = ManifoldBackend::new(&runtime, &config).unwrap();
    let engine = Engine::new(backend, config).unwrap();
    let spec = GeometrySpec {
        shape_kind: ShapeKind::Flat,
        polarity: Polarity::Counter,
        plate: Some(PLATE),
        cylinder: None,
        dots: vec![standard_dot(10.0, 10.0).into()],
        markers: Vec::new(),
    };
    let generated = engine.generate(&spec).unwrap();
    assert!(generated.mesh.is_watertight());
    assert_eq!(engine.backend().live_count(), 0);
    let bounds = generated.mesh.bounding_box().unwrap();
    assert_eq!(bounds.min, DVec3::ZERO);
    assert_eq!(bounds.max, DVec3::new(50.0, 30.0, 2.0));
}

fn counter_hemisphere_plate() -> GeometrySpec {
    let dots = (0..18)
        .map(|i| {
            let (x, y) = (5.0 + 2.5 * f64::from(i % 6), 8.0 + 2.5 * f64::from(i / 6));
            DotSpec {
                position: flat_position(x, y),
                shape: DotShape::Hemisphere { radius: 0.8 },
                is_recess: false,
            }
            .into()
        })
        .collect();
    GeometrySpec {
        shape_kind: ShapeKind::Flat,
        polarity: Polarity::Counter,
        plate: Some(PLATE),
        cylinder: None,
        dots,
        markers: Vec::new(),
    }
}

/// Test repair closes a counter plate with many hemisphere recesses.
#[test]
fn test_repaired_hemisphere_counter_plate_is_watertight() {
    let config = EngineConfig {
        repair: true,
        ..EngineConfig::default()
    };
    let engine = Engine::new(MeshBackend::new(&config), config).unwrap();
    let generated = engine.generate(&counter_hemisphere_plate()).unwrap();
    assert_eq!(generated.stats.dots_rendered, 18);
    assert!(generated.mesh.is_watertight());
    assert!(generated.mesh.volume() < 50.0 * 30.0 * 2.0);
}

fn crowded_cylinder(shape: DotShape, polarity: Polarity) -> GeometrySpec {
    // Arc pitch of 1.35 mm, well under the dot diameters below.
    let step = 1.35 / 15.0;
    let dots = (0..36)
        .map(|i| {
            let theta = step * f64::from(i % 12);
            let y = -1.5 + 1.35 * f64::from(i / 12);
            DotSpec {
                position: Position::Cylindrical {
                    theta,
                    y,
                    radius: None,
                },
                shape,
                is_recess: false,
            }
            .into()
        })
        .collect();
    GeometrySpec {
        shape_kind: ShapeKind::Cylindrical,
        polarity,
        plate: None,
        cylinder: Some(CylinderSpec {
            radius: 15.0,
            height: 50.0,
            wall_thickness: 2.0,
            bore_points: None,
        }),
        dots,
        markers: Vec::new(),
    }
}

/// Test overlapping dots on a cylinder keep every manifold step closed.
#[test]
fn test_manifold_overlapping_cylinder_dots() {
    let runtime = {
        let mut runtime = ManifoldRuntime::new();
        runtime.initialize(&EmbeddedLoader).unwrap();
        runtime
    };
    let cases = [
        (
            DotShape::Standard {
                base_radius: 0.9,
                top_radius: 0.45,
                height: 0.6,
            },
            Polarity::Counter,
        ),
        (DotShape::Hemisphere { radius: 0.8 }, Polarity::Embossing),
        (
            DotShape::Bowl {
                radius: 1.0,
                depth: 0.4,
            },
            Polarity::Embossing,
        ),
        (
            DotShape::Rounded {
                base_radius: 0.9,
                base_height: 0.2,
                dome_radius: 0.8,
                dome_height: 0.4,
            },
            Polarity::Embossing,
        ),
    ];
    for (shape, polarity) in cases {
        let config = EngineConfig::default();
        let backend = ManifoldBackend::new(&runtime, &config).unwrap();
        let engine = Engine::new(backend, config).unwrap();
        let generated = engine
            .generate(&crowded_cylinder(shape, polarity))
            .unwrap_or_else(|e| panic!("{shape:?} {polarity:?}: {e}"));
        assert_eq!(generated.stats.dots_rendered, 36);
        assert!(generated.mesh.is_watertight(), "{shape:?} {polarity:?}");
        assert_eq!(engine.backend().live_count(), 0);
    }
}
