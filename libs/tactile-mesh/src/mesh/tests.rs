//! Tests for mesh extraction and topology checks.

use super::*;
use crate::primitives::cuboid;
use approx::assert_relative_eq;

fn cube(min: f64, max: f64) -> Solid {
    cuboid(DVec3::splat(min), DVec3::splat(max)).unwrap()
}

fn unsealed() -> ExtractOptions {
    ExtractOptions {
        seal_cracks: false,
        ..ExtractOptions::default()
    }
}

/// Test a cube extracts to 8 shared vertices and 12 triangles.
#[test]
fn test_extract_cube() {
    let mesh = Mesh::from_solid(&cube(0.0, 2.0), &ExtractOptions::default());
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.triangle_count(), 12);
    assert!(mesh.is_watertight());
    assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-9);
}

/// Test booleans that leave T-junctions extract to a closed mesh.
#[test]
fn test_extract_notched_cube_is_watertight() {
    let notched = cube(0.0, 2.0).subtract(cube(1.0, 3.0));
    let mesh = Mesh::from_solid(&notched, &unsealed());
    assert!(
        mesh.is_watertight(),
        "open edges: {}",
        mesh.open_edge_count()
    );
    assert_relative_eq!(mesh.volume(), 7.0, epsilon = 1e-9);
}

#[test]
fn test_extract_through_hole_is_watertight() {
    let plate = cuboid(DVec3::ZERO, DVec3::new(4.0, 4.0, 1.0)).unwrap();
    let hole = cuboid(DVec3::new(1.0, 1.0, -1.0), DVec3::new(3.0, 3.0, 2.0)).unwrap();
    let mesh = Mesh::from_solid(&plate.subtract(hole), &unsealed());
    assert!(mesh.is_watertight(), "open edges: {}", mesh.open_edge_count());
    assert_relative_eq!(mesh.volume(), 12.0, epsilon = 1e-9);
}

/// Unit cube whose top face is split in two at `x = 0.5`, leaving
/// T-junctions on the front and back faces.
fn split_top_cube() -> Vec<Polygon> {
    let mut polygons: Vec<Polygon> = cube(0.0, 1.0)
        .into_polygons()
        .into_iter()
        .filter(|p| p.vertices().iter().any(|v| v.z < 0.5))
        .collect();
    for (x0, x1) in [(0.0, 0.5), (0.5, 1.0)] {
        polygons.extend(Polygon::new(vec![
            DVec3::new(x0, 0.0, 1.0),
            DVec3::new(x1, 0.0, 1.0),
            DVec3::new(x1, 1.0, 1.0),
            DVec3::new(x0, 1.0, 1.0),
        ]));
    }
    polygons
}

/// Test sealing alone closes the cracks a plain weld leaves behind.
#[test]
fn test_sealing_closes_welded_cracks() {
    let polygons = split_top_cube();
    let tolerance = ExtractOptions::default().weld_tolerance;
    let welded = extract(&polygons, &ExtractOptions::weld_only(tolerance));
    // Per side: the unsplit top edge of the side face and the two halves.
    assert_eq!(welded.open_edge_count(), 6);

    let sealed = extract(
        &polygons,
        &ExtractOptions {
            seal_cracks: true,
            ..ExtractOptions::weld_only(tolerance)
        },
    );
    assert!(sealed.is_watertight(), "open edges: {}", sealed.open_edge_count());
    assert_relative_eq!(sealed.volume(), 1.0, epsilon = 1e-12);

    let resolved = extract(&polygons, &unsealed());
    assert!(resolved.is_watertight());
}

#[test]
fn test_open_edges_of_single_triangle() {
    let mut mesh = Mesh::new();
    let a = mesh.add_vertex(DVec3::ZERO);
    let b = mesh.add_vertex(DVec3::X);
    let c = mesh.add_vertex(DVec3::Y);
    mesh.add_triangle(a, b, c);
    assert_eq!(mesh.open_edge_count(), 3);
}

/// Test a mirroring transform keeps the mesh outward-facing.
#[test]
fn test_mirror_transform() {
    let mut mesh = Mesh::from_solid(&cube(0.0, 1.0), &ExtractOptions::default());
    mesh.transform(&DMat4::from_scale(DVec3::new(-1.0, 1.0, 1.0)));
    assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-9);
    assert!(mesh.is_watertight());
    let bounds = mesh.bounding_box().unwrap();
    assert_relative_eq!(bounds.min.x, -1.0);
}

#[test]
fn test_solid_round_trip() {
    let mesh = Mesh::from_solid(&cube(0.0, 3.0), &ExtractOptions::default());
    let solid = mesh.to_solid();
    assert_eq!(solid.polygons().len(), 12);
    assert_relative_eq!(solid.volume(), 27.0, epsilon = 1e-9);
}

#[test]
fn test_merge_offsets_indices() {
    let mut a = Mesh::from_solid(&cube(0.0, 1.0), &ExtractOptions::default());
    let b = Mesh::from_solid(&cube(2.0, 3.0), &ExtractOptions::default());
    a.merge(&b);
    assert_eq!(a.vertex_count(), 16);
    assert!(a.is_watertight());
    assert_relative_eq!(a.volume(), 2.0, epsilon = 1e-9);
}

#[test]
fn test_aabb_overlap_and_contains() {
    let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
    let b = Aabb::new(DVec3::splat(1.5), DVec3::splat(2.0));
    assert!(!a.overlaps(&b, 0.1));
    assert!(a.overlaps(&b, 0.6));
    assert!(a.contains(&Aabb::new(DVec3::splat(0.2), DVec3::splat(0.8)), 0.0));
    assert_relative_eq!(a.center().x, 0.5);
}
