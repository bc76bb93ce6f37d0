//! # STL Export
//!
//! Writes a [`Mesh`] as binary STL (the persisted artifact) or ASCII STL
//! (for inspection). Coordinates are narrowed to `f32` here and nowhere
//! else.
//!
//! ## Binary layout
//!
//! | Offset | Size | Content |
//! |--------|------|---------|
//! | 0 | 80 | header |
//! | 80 | 4 | triangle count, `u32` LE |
//! | 84 | 50 × n | normal, three vertices (12 × `f32` LE), `u16` attribute = 0 |

use crate::mesh::Mesh;
use glam::{DVec3, Vec3};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Size of the binary header.
pub const STL_HEADER_LEN: usize = 80;

/// Size of one binary triangle record.
pub const STL_TRIANGLE_LEN: usize = 50;

const HEADER_TEXT: &[u8] = b"tactile-mesh binary STL";

/// Unit facet normal, `+Z` for degenerate triangles.
pub fn facet_normal([a, b, c]: [DVec3; 3]) -> Vec3 {
    let n = (b - a).cross(c - a).as_vec3();
    let length = n.length();
    if length > 0.0 && length.is_finite() {
        n / length
    } else {
        Vec3::Z
    }
}

/// Writes binary STL to `writer`.
///
/// # Errors
///
/// Returns the writer's I/O error, or [`io::ErrorKind::InvalidInput`] when
/// the mesh has more triangles than the format can count.
pub fn write_binary_stl<W: Write>(mesh: &Mesh, mut writer: W) -> io::Result<()> {
    let count = u32::try_from(mesh.triangle_count()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many triangles for STL")
    })?;
    let mut header = [0u8; STL_HEADER_LEN];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;

    let mut record = [0u8; STL_TRIANGLE_LEN];
    for triangle in mesh.triangle_positions() {
        let normal = facet_normal(triangle);
        let values = [normal, triangle[0].as_vec3(), triangle[1].as_vec3(), triangle[2].as_vec3()];
        for (i, value) in values.iter().flat_map(|v| v.to_array()).enumerate() {
            record[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
        }
        // attribute byte count stays zero
        writer.write_all(&record)?;
    }
    writer.flush()
}

/// Encodes a mesh as binary STL.
///
/// ```rust
/// use tactile_mesh::export::to_binary_stl;
/// use tactile_mesh::mesh::Mesh;
///
/// assert_eq!(to_binary_stl(&Mesh::new()).unwrap().len(), 84);
/// ```
///
/// # Errors
///
/// Fails only for meshes with more than `u32::MAX` triangles.
pub fn to_binary_stl(mesh: &Mesh) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(STL_HEADER_LEN + 4 + mesh.triangle_count() * STL_TRIANGLE_LEN);
    write_binary_stl(mesh, &mut out)?;
    Ok(out)
}

/// Encodes a mesh as ASCII STL with the given solid name.
pub fn to_ascii_stl(mesh: &Mesh, name: &str) -> String {
    let mut out = String::with_capacity(64 + mesh.triangle_count() * 256);
    let _ = writeln!(out, "solid {name}");
    for triangle in mesh.triangle_positions() {
        let n = facet_normal(triangle);
        let _ = writeln!(out, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z);
        out.push_str("    outer loop\n");
        for v in triangle.iter().map(|v| v.as_vec3()) {
            let _ = writeln!(out, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z);
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {name}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ExtractOptions;
    use crate::primitives::cuboid;

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn cube_mesh() -> Mesh {
        let solid = cuboid(DVec3::ZERO, DVec3::ONE).unwrap();
        Mesh::from_solid(&solid, &ExtractOptions::default())
    }

    #[test]
    fn test_empty_mesh_is_84_bytes() {
        let bytes = to_binary_stl(&Mesh::new()).unwrap();
        assert_eq!(bytes.len(), 84);
        assert_eq!(&bytes[80..84], &[0, 0, 0, 0]);
        assert!(bytes.starts_with(HEADER_TEXT));
    }

    #[test]
    fn test_cube_layout() {
        let mesh = cube_mesh();
        let bytes = to_binary_stl(&mesh).unwrap();
        assert_eq!(bytes.len(), 84 + 12 * 50);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 12);

        for (i, triangle) in mesh.triangle_positions().enumerate() {
            let base = 84 + i * 50;
            let normal = Vec3::new(
                read_f32(&bytes, base),
                read_f32(&bytes, base + 4),
                read_f32(&bytes, base + 8),
            );
            assert!((normal.length() - 1.0).abs() < 1e-6);
            assert_eq!(normal, facet_normal(triangle));
            assert_eq!(read_f32(&bytes, base + 12), triangle[0].x as f32);
            assert_eq!(&bytes[base + 48..base + 50], &[0, 0]);
        }
    }

    /// Test outward normals on a closed cube.
    #[test]
    fn test_normals_point_outward() {
        let mesh = cube_mesh();
        let center = DVec3::splat(0.5);
        for triangle in mesh.triangle_positions() {
            let centroid = (triangle[0] + triangle[1] + triangle[2]) / 3.0;
            let outward = (centroid - center).as_vec3();
            assert!(facet_normal(triangle).dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_degenerate_normal_defaults_to_z() {
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(facet_normal([p, p, p]), Vec3::Z);
        assert_eq!(facet_normal([DVec3::ZERO, DVec3::X, DVec3::X * 2.0]), Vec3::Z);
    }

    #[test]
    fn test_ascii_export() {
        let text = to_ascii_stl(&cube_mesh(), "cube");
        assert!(text.starts_with("solid cube\n"));
        assert!(text.trim_end().ends_with("endsolid cube"));
        assert_eq!(text.matches("facet normal").count(), 12);
        assert_eq!(text.matches("vertex").count(), 36);
    }

    #[test]
    fn test_writer_errors_propagate() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = write_binary_stl(&cube_mesh(), Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
