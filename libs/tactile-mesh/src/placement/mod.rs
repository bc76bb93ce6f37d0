//! # Placement and Orientation
//!
//! Maps a feature's logical position to a rigid transform from the
//! primitive frame (surface at `z = 0`, `+z` outward, `+x` forward, `+y`
//! axial) into the construction frame of the base solid.
//!
//! ## Frames
//!
//! - **Export frame**: right-handed, `+Z` up. Flat plates are built in it
//!   directly, so the construction frame and the export frame coincide.
//! - **Cylinder construction frame**: the cylinder axis is `+Y`, centred on
//!   the origin. [`up_axis_correction`] (`+90°` about `X`, `(x, y, z) ↦
//!   (x, −z, y)`) turns it into the export frame as the last pipeline step.
//!
//! θ is measured in the export frame: counter-clockwise from `+X` seen from
//! `+Z`. A surface point at θ in export coordinates is
//! `(R cos θ, R sin θ, y)`.
//!
//! ## Derived corrections
//!
//! Pulling that point back through the up-axis correction gives
//! `(R cos θ, y, −R sin θ) = (R cos θ', y, R sin θ')` with `θ' = −θ`. The
//! correction reverses the handedness of angles about the axis, so the
//! construction frame uses the negated angle.
//!
//! The forward tangent (direction of increasing θ) is
//! `(−sin θ, cos θ, 0)` in export coordinates, which pulls back to
//! `(sin θ', 0, −cos θ')`: the direction of *decreasing* θ'. A marker built
//! along increasing θ' would therefore face backwards, which is why a
//! mirror flag looked inverted when the two frames were mixed. Here the
//! local `+x` axis is defined as the pulled-back forward tangent, so the
//! `mirrored` flag keeps its plain meaning on both base shapes.
//!
//! The local frame `(t, Y, r)` is right-handed: `t × Y = r`.

use glam::{DMat4, DVec3, DVec4};

/// Where a feature sits on the base surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Site {
    /// Point on a flat plate's top face.
    Flat {
        /// Surface point (export coordinates).
        origin: DVec3,
    },
    /// Point on a cylindrical surface.
    Cylinder {
        /// Surface radius.
        radius: f64,
        /// Angle in radians, export frame.
        theta: f64,
        /// Axial height from the cylinder's mid-plane.
        y: f64,
    },
}

impl Site {
    /// Outward unit normal at the site, construction frame.
    pub fn normal(&self) -> DVec3 {
        match *self {
            Site::Flat { .. } => DVec3::Z,
            Site::Cylinder { theta, .. } => {
                let t = -theta;
                DVec3::new(t.cos(), 0.0, t.sin())
            }
        }
    }

    /// Forward tangent (direction of increasing θ), construction frame.
    pub fn forward(&self) -> DVec3 {
        match *self {
            Site::Flat { .. } => DVec3::X,
            Site::Cylinder { theta, .. } => {
                let t = -theta;
                DVec3::new(t.sin(), 0.0, -t.cos())
            }
        }
    }

    /// Axial direction, construction frame.
    pub fn axial(&self) -> DVec3 {
        DVec3::Y
    }

    /// Surface point, construction frame.
    pub fn surface_point(&self) -> DVec3 {
        match *self {
            Site::Flat { origin } => origin,
            Site::Cylinder { radius, y, .. } => self.normal() * radius + DVec3::Y * y,
        }
    }

    /// Rigid transform from the primitive frame to the construction frame.
    pub fn frame(&self) -> DMat4 {
        match *self {
            Site::Flat { origin } => DMat4::from_translation(origin),
            Site::Cylinder { .. } => DMat4::from_cols(
                self.forward().extend(0.0),
                self.axial().extend(0.0),
                self.normal().extend(0.0),
                self.surface_point().extend(1.0),
            ),
        }
    }

    /// Translation placing a rotationally symmetric primitive `outward`
    /// units along the normal from the surface point. No rotation.
    pub fn translation(&self, outward: f64) -> DMat4 {
        DMat4::from_translation(self.surface_point() + self.normal() * outward)
    }

    /// How far below the local `z = 0` plane a protrusion of footprint
    /// radius `half_width` must start so that it meets the surface
    /// everywhere, plus the coplanar `offset`.
    pub fn embed_depth(&self, half_width: f64, offset: f64) -> f64 {
        match *self {
            Site::Flat { .. } => offset,
            Site::Cylinder { radius, .. } => sagitta(radius, half_width) + offset,
        }
    }
}

/// Height of the circular arc of `radius` over a chord of half-length
/// `half_chord`. Chords wider than the circle saturate at `radius`.
///
/// ```rust
/// use tactile_mesh::placement::sagitta;
/// assert_eq!(sagitta(5.0, 0.0), 0.0);
/// assert_eq!(sagitta(5.0, 5.0), 5.0);
/// assert!((sagitta(5.0, 3.0) - 1.0).abs() < 1e-12);
/// ```
pub fn sagitta(radius: f64, half_chord: f64) -> f64 {
    let h = half_chord.abs().min(radius);
    radius - (radius * radius - h * h).sqrt()
}

/// Rotation of `+90°` about `X`: maps the cylinder's `+Y` axis to export
/// `+Z`. Exact, without trigonometric round-off.
pub fn up_axis_correction() -> DMat4 {
    DMat4::from_cols(
        DVec4::new(1.0, 0.0, 0.0, 0.0),
        DVec4::new(0.0, 0.0, 1.0, 0.0),
        DVec4::new(0.0, -1.0, 0.0, 0.0),
        DVec4::W,
    )
}

/// Inverse of [`up_axis_correction`]: takes shapes built along export `+Z`
/// into the cylinder construction frame.
pub fn construction_from_export() -> DMat4 {
    DMat4::from_cols(
        DVec4::new(1.0, 0.0, 0.0, 0.0),
        DVec4::new(0.0, 0.0, -1.0, 0.0),
        DVec4::new(0.0, 1.0, 0.0, 0.0),
        DVec4::W,
    )
}

/// Half turn about local `z`: the point reflection used for mirrored
/// markers. Exact.
pub fn half_turn() -> DMat4 {
    DMat4::from_scale(DVec3::new(-1.0, -1.0, 1.0))
}

/// Reflection through the local `z = 0` plane. Turns a protrusion into the
/// matching recess.
pub fn mirror_depth() -> DMat4 {
    DMat4::from_scale(DVec3::new(1.0, 1.0, -1.0))
}
