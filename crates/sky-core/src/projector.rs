//! Celestial-sphere to screen projection.
//!
//! A point at (ra, dec) becomes a unit vector, the frame is rotated so the
//! view center sits on +X (by -ra about Z, then by -dec about Y), and the
//! result is projected stereographically from the antipode (-X) onto the
//! tangent plane at +X. Screen offset is `(proj_y, -proj_z) * scale` so north
//! stays up.
//!
//! The GPU star shader carries a line-for-line copy of this math; both must
//! change together.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Default rotated-X threshold at or below which a point is behind the horizon.
pub const DEFAULT_HORIZON_EPSILON: f32 = 1.0e-3;

/// Default width (in rotated-X units) of the smooth horizon fade for large objects.
pub const DEFAULT_FADE_WINDOW: f32 = 0.35;

/// Where the telescope is pointing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewOrientation {
    /// Right ascension of the view center, radians.
    pub ra: f32,
    /// Declination of the view center, radians.
    pub dec: f32,
}

impl ViewOrientation {
    pub fn new(ra: f32, dec: f32) -> Self {
        Self { ra, dec }
    }

    /// Unit vector of the view center.
    pub fn direction(&self) -> Vec3 {
        celestial_to_unit(self.ra, self.dec)
    }

    /// Great-circle angle between two view centers, radians.
    pub fn angle_to(&self, other: &ViewOrientation) -> f32 {
        // atan2 keeps precision for the sub-degree steps the background cache sums.
        let a = self.direction();
        let b = other.direction();
        a.cross(b).length().atan2(a.dot(b))
    }
}

/// Result of the hard-cutoff projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Offset from the viewport center in pixels.
    pub offset: Vec2,
    /// False when the point lies at or behind the horizon.
    pub visible: bool,
    /// Rotated principal-axis component; the cosine of the angular separation
    /// from the view center.
    pub depth: f32,
}

/// Result of the smooth-fade projection used for large-area objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadedProjection {
    pub offset: Vec2,
    /// Opacity multiplier in `[0, 1]`.
    pub fade: f32,
    pub depth: f32,
    /// Local stereographic magnification relative to the view center (1 at center).
    pub magnification: f32,
}

/// Unit vector for a point at (ra, dec).
#[inline]
pub fn celestial_to_unit(ra: f32, dec: f32) -> Vec3 {
    let (sin_ra, cos_ra) = ra.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();
    Vec3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Rotate a unit vector so the view center lands on +X.
#[inline]
pub fn rotate_to_view(v: Vec3, view: &ViewOrientation) -> Vec3 {
    // About Z by -ra.
    let (sin_ra, cos_ra) = view.ra.sin_cos();
    let x1 = v.x * cos_ra + v.y * sin_ra;
    let y1 = -v.x * sin_ra + v.y * cos_ra;
    // About Y by -dec.
    let (sin_dec, cos_dec) = view.dec.sin_cos();
    let x2 = x1 * cos_dec + v.z * sin_dec;
    let z2 = -x1 * sin_dec + v.z * cos_dec;
    Vec3::new(x2, y1, z2)
}

/// Stereographic projection of a view-rotated vector, in sphere units.
#[inline]
fn stereographic(p: Vec3) -> Vec2 {
    let denom = 1.0 + p.x;
    Vec2::new(2.0 * p.y / denom, 2.0 * p.z / denom)
}

/// Project (ra, dec) with a hard horizon cutoff.
pub fn project(ra: f32, dec: f32, view: &ViewOrientation, scale: f32, epsilon: f32) -> Projection {
    let p = rotate_to_view(celestial_to_unit(ra, dec), view);
    if p.x <= epsilon {
        return Projection {
            offset: Vec2::ZERO,
            visible: false,
            depth: p.x,
        };
    }
    let s = stereographic(p);
    Projection {
        offset: Vec2::new(s.x, -s.y) * scale,
        visible: true,
        depth: p.x,
    }
}

/// Opacity multiplier for a rotated principal-axis component `depth`.
///
/// Exactly 0 at or below `cutoff`, exactly 1 at or above `cutoff + window`,
/// smoothstep in between. Non-decreasing in `depth`, hence non-increasing in
/// angular separation.
pub fn horizon_fade(depth: f32, cutoff: f32, window: f32) -> f32 {
    if depth <= cutoff {
        return 0.0;
    }
    if window <= 0.0 {
        return 1.0;
    }
    let t = ((depth - cutoff) / window).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Project (ra, dec) with a smooth horizon fade instead of a hard cutoff.
///
/// Large gradients would otherwise pop in or out over a single frame.
pub fn project_faded(
    ra: f32,
    dec: f32,
    view: &ViewOrientation,
    scale: f32,
    cutoff: f32,
    window: f32,
) -> FadedProjection {
    let p = rotate_to_view(celestial_to_unit(ra, dec), view);
    let fade = horizon_fade(p.x, cutoff, window);
    if fade <= 0.0 {
        return FadedProjection {
            offset: Vec2::ZERO,
            fade: 0.0,
            depth: p.x,
            magnification: 0.0,
        };
    }
    let s = stereographic(p);
    FadedProjection {
        offset: Vec2::new(s.x, -s.y) * scale,
        fade,
        depth: p.x,
        magnification: 2.0 / (1.0 + p.x),
    }
}
