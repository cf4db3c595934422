//! Closed-form silhouette and stem taper functions.
//!
//! - [`shape_ratio`] scales child stem lengths along their parent so the
//!   crown follows one of eight canonical outlines.
//! - [`compute_radius`] gives the stem radius at a normalized position `z`
//!   for a given taper selector.

use std::f32::consts::PI;

/// Smallest radius any stem slice is allowed to have.
pub const MIN_RADIUS: f32 = 0.001;

/// Canonical crown silhouettes, indexed the same way as the `shape` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Conical,
    Spherical,
    Hemispherical,
    Cylindrical,
    TaperedCylindrical,
    Flame,
    InverseConical,
    TendFlame,
}

impl Shape {
    const ALL: [Shape; 8] = [
        Shape::Conical,
        Shape::Spherical,
        Shape::Hemispherical,
        Shape::Cylindrical,
        Shape::TaperedCylindrical,
        Shape::Flame,
        Shape::InverseConical,
        Shape::TendFlame,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Conical => "conical",
            Shape::Spherical => "spherical",
            Shape::Hemispherical => "hemispherical",
            Shape::Cylindrical => "cylindrical",
            Shape::TaperedCylindrical => "tapered cylindrical",
            Shape::Flame => "flame",
            Shape::InverseConical => "inverse conical",
            Shape::TendFlame => "tend flame",
        }
    }

    /// Relative length of a child stem for a normalized position `ratio`
    /// (1 at the first attachment point, 0 at the parent tip).
    pub fn ratio(self, ratio: f32) -> f32 {
        match self {
            Shape::Conical => 0.2 + 0.8 * ratio,
            Shape::Spherical => 0.2 + 0.8 * (PI * ratio).sin(),
            Shape::Hemispherical => 0.2 + 0.8 * (0.5 * PI * ratio).sin(),
            Shape::Cylindrical => 1.0,
            Shape::TaperedCylindrical => 0.5 + 0.5 * ratio,
            Shape::Flame => {
                if ratio <= 0.7 {
                    ratio / 0.7
                } else {
                    (1.0 - ratio) / 0.3
                }
            }
            Shape::InverseConical => 1.0 - 0.8 * ratio,
            Shape::TendFlame => {
                if ratio <= 0.7 {
                    0.5 + 0.5 * ratio / 0.7
                } else {
                    0.5 + 0.5 * (1.0 - ratio) / 0.3
                }
            }
        }
    }
}

impl TryFrom<u32> for Shape {
    type Error = u32;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Shape::ALL.get(id as usize).copied().ok_or(id)
    }
}

/// Silhouette lookup by numeric id. Ids outside `0..=7` give `0.0`.
pub fn shape_ratio(shape: u32, ratio: f32) -> f32 {
    Shape::try_from(shape).map_or(0.0, |s| s.ratio(ratio))
}

/// Radius of a stem of base `radius` and `length` at normalized position `z`.
///
/// - `taper < 1`: linear taper towards `radius * (1 - taper)` at the tip.
/// - `1 <= taper < 2`: linear taper whose tip is rounded off over the last
///   `taper_z` units, or over the whole stem if it is shorter than that.
/// - `2 <= taper <= 3`: constant radius with periodic bulges of period
///   `2 * radius`, their depth growing from 0 at `taper = 2` to 1 at `taper = 3`.
///
/// The result never drops below [`MIN_RADIUS`].
pub fn compute_radius(taper: f32, radius: f32, length: f32, z: f32) -> f32 {
    let unit_taper = if taper < 1.0 {
        taper
    } else if taper < 2.0 {
        2.0 - taper
    } else {
        0.0
    };
    let taper_z = radius * (1.0 - unit_taper * z);

    let r = if taper < 1.0 {
        taper_z
    } else if taper < 2.0 {
        let to_tip = (1.0 - z) * length;
        let cap = taper_z.min(length);
        if to_tip < cap {
            let d = cap - to_tip;
            (cap * cap - d * d).max(0.0).sqrt()
        } else {
            taper_z
        }
    } else {
        let period = 2.0 * taper_z;
        let along = z * length;
        let folded = if period > 0.0 {
            (along - period * (along / period).round()).abs()
        } else {
            0.0
        };
        let depth = (taper - 2.0).min(1.0);
        let bulge = (taper_z * taper_z - folded * folded).max(0.0).sqrt();
        (1.0 - depth) * taper_z + depth * bulge
    };

    r.max(MIN_RADIUS)
}
