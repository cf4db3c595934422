use glam::{Affine3A, Vec2, Vec3};

/// Drawing cursor at a point along a stem.
///
/// The local frame has the stem growing along +Y, bending about Z and
/// turning about its own axis (Y). All operations are applied in the local
/// frame and return a new pose; poses are copied into recursive calls rather
/// than shared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose(Affine3A);

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self(Affine3A::IDENTITY);

    /// Moves along the stem axis.
    #[inline]
    pub fn advanced(self, distance: f32) -> Self {
        Self(self.0 * Affine3A::from_translation(Vec3::new(0.0, distance, 0.0)))
    }

    /// Moves sideways, perpendicular to the stem axis.
    #[inline]
    pub fn shifted(self, distance: f32) -> Self {
        Self(self.0 * Affine3A::from_translation(Vec3::new(distance, 0.0, 0.0)))
    }

    /// Rotates about the bend axis (Z), in degrees.
    #[inline]
    pub fn bent(self, degrees: f32) -> Self {
        Self(self.0 * Affine3A::from_rotation_z(degrees.to_radians()))
    }

    /// Rotates about the stem axis (Y), in degrees.
    #[inline]
    pub fn turned(self, degrees: f32) -> Self {
        Self(self.0 * Affine3A::from_rotation_y(degrees.to_radians()))
    }

    /// Maps a point of the local XY plane to world space and drops depth.
    #[inline]
    pub fn project(&self, local: Vec2) -> Vec2 {
        self.0.transform_point3(local.extend(0.0)).truncate()
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.project(Vec2::ZERO)
    }
}

/// One trapezoidal stem slice in world space.
///
/// Corners run bottom-left, bottom-right, top-right, top-left in the local
/// frame of the slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub corners: [Vec2; 4],
    pub level: usize,
}

impl Quad {
    /// Builds the slice of the given `height` whose bottom edge is centered
    /// on `pose`.
    pub fn new(pose: &Pose, bottom_width: f32, top_width: f32, height: f32, level: usize) -> Self {
        let b = 0.5 * bottom_width;
        let t = 0.5 * top_width;
        Self {
            corners: [
                pose.project(Vec2::new(-b, 0.0)),
                pose.project(Vec2::new(b, 0.0)),
                pose.project(Vec2::new(t, height)),
                pose.project(Vec2::new(-t, height)),
            ],
            level,
        }
    }
}
