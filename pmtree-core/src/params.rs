//! The 19-field tree parameter record and its vector form.
//!
//! Field order of the exported vector is fixed:
//!
//! ```text
//!  0 shape    1 radius   2 baseSplits  3 splitAngle  4 taper
//!  5 base0    6 curve0   7 curveV0
//!  8 base1    9 curve1  10 curveV1    11 branches1  12 downAngle1  13 ratio1
//! 14 curve2  15 curveV2 16 branches2  17 downAngle2  18 ratio2
//! ```

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Length of the exported parameter vector.
pub const PARAM_COUNT: usize = 19;

/// Recursion depth: trunk, primary branches, secondary branches.
pub const LEVELS: usize = 2;

/// Probability that a random tree splits its trunk near the ground.
const BASE_SPLIT_PROBABILITY: f64 = 0.1;

const SHAPE: RangeInclusive<u32> = 0..=7;
const RADIUS: RangeInclusive<f32> = 0.01..=0.99;
const BASE_SPLITS: RangeInclusive<u32> = 0..=1;
const SPLIT_ANGLE: RangeInclusive<i32> = 0..=80;
const TAPER: RangeInclusive<f32> = 0.0..=3.0;
const BASE: RangeInclusive<f32> = 0.0..=0.8;
const CURVE_0: RangeInclusive<i32> = -80..=80;
const CURVE_V_0: RangeInclusive<i32> = 0..=100;
const CURVE: RangeInclusive<i32> = -110..=110;
const CURVE_V: RangeInclusive<i32> = 0..=140;
const BRANCHES: RangeInclusive<u32> = 5..=40;
const DOWN_ANGLE_1: RangeInclusive<i32> = 20..=70;
const DOWN_ANGLE_2: RangeInclusive<i32> = 10..=50;
const RATIO: RangeInclusive<f32> = 0.2..=0.7;

/// Per-level stem settings.
///
/// `branches`, `down_angle` and `ratio` describe how stems of *this* level
/// attach to their parent, so they are unused on the trunk. `base` describes
/// where children of this level's stems may start, so it is unused on the
/// deepest level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub base: f32,
    pub curve: i32,
    pub curve_v: i32,
    pub branches: u32,
    pub down_angle: i32,
    pub ratio: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeParameters {
    pub shape: u32,
    pub radius: f32,
    pub base_splits: u32,
    pub split_angle: i32,
    pub taper: f32,
    pub levels: [LevelParams; LEVELS + 1],
}

impl Default for TreeParameters {
    fn default() -> Self {
        Self {
            shape: 7,
            radius: 0.15,
            base_splits: 0,
            split_angle: 0,
            taper: 1.0,
            levels: [
                LevelParams {
                    base: 0.3,
                    curve: 0,
                    curve_v: 20,
                    branches: 0,
                    down_angle: 0,
                    ratio: 0.0,
                },
                LevelParams {
                    base: 0.2,
                    curve: 20,
                    curve_v: 4,
                    branches: 20,
                    down_angle: 60,
                    ratio: 0.5,
                },
                LevelParams {
                    base: 0.2,
                    curve: 10,
                    curve_v: 4,
                    branches: 20,
                    down_angle: 35,
                    ratio: 0.5,
                },
            ],
        }
    }
}

impl TreeParameters {
    /// Draws every exported field independently, in vector order.
    ///
    /// Fields outside the vector (`levels[0]` branch settings, `levels[2].base`)
    /// keep their default values.
    pub fn random(rng: &mut impl Rng) -> Self {
        let mut p = Self::default();

        p.shape = rng.random_range(SHAPE);
        p.radius = rng.random_range(RADIUS);
        p.base_splits = u32::from(rng.random_bool(BASE_SPLIT_PROBABILITY));
        p.split_angle = rng.random_range(SPLIT_ANGLE);
        p.taper = rng.random_range(TAPER);

        p.levels[0].base = rng.random_range(BASE);
        p.levels[0].curve = rng.random_range(CURVE_0);
        p.levels[0].curve_v = rng.random_range(CURVE_V_0);

        p.levels[1].base = rng.random_range(BASE);
        p.levels[1].curve = rng.random_range(CURVE);
        p.levels[1].curve_v = rng.random_range(CURVE_V);
        p.levels[1].branches = rng.random_range(BRANCHES);
        p.levels[1].down_angle = rng.random_range(DOWN_ANGLE_1);
        p.levels[1].ratio = rng.random_range(RATIO);

        p.levels[2].curve = rng.random_range(CURVE);
        p.levels[2].curve_v = rng.random_range(CURVE_V);
        p.levels[2].branches = rng.random_range(BRANCHES);
        p.levels[2].down_angle = rng.random_range(DOWN_ANGLE_2);
        p.levels[2].ratio = rng.random_range(RATIO);

        p
    }

    /// Exports the fixed-order parameter vector.
    pub fn to_vector(&self) -> [f32; PARAM_COUNT] {
        let [l0, l1, l2] = &self.levels;
        [
            self.shape as f32,
            self.radius,
            self.base_splits as f32,
            self.split_angle as f32,
            self.taper,
            l0.base,
            l0.curve as f32,
            l0.curve_v as f32,
            l1.base,
            l1.curve as f32,
            l1.curve_v as f32,
            l1.branches as f32,
            l1.down_angle as f32,
            l1.ratio,
            l2.curve as f32,
            l2.curve_v as f32,
            l2.branches as f32,
            l2.down_angle as f32,
            l2.ratio,
        ]
    }

    /// Assigns a fixed-order parameter vector, then clamps every field into
    /// its valid range. Integer fields are rounded first.
    ///
    /// Nothing is assigned if `values` does not hold exactly
    /// [`PARAM_COUNT`] entries.
    pub fn assign(&mut self, values: &[f32]) -> Result<(), ParamError> {
        let v: &[f32; PARAM_COUNT] = values.try_into().map_err(|_| ParamError::WrongLength {
            expected: PARAM_COUNT,
            actual: values.len(),
        })?;

        self.shape = clamp_u32(v[0], SHAPE);
        self.radius = clamp_f32(v[1], RADIUS);
        self.base_splits = clamp_u32(v[2], BASE_SPLITS);
        self.split_angle = clamp_i32(v[3], SPLIT_ANGLE);
        self.taper = clamp_f32(v[4], TAPER);

        let l0 = &mut self.levels[0];
        l0.base = clamp_f32(v[5], BASE);
        l0.curve = clamp_i32(v[6], CURVE_0);
        l0.curve_v = clamp_i32(v[7], CURVE_V_0);

        let l1 = &mut self.levels[1];
        l1.base = clamp_f32(v[8], BASE);
        l1.curve = clamp_i32(v[9], CURVE);
        l1.curve_v = clamp_i32(v[10], CURVE_V);
        l1.branches = clamp_u32(v[11], BRANCHES);
        l1.down_angle = clamp_i32(v[12], DOWN_ANGLE_1);
        l1.ratio = clamp_f32(v[13], RATIO);

        let l2 = &mut self.levels[2];
        l2.curve = clamp_i32(v[14], CURVE);
        l2.curve_v = clamp_i32(v[15], CURVE_V);
        l2.branches = clamp_u32(v[16], BRANCHES);
        l2.down_angle = clamp_i32(v[17], DOWN_ANGLE_2);
        l2.ratio = clamp_f32(v[18], RATIO);

        Ok(())
    }

    /// Builds a parameter set from a fixed-order vector, see [`Self::assign`].
    pub fn from_vector(values: &[f32]) -> Result<Self, ParamError> {
        let mut p = Self::default();
        p.assign(values)?;
        Ok(p)
    }

    /// Checks every exported field against the range [`Self::assign`]
    /// clamps it to. Non-finite values fail.
    ///
    /// Sets produced by [`Self::random`] or [`Self::assign`] always pass;
    /// this guards sets assembled field by field, such as parameter files.
    /// The range check also bounds the child count per stem, which the
    /// generator relies on.
    pub fn validate(&self) -> Result<(), ParamError> {
        let fields = FIELD_NAMES.into_iter().zip(self.to_vector());
        for ((field, value), range) in fields.zip(field_ranges()) {
            if !range.contains(&value) {
                return Err(ParamError::OutOfRange {
                    field,
                    value,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(())
    }
}

/// Names of the exported vector fields, in vector order.
const FIELD_NAMES: [&str; PARAM_COUNT] = [
    "shape",
    "radius",
    "baseSplits",
    "splitAngle",
    "taper",
    "base0",
    "curve0",
    "curveV0",
    "base1",
    "curve1",
    "curveV1",
    "branches1",
    "downAngle1",
    "ratio1",
    "curve2",
    "curveV2",
    "branches2",
    "downAngle2",
    "ratio2",
];

/// Import ranges of the exported vector fields, in vector order.
fn field_ranges() -> [RangeInclusive<f32>; PARAM_COUNT] {
    [
        widen(SHAPE),
        RADIUS,
        widen(BASE_SPLITS),
        widen(SPLIT_ANGLE),
        TAPER,
        BASE,
        widen(CURVE_0),
        widen(CURVE_V_0),
        BASE,
        widen(CURVE),
        widen(CURVE_V),
        widen(BRANCHES),
        widen(DOWN_ANGLE_1),
        RATIO,
        widen(CURVE),
        widen(CURVE_V),
        widen(BRANCHES),
        widen(DOWN_ANGLE_2),
        RATIO,
    ]
}

fn widen<T: Copy>(range: RangeInclusive<T>) -> RangeInclusive<f32>
where
    f64: From<T>,
{
    f64::from(*range.start()) as f32..=f64::from(*range.end()) as f32
}

fn clamp_f32(v: f32, range: RangeInclusive<f32>) -> f32 {
    if v.is_nan() {
        return *range.start();
    }
    v.clamp(*range.start(), *range.end())
}

fn clamp_i32(v: f32, range: RangeInclusive<i32>) -> i32 {
    let v = clamp_f32(v.round(), widen(range));
    v as i32
}

fn clamp_u32(v: f32, range: RangeInclusive<u32>) -> u32 {
    let v = clamp_f32(v.round(), widen(range));
    v as u32
}
