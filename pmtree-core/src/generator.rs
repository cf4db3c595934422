//! Stem recursion and segment emission.
//!
//! [`generate_stem`](StemBuilder::generate_stem) and
//! [`generate_segment`](StemBuilder::generate_segment) call each other once per
//! level, so the recursion depth is bounded by [`LEVELS`]. Every quad goes to
//! the quad list and into the statistics accumulator as it is emitted.

use glam::Vec2;
use rand::Rng;

use crate::{
    config::Config,
    params::{LEVELS, TreeParameters},
    pose::{Pose, Quad},
    shape::{compute_radius, shape_ratio},
    stats::StatsAccumulator,
};

/// One stem about to be emitted.
#[derive(Clone, Copy, Debug)]
struct Stem {
    level: usize,
    radius: f32,
    length: f32,
}

/// Borrowed state threaded through one `generate()` pass.
pub struct StemBuilder<'a, R: Rng> {
    params: &'a TreeParameters,
    cfg: &'a Config,
    rng: &'a mut R,
    acc: &'a mut StatsAccumulator,
    quads: &'a mut Vec<Quad>,
}

impl<'a, R: Rng> StemBuilder<'a, R> {
    pub fn new(
        params: &'a TreeParameters,
        cfg: &'a Config,
        rng: &'a mut R,
        acc: &'a mut StatsAccumulator,
        quads: &'a mut Vec<Quad>,
    ) -> Self {
        Self {
            params,
            cfg,
            rng,
            acc,
            quads,
        }
    }

    /// Emits the trunk and everything attached to it.
    pub fn generate_tree(&mut self) {
        let trunk = Stem {
            level: 0,
            radius: self.params.radius,
            length: self.cfg.base_length,
        };
        self.generate_stem(trunk, Pose::IDENTITY);
    }

    fn generate_stem(&mut self, stem: Stem, mut pose: Pose) {
        if stem.length <= 0.0 {
            return;
        }

        let curve_res = self.cfg.curve_res.max(1) as usize;
        let segment_length = stem.length / curve_res as f32;
        // Attachment side of the next child, 0 or 180 degrees.
        let mut phase = 0.0;

        let split = stem.level == 0
            && self.params.base_splits > 0
            && self.params.split_angle != 0;
        let unsplit = if split {
            ((self.params.levels[0].base * curve_res as f32) as usize).min(curve_res)
        } else {
            curve_res
        };

        for index in 0..unsplit {
            let bend = self.draw_bend(stem.level);
            self.generate_segment(stem, index, pose, segment_length, bend, &mut phase);
            pose = pose.advanced(segment_length).bent(bend);
        }

        if unsplit == curve_res {
            return;
        }

        let siblings = self.params.base_splits + 1;
        let split_angle = self.params.split_angle as f32;
        let relax = split_angle / (curve_res - unsplit) as f32;
        for sibling in 0..siblings {
            let turn = sibling as f32 * 360.0 / siblings as f32;
            let sibling_pose = pose.turned(turn).bent(split_angle);

            // Each sibling subtree is accumulated on its own, then merged.
            let mut local = StatsAccumulator::default();
            StemBuilder::new(
                self.params,
                self.cfg,
                &mut *self.rng,
                &mut local,
                &mut *self.quads,
            )
            .generate_sibling(stem, sibling_pose, phase, unsplit, relax);
            self.acc.merge_from(&local);
        }
    }

    /// Emits the segments of one base-split sibling from `first` to the tip,
    /// unbending by `relax` degrees after each one.
    fn generate_sibling(
        &mut self,
        stem: Stem,
        mut pose: Pose,
        mut phase: f32,
        first: usize,
        relax: f32,
    ) {
        let curve_res = self.cfg.curve_res.max(1) as usize;
        let segment_length = stem.length / curve_res as f32;

        for index in first..curve_res {
            let bend = self.draw_bend(stem.level);
            self.generate_segment(stem, index, pose, segment_length, bend, &mut phase);
            pose = pose.advanced(segment_length).bent(bend - relax);
        }
    }

    /// Per-segment bend angle around `curve / curve_res`, spread by `curve_v / curve_res`.
    fn draw_bend(&mut self, level: usize) -> f32 {
        let lp = &self.params.levels[level];
        let curve_res = self.cfg.curve_res.max(1) as f32;
        let mean = lp.curve as f32 / curve_res;
        let spread = lp.curve_v.max(0) as f32 / curve_res;
        if spread > 0.0 {
            self.rng.random_range(mean - spread..=mean + spread)
        } else {
            mean
        }
    }

    /// Emits one segment of `stem` and spawns the children attached to it.
    ///
    /// Children start past `base * length` and are spaced
    /// `length * (1 - base) / (branches - 1)` apart along the stem, so a
    /// segment holds `floor((segment_length - stem_start) / interval) + 1` of
    /// them, where `stem_start` is how far into this segment the base ends.
    /// Consecutive children sit on opposite sides of the stem.
    ///
    /// ### Parameters
    /// - `stem` - The stem this segment belongs to.
    /// - `index` - Position of the segment along the stem, `0..curve_res`.
    /// - `pose` - Transform at the bottom of the segment.
    /// - `segment_length` - Length of one segment.
    /// - `bend` - Bend angle of this segment in degrees, used for its curvature.
    /// - `phase` - Attachment side of the next child, 0 or 180 degrees.
    ///   Carried over from segment to segment.
    fn generate_segment(
        &mut self,
        stem: Stem,
        index: usize,
        pose: Pose,
        segment_length: f32,
        bend: f32,
        phase: &mut f32,
    ) {
        let curve_res = self.cfg.curve_res.max(1) as f32;
        let z1 = index as f32 / curve_res;
        let z2 = (index + 1) as f32 / curve_res;
        self.emit_slices(stem, pose, segment_length, z1, z2, bend / segment_length);

        if stem.level >= LEVELS {
            return;
        }

        let base = self.params.levels[stem.level].base;
        let child = self.params.levels[stem.level + 1];

        let segment_start = segment_length * index as f32;
        let base_length = stem.length * base;
        let stem_start = if segment_start >= base_length {
            0.0
        } else if segment_start + segment_length <= base_length {
            return;
        } else {
            base_length - segment_start
        };

        if child.branches < 2 {
            return;
        }
        let interval = stem.length * (1.0 - base) / (child.branches - 1) as f32;
        if interval <= 0.0 {
            return;
        }
        let count = ((segment_length - stem_start) / interval) as usize + 1;
        let span = stem.length * (1.0 - base);

        let mut cursor = pose.advanced(stem_start).turned(*phase);
        for i in 0..count {
            let offset = segment_start + stem_start + i as f32 * interval;
            let local_radius =
                compute_radius(self.params.taper, stem.radius, stem.length, offset / stem.length);

            let fraction = ((stem.length - offset) / span).clamp(0.0, 1.0);
            let length = child.ratio * shape_ratio(self.params.shape, fraction) * stem.length;
            let sub = Stem {
                level: stem.level + 1,
                radius: local_radius * length / stem.length,
                length,
            };
            let child_pose = cursor
                .shifted(-local_radius)
                .bent(child.down_angle as f32);
            self.generate_stem(sub, child_pose);

            cursor = cursor.turned(180.0);
            *phase = (*phase + 180.0) % 360.0;
            cursor = cursor.advanced(interval);
        }
    }

    /// Cuts one segment into stacks no taller than `slice_height` and emits them.
    fn emit_slices(
        &mut self,
        stem: Stem,
        pose: Pose,
        segment_length: f32,
        z1: f32,
        z2: f32,
        curvature: f32,
    ) {
        let slice_height = self.cfg.slice_height;
        if segment_length <= 0.0 || slice_height <= 0.0 {
            return;
        }

        let slices = (segment_length / slice_height).ceil().max(1.0) as usize;
        let height = segment_length / slices as f32;
        let taper = self.params.taper;

        for j in 0..slices {
            let za = z1 + (z2 - z1) * j as f32 / slices as f32;
            let zb = z1 + (z2 - z1) * (j + 1) as f32 / slices as f32;
            let r_bottom = compute_radius(taper, stem.radius, stem.length, za);
            let r_top = compute_radius(taper, stem.radius, stem.length, zb);

            let slice_pose = pose.advanced(height * j as f32);
            self.acc
                .add_slice(stem.level, height, 0.5 * (r_bottom + r_top));
            self.emit_quad(
                Quad::new(&slice_pose, 2.0 * r_bottom, 2.0 * r_top, height, stem.level),
                &slice_pose,
                height,
                curvature,
            );
        }
    }

    fn emit_quad(&mut self, quad: Quad, pose: &Pose, height: f32, curvature: f32) {
        for corner in quad.corners {
            self.acc.add_extent(corner);
        }

        let step = self.cfg.sample_step;
        if step > 0.0 {
            let samples = (height / step).ceil() as usize;
            for k in 0..samples {
                let p = pose.project(Vec2::new(0.0, k as f32 * step));
                self.acc.add_sample(p, curvature);
            }
        }

        self.quads.push(quad);
    }
}
