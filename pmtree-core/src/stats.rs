//! Shape-descriptor statistics gathered while a tree is generated.
//!
//! [`StatsAccumulator`] is filled during the stem recursion; [`StatsAccumulator::finalize`]
//! turns it into an immutable [`TreeStatistics`] with histograms and the
//! exported feature vectors.

use glam::Vec2;

use crate::params::LEVELS;

/// Cells per grid side.
pub const GRID_SIZE: usize = 20;
/// Total number of grid cells.
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;
/// World-space edge length of one cell.
pub const CELL_SIZE: f32 = 0.5;
/// World-space position of the lower-left grid corner.
pub const GRID_ORIGIN: Vec2 = Vec2::new(-5.0, 0.0);

pub const DENSITY_BINS: usize = 8;
/// Density counts per histogram bucket (bucket 0 holds empty cells only).
pub const DENSITY_BIN_WIDTH: u32 = 4;
pub const CURVATURE_BINS: usize = 5;
pub const CURVATURE_BIN_WIDTH: f32 = 10.0;

/// Cell index for a world position, or `None` outside the grid window.
#[inline]
pub fn cell_index(p: Vec2) -> Option<usize> {
    let c = ((p - GRID_ORIGIN) / CELL_SIZE).floor();
    let in_range = |v: f32| v >= 0.0 && v < GRID_SIZE as f32;
    if in_range(c.x) && in_range(c.y) {
        Some(c.y as usize * GRID_SIZE + c.x as usize)
    } else {
        None
    }
}

/// Running totals for one `generate()` pass.
///
/// All fields are plain sums or extrema, so two accumulators covering
/// disjoint parts of a tree can be combined with [`StatsAccumulator::merge_from`].
#[derive(Clone, Debug, PartialEq)]
pub struct StatsAccumulator {
    pub total_length: [f32; LEVELS + 1],
    pub total_volume: [f32; LEVELS + 1],
    pub min_x: f32,
    pub max_x: f32,
    pub max_y: f32,
    /// Sample hits per cell, row-major with `y` as the row.
    pub density: Vec<u32>,
    /// Summed `|curvature|` of the samples in each cell.
    pub curvature: Vec<f32>,
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self {
            total_length: [0.0; LEVELS + 1],
            total_volume: [0.0; LEVELS + 1],
            min_x: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            density: vec![0; GRID_CELLS],
            curvature: vec![0.0; GRID_CELLS],
        }
    }
}

impl StatsAccumulator {
    /// Resets every total, extent and cell.
    ///
    /// Extents restart at the origin, where every tree is rooted.
    pub fn clear(&mut self) {
        self.total_length = [0.0; LEVELS + 1];
        self.total_volume = [0.0; LEVELS + 1];
        self.min_x = 0.0;
        self.max_x = 0.0;
        self.max_y = 0.0;
        self.density.fill(0);
        self.curvature.fill(0.0);
    }

    #[inline]
    pub fn add_extent(&mut self, p: Vec2) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Records one grid sample. Samples outside the window are dropped.
    #[inline]
    pub fn add_sample(&mut self, p: Vec2, curvature: f32) {
        if let Some(i) = cell_index(p) {
            self.density[i] += 1;
            self.curvature[i] += curvature.abs();
        }
    }

    #[inline]
    pub fn add_slice(&mut self, level: usize, height: f32, mean_radius: f32) {
        self.total_length[level] += height;
        self.total_volume[level] += height * mean_radius * mean_radius;
    }

    pub fn merge_from(&mut self, other: &StatsAccumulator) {
        for level in 0..=LEVELS {
            self.total_length[level] += other.total_length[level];
            self.total_volume[level] += other.total_volume[level];
        }
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        for (a, b) in self.density.iter_mut().zip(&other.density) {
            *a += b;
        }
        for (a, b) in self.curvature.iter_mut().zip(&other.curvature) {
            *a += b;
        }
    }

    /// Whether the deepest level carries at least twice the material of
    /// the trunk and primary branches combined.
    pub fn is_plausible(&self) -> bool {
        2.0 * (self.total_length[0] + self.total_length[1]) <= self.total_length[2]
    }

    /// Derives histograms and averages from the accumulated grids.
    pub fn finalize(&self) -> TreeStatistics {
        let mut density_counts = [0u32; DENSITY_BINS];
        let mut curvature_counts = [0u32; CURVATURE_BINS];
        let mut occupied = 0u32;
        let mut total_density = 0u64;
        let mut total_curvature = 0.0f64;

        for (&d, &c) in self.density.iter().zip(&self.curvature) {
            density_counts[density_bin(d)] += 1;
            if d == 0 {
                continue;
            }
            occupied += 1;
            total_density += u64::from(d);
            total_curvature += f64::from(c);
            curvature_counts[curvature_bin(c / d as f32)] += 1;
        }

        let avg_curvature = if total_density > 0 {
            (total_curvature / total_density as f64) as f32
        } else {
            0.0
        };
        let density_hist = density_counts.map(|n| n as f32 / GRID_CELLS as f32);
        let curvature_hist = if occupied > 0 {
            curvature_counts.map(|n| n as f32 / occupied as f32)
        } else {
            [0.0; CURVATURE_BINS]
        };

        TreeStatistics {
            total_length: self.total_length,
            total_volume: self.total_volume,
            min_x: self.min_x,
            max_x: self.max_x,
            max_y: self.max_y,
            occupied_cells: occupied,
            avg_curvature,
            density_counts,
            curvature_counts,
            density_hist,
            curvature_hist,
        }
    }
}

fn density_bin(d: u32) -> usize {
    (d.div_ceil(DENSITY_BIN_WIDTH) as usize).min(DENSITY_BINS - 1)
}

fn curvature_bin(mean: f32) -> usize {
    ((mean / CURVATURE_BIN_WIDTH) as usize).min(CURVATURE_BINS - 1)
}

/// Selects one of the exported statistics vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatisticsKind {
    /// height, width, occupied fraction, average curvature
    Summary,
    /// height, width, 8 density bins, average curvature
    DensityHistogram,
    /// height, width, 8 density bins, 5 curvature bins
    Histograms,
    /// height only
    Height,
}

impl StatisticsKind {
    pub fn len(self) -> usize {
        match self {
            StatisticsKind::Summary => 4,
            StatisticsKind::DensityHistogram => 3 + DENSITY_BINS,
            StatisticsKind::Histograms => 2 + DENSITY_BINS + CURVATURE_BINS,
            StatisticsKind::Height => 1,
        }
    }
}

impl TryFrom<u32> for StatisticsKind {
    type Error = u32;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(StatisticsKind::Summary),
            1 => Ok(StatisticsKind::DensityHistogram),
            2 => Ok(StatisticsKind::Histograms),
            3 => Ok(StatisticsKind::Height),
            other => Err(other),
        }
    }
}

/// Finalized statistics of one generated tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeStatistics {
    pub total_length: [f32; LEVELS + 1],
    pub total_volume: [f32; LEVELS + 1],
    pub min_x: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub occupied_cells: u32,
    pub avg_curvature: f32,
    /// Raw cell counts per density bucket; always sums to [`GRID_CELLS`].
    pub density_counts: [u32; DENSITY_BINS],
    /// Raw cell counts per curvature bucket; sums to `occupied_cells`.
    pub curvature_counts: [u32; CURVATURE_BINS],
    pub density_hist: [f32; DENSITY_BINS],
    pub curvature_hist: [f32; CURVATURE_BINS],
}

impl Default for TreeStatistics {
    fn default() -> Self {
        StatsAccumulator::default().finalize()
    }
}

impl TreeStatistics {
    pub fn height(&self) -> f32 {
        self.max_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Exports one of the fixed-length feature vectors.
    pub fn vector(&self, kind: StatisticsKind) -> Vec<f32> {
        let mut out = Vec::with_capacity(kind.len());
        out.push(self.height());
        match kind {
            StatisticsKind::Summary => {
                out.push(self.width());
                out.push(1.0 - self.density_hist[0]);
                out.push(self.avg_curvature);
            }
            StatisticsKind::DensityHistogram => {
                out.push(self.width());
                out.extend_from_slice(&self.density_hist);
                out.push(self.avg_curvature);
            }
            StatisticsKind::Histograms => {
                out.push(self.width());
                out.extend_from_slice(&self.density_hist);
                out.extend_from_slice(&self.curvature_hist);
            }
            StatisticsKind::Height => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_index_covers_the_window_and_drops_the_rest() {
        assert_eq!(cell_index(Vec2::new(-5.0, 0.0)), Some(0));
        assert_eq!(cell_index(Vec2::new(-4.6, 0.1)), Some(0));
        assert_eq!(cell_index(Vec2::new(0.1, 0.1)), Some(10));
        assert_eq!(cell_index(Vec2::new(0.1, 0.6)), Some(GRID_SIZE + 10));
        assert_eq!(cell_index(Vec2::new(4.99, 9.99)), Some(GRID_CELLS - 1));

        assert_eq!(cell_index(Vec2::new(5.0, 1.0)), None);
        assert_eq!(cell_index(Vec2::new(-5.01, 1.0)), None);
        assert_eq!(cell_index(Vec2::new(0.0, -0.01)), None);
        assert_eq!(cell_index(Vec2::new(0.0, 10.0)), None);
    }

    #[test]
    fn samples_outside_window_are_ignored() {
        let mut acc = StatsAccumulator::default();
        acc.add_sample(Vec2::new(20.0, 3.0), 5.0);
        assert_eq!(acc, StatsAccumulator::default());
    }

    #[test]
    fn density_buckets_group_by_four() {
        assert_eq!(density_bin(0), 0);
        assert_eq!(density_bin(1), 1);
        assert_eq!(density_bin(4), 1);
        assert_eq!(density_bin(5), 2);
        assert_eq!(density_bin(28), 7);
        assert_eq!(density_bin(1000), 7);
    }

    #[test]
    fn finalize_builds_histograms_from_cells() {
        let mut acc = StatsAccumulator::default();
        // Two hits with curvature 3 and 5 in one cell (mean 4).
        acc.add_sample(Vec2::new(0.1, 0.1), 3.0);
        acc.add_sample(Vec2::new(0.2, 0.2), -5.0);
        // Five hits with curvature 30 in another (mean 30).
        for _ in 0..5 {
            acc.add_sample(Vec2::new(1.1, 2.1), 30.0);
        }

        let stats = acc.finalize();

        assert_eq!(stats.occupied_cells, 2);
        assert_eq!(stats.density_counts[0], GRID_CELLS as u32 - 2);
        assert_eq!(stats.density_counts[1], 1);
        assert_eq!(stats.density_counts[2], 1);
        assert_eq!(stats.curvature_counts, [1, 0, 0, 1, 0]);
        assert_eq!(stats.curvature_hist, [0.5, 0.0, 0.0, 0.5, 0.0]);
        // (3 + 5 + 5 * 30) / 7
        assert!((stats.avg_curvature - 158.0 / 7.0).abs() < 1e-4);
        assert!((stats.density_hist.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_grid_has_zero_curvature_statistics() {
        let stats = TreeStatistics::default();

        assert_eq!(stats.avg_curvature, 0.0);
        assert_eq!(stats.curvature_hist, [0.0; CURVATURE_BINS]);
        assert_eq!(stats.density_counts[0], GRID_CELLS as u32);
    }

    #[test]
    fn merge_matches_single_accumulator() {
        let mut whole = StatsAccumulator::default();
        let mut left = StatsAccumulator::default();
        let mut right = StatsAccumulator::default();

        for (acc, x) in [(&mut left, -1.2), (&mut right, 2.3)] {
            acc.add_extent(Vec2::new(x, 4.0));
            acc.add_sample(Vec2::new(x, 4.0), 2.0);
            acc.add_slice(1, 0.5, 0.1);
        }
        for x in [-1.2, 2.3] {
            whole.add_extent(Vec2::new(x, 4.0));
            whole.add_sample(Vec2::new(x, 4.0), 2.0);
            whole.add_slice(1, 0.5, 0.1);
        }

        left.merge_from(&right);
        assert_eq!(left, whole);
    }

    #[test]
    fn plausibility_needs_twice_the_upper_material() {
        let mut acc = StatsAccumulator::default();
        acc.total_length = [10.0, 20.0, 59.0];
        assert!(!acc.is_plausible());
        acc.total_length[2] = 60.0;
        assert!(acc.is_plausible());
    }

    #[test]
    fn vector_lengths_follow_kind() {
        let stats = TreeStatistics::default();
        for id in 0..4 {
            let kind = StatisticsKind::try_from(id).unwrap();
            assert_eq!(stats.vector(kind).len(), kind.len());
        }
        assert_eq!(StatisticsKind::try_from(4), Err(4));
    }
}
