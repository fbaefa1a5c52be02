//! Candidate site placements proposed and evolved by the optimizer.

use serde::{Deserialize, Serialize};

/// Per-criterion score components, each normalized to [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub sunlight: f64,
    pub terrain: f64,
    pub obstacles: f64,
    pub accessibility: f64,
    pub cost: f64,
}

impl ScoreBreakdown {
    /// All-zero breakdown, used for hard-excluded placements
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Half-open cell rectangle covered by a site, `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl CellRect {
    pub fn cell_count(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }

    /// Row-major cell indices of the rectangle within a grid of `grid_width`
    pub fn indices(&self, grid_width: usize) -> impl Iterator<Item = usize> + '_ {
        let (x0, x1) = (self.x0, self.x1);
        (self.y0..self.y1).flat_map(move |y| (x0..x1).map(move |x| y * grid_width + x))
    }
}

/// A rectangular placement proposal evaluated for solar-farm suitability
///
/// Created by the optimizer as a population member; the surviving top-N
/// instances are frozen and handed to the validator, which never mutates the
/// scoring fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSite {
    pub id: usize,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl CandidateSite {
    pub fn new(id: usize, center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            center_x,
            center_y,
            width,
            height,
            score: 0.0,
            breakdown: ScoreBreakdown::zero(),
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether the full extent lies inside a `grid_width x grid_height` grid
    pub fn fits_within(&self, grid_width: usize, grid_height: usize) -> bool {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        self.width > 0.0
            && self.height > 0.0
            && self.center_x - half_w >= 0.0
            && self.center_y - half_h >= 0.0
            && self.center_x + half_w <= grid_width as f64
            && self.center_y + half_h <= grid_height as f64
    }

    /// Cells covered by the site's extent, clipped to the grid
    ///
    /// A site always covers at least one cell; extents narrower than a cell
    /// degenerate to the cell under the center.
    pub fn cell_rect(&self, grid_width: usize, grid_height: usize) -> CellRect {
        let x0 = ((self.center_x - self.width / 2.0).floor().max(0.0)) as usize;
        let y0 = ((self.center_y - self.height / 2.0).floor().max(0.0)) as usize;
        let x1 = ((self.center_x + self.width / 2.0).ceil() as usize).min(grid_width);
        let y1 = ((self.center_y + self.height / 2.0).ceil() as usize).min(grid_height);

        let x0 = x0.min(grid_width.saturating_sub(1));
        let y0 = y0.min(grid_height.saturating_sub(1));
        CellRect {
            x0,
            y0,
            x1: x1.max(x0 + 1),
            y1: y1.max(y0 + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area() {
        let site = CandidateSite::new(0, 50.0, 50.0, 40.0, 25.0);
        assert_eq!(site.area(), 1000.0);
    }

    #[test]
    fn test_fits_within_bounds() {
        let site = CandidateSite::new(0, 50.0, 50.0, 40.0, 25.0);
        assert!(site.fits_within(100, 100));

        let edge = CandidateSite::new(1, 20.0, 50.0, 40.0, 25.0);
        assert!(edge.fits_within(100, 100));

        let outside = CandidateSite::new(2, 19.0, 50.0, 40.0, 25.0);
        assert!(!outside.fits_within(100, 100));
    }

    #[test]
    fn test_cell_rect_covers_extent() {
        let site = CandidateSite::new(0, 50.0, 50.0, 10.0, 4.0);
        let rect = site.cell_rect(100, 100);

        assert_eq!(rect, CellRect { x0: 45, y0: 48, x1: 55, y1: 52 });
        assert_eq!(rect.cell_count(), 40);
    }

    #[test]
    fn test_cell_rect_degenerate_extent() {
        let site = CandidateSite::new(0, 5.5, 5.5, 0.2, 0.2);
        let rect = site.cell_rect(10, 10);

        assert_eq!(rect.cell_count(), 1);
        assert_eq!(rect.indices(10).next(), Some(55));
    }

    #[test]
    fn test_cell_indices_row_major() {
        let rect = CellRect { x0: 1, y0: 2, x1: 3, y1: 4 };
        let indices: Vec<usize> = rect.indices(10).collect();
        assert_eq!(indices, vec![21, 22, 31, 32]);
    }
}
